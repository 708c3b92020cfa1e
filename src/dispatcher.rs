//! Lifecycle commands against the job repository.
//!
//! The dispatcher turns one user intent into at most one repository call.
//! Everything that can be decided locally (action availability, destructive
//! confirmation, form validation) is decided before the call is made.

use crate::{
    Result,
    error::DashboardError,
    form::JobForm,
    job::{Job, JobAction, JobId},
    repository::JobRepository,
    store::CommandKind,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Asks the user to confirm a destructive action.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// A lifecycle command. Job commands carry the snapshot the user acted on.
#[derive(Debug, Clone)]
pub enum Command {
    Save(JobForm),
    Delete(Job),
    Cancel(Job),
    Retry(Job),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Save(form) if form.is_editing() => CommandKind::Update,
            Command::Save(_) => CommandKind::Create,
            Command::Delete(_) => CommandKind::Delete,
            Command::Cancel(_) => CommandKind::Cancel,
            Command::Retry(_) => CommandKind::Retry,
        }
    }

    /// The job the command targets, if it already exists.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Command::Save(form) => form.editing_target(),
            Command::Delete(job) | Command::Cancel(job) | Command::Retry(job) => Some(&job.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The repository accepted the command.
    Completed {
        command: CommandKind,
        job_id: Option<JobId>,
    },
    /// The user declined the confirmation; nothing was sent.
    Declined,
}

pub struct CommandDispatcher {
    repository: Arc<dyn JobRepository>,
    confirmation: Arc<dyn Confirmation>,
}

impl CommandDispatcher {
    pub fn new(repository: Arc<dyn JobRepository>, confirmation: Arc<dyn Confirmation>) -> Self {
        Self {
            repository,
            confirmation,
        }
    }

    pub async fn dispatch(&self, command: Command) -> Result<CommandOutcome> {
        let kind = command.kind();
        debug!("Dispatching {} command for {:?}", kind, command.job_id());

        let job_id = match command {
            Command::Save(form) => {
                let payload = form.validate()?;
                match form.editing_target() {
                    Some(id) => {
                        self.repository.update_job(id, &payload).await?;
                        id.to_string()
                    }
                    None => self.repository.create_job(&payload).await?.id,
                }
            }
            Command::Delete(job) => {
                if !self.confirmed(JobAction::Delete, &job) {
                    return Ok(CommandOutcome::Declined);
                }
                self.repository.delete_job(&job.id).await?;
                job.id
            }
            Command::Cancel(job) => {
                ensure_available(JobAction::Cancel, &job)?;
                if !self.confirmed(JobAction::Cancel, &job) {
                    return Ok(CommandOutcome::Declined);
                }
                self.repository.cancel_job(&job.id).await?;
                job.id
            }
            Command::Retry(job) => {
                ensure_available(JobAction::Retry, &job)?;
                self.repository.retry_job(&job.id).await?;
                job.id
            }
        };

        info!("Job {} {}", job_id, kind);
        Ok(CommandOutcome::Completed {
            command: kind,
            job_id: Some(job_id),
        })
    }

    fn confirmed(&self, action: JobAction, job: &Job) -> bool {
        let prompt = format!("Are you sure you want to {} job {} ({})?", action, job.name, job.id);
        let confirmed = self.confirmation.confirm(&prompt);
        if !confirmed {
            info!("{} of job {} declined", action, job.id);
        }
        confirmed
    }
}

fn ensure_available(action: JobAction, job: &Job) -> Result<()> {
    if action.is_available_for(job.status) {
        return Ok(());
    }
    warn!("Refusing to {} job {} in status {}", action, job.id, job.status);
    Err(DashboardError::ActionUnavailable {
        action,
        status: job.status,
    })
}
