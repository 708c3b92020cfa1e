//! A dashboard session: repository, view state and command dispatch.
//!
//! [`Dashboard`] is cheap to clone and safe to share between a render loop,
//! the [`RefreshScheduler`](crate::refresh::RefreshScheduler) and input
//! handlers. Every state change goes through [`ViewState::apply`] under one
//! write guard, after which the revision published by [`Dashboard::subscribe`]
//! is bumped.
//!
//! Repository failures are recorded as notifications and also returned to the
//! caller. Validation failures are only returned; they belong next to the
//! input that caused them.
//!
//! # Examples
//!
//! ```rust
//! use jobdeck::repository::InMemoryJobRepository;
//! use jobdeck::{Dashboard, DashboardConfig, Job, JobStatus};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> jobdeck::Result<()> {
//! let repository = Arc::new(InMemoryJobRepository::with_jobs(vec![
//!     Job::new("1", "send-email").with_status(JobStatus::Failed),
//! ]));
//! let dashboard = Dashboard::new(repository, Arc::new(|_: &str| true), &DashboardConfig::default());
//!
//! dashboard.refresh().await?;
//! dashboard.retry("1").await?;
//!
//! let view = dashboard.view().await;
//! assert_eq!(view.rows[0].job.status, JobStatus::Pending);
//! # Ok(())
//! # }
//! ```

use crate::{
    Result,
    config::DashboardConfig,
    dispatcher::{Command, CommandDispatcher, CommandOutcome, Confirmation},
    error::DashboardError,
    filter::JobFilter,
    form::JobForm,
    job::{Job, JobId, JobQuery},
    pagination::PageSize,
    repository::JobRepository,
    store::{CommandKind, DashboardView, RefreshSeq, ViewEvent, ViewState},
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::{RwLock, watch};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

struct Inner {
    repository: Arc<dyn JobRepository>,
    dispatcher: CommandDispatcher,
    state: RwLock<ViewState>,
    next_seq: AtomicU64,
    revision: watch::Sender<u64>,
}

impl Dashboard {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        confirmation: Arc<dyn Confirmation>,
        config: &DashboardConfig,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                dispatcher: CommandDispatcher::new(repository.clone(), confirmation),
                repository,
                state: RwLock::new(ViewState::new(config.refresh_policy, config.page_size)),
                next_seq: AtomicU64::new(0),
                revision,
            }),
        }
    }

    /// Read-only snapshot of what should be rendered now.
    pub async fn view(&self) -> DashboardView {
        self.inner.state.read().await.view()
    }

    /// Copy of the full view state.
    pub async fn state(&self) -> ViewState {
        self.inner.state.read().await.clone()
    }

    /// Revision counter, bumped after every applied event.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    async fn emit(&self, event: ViewEvent) {
        self.inner.state.write().await.apply(event);
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    fn next_seq(&self) -> RefreshSeq {
        self.inner.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reload the whole collection, then stats if any job came back.
    pub async fn refresh(&self) -> Result<()> {
        let seq = self.next_seq();
        debug!("Starting job refresh #{}", seq);
        self.emit(ViewEvent::RefreshStarted { seq }).await;

        match self.inner.repository.list_jobs(&JobQuery::new()).await {
            Ok(jobs) => {
                let has_jobs = !jobs.is_empty();
                self.emit(ViewEvent::JobsRefreshed { seq, jobs }).await;
                if has_jobs {
                    // stats failures are already surfaced as a notification
                    let _ = self.refresh_stats().await;
                }
                Ok(())
            }
            Err(err) => {
                warn!("Job refresh #{} failed: {}", seq, err);
                self.emit(ViewEvent::RefreshFailed {
                    seq,
                    message: err.to_string(),
                })
                .await;
                Err(err)
            }
        }
    }

    pub async fn refresh_stats(&self) -> Result<()> {
        match self.inner.repository.get_stats().await {
            Ok(stats) => {
                self.emit(ViewEvent::StatsRefreshed(stats)).await;
                Ok(())
            }
            Err(err) => {
                warn!("Stats refresh failed: {}", err);
                self.emit(ViewEvent::StatsFailed(err.to_string())).await;
                Err(err)
            }
        }
    }

    /// Create or update, depending on whether the form has an editing target.
    pub async fn save(&self, form: JobForm) -> Result<CommandOutcome> {
        self.run(Command::Save(form)).await
    }

    /// An edit form seeded from the current snapshot of `id`.
    pub async fn edit_form(&self, id: &str) -> Result<JobForm> {
        let job = self.resolve(id).await?;
        Ok(JobForm::from_job(&job))
    }

    pub async fn delete(&self, id: &str) -> Result<CommandOutcome> {
        self.run_for(id, CommandKind::Delete, Command::Delete).await
    }

    pub async fn retry(&self, id: &str) -> Result<CommandOutcome> {
        self.run_for(id, CommandKind::Retry, Command::Retry).await
    }

    pub async fn cancel(&self, id: &str) -> Result<CommandOutcome> {
        self.run_for(id, CommandKind::Cancel, Command::Cancel).await
    }

    pub async fn change_filter(&self, filter: JobFilter) {
        self.emit(ViewEvent::FilterChanged(filter)).await;
    }

    pub async fn change_page(&self, page: u32) {
        self.emit(ViewEvent::PageChanged(page)).await;
    }

    pub async fn change_page_size(&self, page_size: PageSize) {
        self.emit(ViewEvent::PageSizeChanged(page_size)).await;
    }

    /// Open (or with `None`, close) the detail view of a job.
    pub async fn select_job(&self, id: Option<JobId>) {
        self.emit(ViewEvent::JobSelected(id)).await;
    }

    pub async fn dismiss_notification(&self, index: usize) {
        self.emit(ViewEvent::NotificationDismissed(index)).await;
    }

    pub async fn clear_notifications(&self) {
        self.emit(ViewEvent::NotificationsCleared).await;
    }

    /// The loaded snapshot of `id`, or a fresh fetch when it is not loaded.
    async fn resolve(&self, id: &str) -> Result<Job> {
        let loaded = self.inner.state.read().await.find_job(id).cloned();
        match loaded {
            Some(job) => Ok(job),
            None => self.inner.repository.get_job(id).await,
        }
    }

    async fn run_for(
        &self,
        id: &str,
        kind: CommandKind,
        command: fn(Job) -> Command,
    ) -> Result<CommandOutcome> {
        match self.resolve(id).await {
            Ok(job) => self.run(command(job)).await,
            Err(err) => {
                self.report(kind, Some(id.to_string()), &err).await;
                Err(err)
            }
        }
    }

    async fn run(&self, command: Command) -> Result<CommandOutcome> {
        let kind = command.kind();
        let job_id = command.job_id().map(str::to_string);

        match self.inner.dispatcher.dispatch(command).await {
            Ok(CommandOutcome::Completed { command, job_id }) => {
                self.emit(ViewEvent::CommandCompleted {
                    command,
                    job_id: job_id.clone(),
                    error: None,
                })
                .await;
                if let Err(err) = self.refresh().await {
                    debug!("Refresh after {} failed: {}", command, err);
                }
                Ok(CommandOutcome::Completed { command, job_id })
            }
            Ok(CommandOutcome::Declined) => Ok(CommandOutcome::Declined),
            Err(err) => {
                self.report(kind, job_id, &err).await;
                Err(err)
            }
        }
    }

    async fn report(&self, kind: CommandKind, job_id: Option<JobId>, err: &DashboardError) {
        if err.is_validation() {
            debug!("{} rejected locally: {}", kind, err);
            return;
        }
        warn!("{} command failed: {}", kind, err);
        self.emit(ViewEvent::CommandCompleted {
            command: kind,
            job_id,
            error: Some(err.to_string()),
        })
        .await;
    }
}
