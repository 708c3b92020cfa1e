use anyhow::{Result, anyhow};
use chrono::Utc;
use clap::{Args, Subcommand};
use jobdeck::{
    CommandOutcome, Dashboard, DashboardConfig, HttpJobRepository, JobFilter, JobForm,
    JobRepository, JobStatus, PageSize, RepeatKind, RepeatSchedule,
};
use std::sync::Arc;
use tracing::info;

use crate::utils::display::{StatsTable, render_job_details, render_view};

const UPCOMING_RUNS: usize = 5;

#[derive(Subcommand)]
pub enum JobCommand {
    #[command(about = "List jobs, filtered and paginated")]
    List {
        #[arg(short = 't', long, help = "Job status to filter by")]
        status: Option<String>,
        #[arg(short, long, help = "Case-insensitive name search")]
        search: Option<String>,
        #[arg(short, long, default_value_t = 1, help = "Page to show")]
        page: u32,
        #[arg(long, help = "Rows per page (5, 10, 20 or 50)")]
        page_size: Option<u32>,
    },
    #[command(about = "Show details of a specific job")]
    Show {
        #[arg(help = "Job ID")]
        job_id: String,
    },
    #[command(about = "Show job counts by status")]
    Stats,
    #[command(about = "Create a new job")]
    Create {
        #[arg(short, long, help = "Job name")]
        name: String,
        #[command(flatten)]
        fields: JobFields,
    },
    #[command(about = "Edit an existing job")]
    Edit {
        #[arg(help = "Job ID")]
        job_id: String,
        #[command(flatten)]
        fields: JobFields,
    },
    #[command(about = "Cancel a pending or running job")]
    Cancel {
        #[arg(help = "Job ID")]
        job_id: String,
        #[arg(long, help = "Confirm the cancel operation")]
        confirm: bool,
    },
    #[command(about = "Retry a failed job")]
    Retry {
        #[arg(help = "Job ID")]
        job_id: String,
    },
    #[command(about = "Delete a job")]
    Delete {
        #[arg(help = "Job ID")]
        job_id: String,
        #[arg(long, help = "Confirm the delete operation")]
        confirm: bool,
    },
}

/// Form fields shared by `create` and `edit`. Unset flags keep the form's value.
#[derive(Args, Debug, Default, Clone)]
pub struct JobFields {
    #[arg(short = 'j', long, help = "Job data as JSON")]
    pub data: Option<String>,
    #[arg(long, help = "First run time (RFC 3339 or YYYY-MM-DDTHH:MM, UTC)")]
    pub run_at: Option<String>,
    #[arg(long, conflicts_with = "every", help = "Repeat on a cron expression")]
    pub cron: Option<String>,
    #[arg(long, requires = "cron", help = "IANA timezone for the cron expression")]
    pub timezone: Option<String>,
    #[arg(long, help = "Repeat every N milliseconds")]
    pub every: Option<String>,
    #[arg(long, conflicts_with_all = ["cron", "every"], help = "Remove the repeat schedule")]
    pub no_repeat: bool,
    #[arg(long, help = "Maximum retry attempts")]
    pub max_retries: Option<String>,
    #[arg(long, help = "Retry delay in milliseconds (empty for the scheduler default)")]
    pub retry_delay: Option<String>,
}

impl JobFields {
    pub fn apply(&self, form: &mut JobForm) {
        if let Some(data) = &self.data {
            form.data_json = data.clone();
        }
        if let Some(run_at) = &self.run_at {
            form.run_at = run_at.clone();
        }
        if let Some(cron) = &self.cron {
            form.select_repeat(RepeatKind::Cron);
            form.cron_expression = cron.clone();
            form.timezone = self.timezone.clone().unwrap_or_default();
        }
        if let Some(every) = &self.every {
            form.select_repeat(RepeatKind::Every);
            form.every_interval = every.clone();
        }
        if self.no_repeat {
            form.select_repeat(RepeatKind::None);
        }
        if let Some(max_retries) = &self.max_retries {
            form.max_retries = max_retries.clone();
        }
        if let Some(retry_delay) = &self.retry_delay {
            form.retry_delay = retry_delay.clone();
        }
    }
}

impl JobCommand {
    pub async fn execute(&self, config: &DashboardConfig) -> Result<()> {
        let repository = Arc::new(HttpJobRepository::new(config)?);
        let confirmed = match self {
            JobCommand::Cancel { confirm, .. } | JobCommand::Delete { confirm, .. } => *confirm,
            _ => false,
        };
        let dashboard = Dashboard::new(
            repository.clone(),
            Arc::new(move |prompt: &str| {
                info!("{}", prompt);
                confirmed
            }),
            config,
        );

        match self {
            JobCommand::List {
                status,
                search,
                page,
                page_size,
            } => {
                list_jobs(
                    &dashboard,
                    status.as_deref(),
                    search.clone(),
                    *page,
                    page_size.unwrap_or(config.page_size.get()),
                )
                .await?;
            }
            JobCommand::Show { job_id } => {
                show_job(repository.as_ref(), job_id).await?;
            }
            JobCommand::Stats => {
                dashboard.refresh_stats().await?;
                if let Some(stats) = dashboard.view().await.stats {
                    println!("📊 Job Statistics");
                    println!("{}", StatsTable::new(&stats));
                }
            }
            JobCommand::Create { name, fields } => {
                let mut form = JobForm::blank();
                form.name = name.clone();
                fields.apply(&mut form);
                report(dashboard.save(form).await?, "create");
            }
            JobCommand::Edit { job_id, fields } => {
                let mut form = dashboard.edit_form(job_id).await?;
                fields.apply(&mut form);
                report(dashboard.save(form).await?, "edit");
            }
            JobCommand::Cancel { job_id, .. } => {
                report(dashboard.cancel(job_id).await?, "cancel");
            }
            JobCommand::Retry { job_id } => {
                report(dashboard.retry(job_id).await?, "retry");
            }
            JobCommand::Delete { job_id, .. } => {
                report(dashboard.delete(job_id).await?, "delete");
            }
        }
        Ok(())
    }
}

async fn list_jobs(
    dashboard: &Dashboard,
    status: Option<&str>,
    search: Option<String>,
    page: u32,
    page_size: u32,
) -> Result<()> {
    let page_size = PageSize::try_from(page_size).map_err(|e| anyhow!(e))?;
    let mut filter = JobFilter::new();
    if let Some(status) = status {
        filter = filter.with_status(status.parse::<JobStatus>()?);
    }
    if let Some(search) = search {
        filter = filter.with_search(search);
    }

    dashboard.refresh().await?;
    dashboard.change_filter(filter).await;
    dashboard.change_page_size(page_size).await;
    dashboard.change_page(page).await;

    let view = dashboard.view().await;
    if view.page != page {
        println!("⚠️  Page {} is out of range, showing page {}", page, view.page);
    }
    print!("{}", render_view(&view));
    Ok(())
}

async fn show_job(repository: &dyn JobRepository, job_id: &str) -> Result<()> {
    let job = repository.get_job(job_id).await?;
    println!("{}", render_job_details(&job));

    if let Some(schedule @ RepeatSchedule::Cron { .. }) = &job.repeat {
        let upcoming = schedule.upcoming(Utc::now(), UPCOMING_RUNS);
        if !upcoming.is_empty() {
            println!("⏰ Upcoming runs:");
            for at in upcoming {
                println!("   {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
    }
    Ok(())
}

fn report(outcome: CommandOutcome, action: &str) {
    match outcome {
        CommandOutcome::Completed { command, job_id } => {
            println!(
                "✅ Job {} {}",
                job_id.unwrap_or_default(),
                command.past_tense()
            );
        }
        CommandOutcome::Declined => {
            println!("⚠️  This will {} the job. Use --confirm to proceed.", action);
        }
    }
}
