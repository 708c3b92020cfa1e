use anyhow::{Result, anyhow};
use clap::Args;
use jobdeck::{
    Dashboard, DashboardConfig, HttpJobRepository, JobFilter, JobStatus, PageSize,
    RefreshScheduler,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::utils::display::render_view;

#[derive(Args)]
pub struct WatchArgs {
    #[arg(short, long, help = "Refresh interval in seconds")]
    pub interval: Option<u64>,
    #[arg(short = 't', long, help = "Job status to filter by")]
    pub status: Option<String>,
    #[arg(short, long, help = "Case-insensitive name search")]
    pub search: Option<String>,
    #[arg(long, help = "Rows per page (5, 10, 20 or 50)")]
    pub page_size: Option<u32>,
}

impl WatchArgs {
    pub async fn execute(&self, config: &DashboardConfig) -> Result<()> {
        let mut config = config.clone();
        if let Some(secs) = self.interval {
            config = config.with_refresh_interval(Duration::from_secs(secs));
        }
        if let Some(size) = self.page_size {
            config = config.with_page_size(PageSize::try_from(size).map_err(|e| anyhow!(e))?);
        }

        let mut filter = JobFilter::new();
        if let Some(status) = &self.status {
            filter = filter.with_status(status.parse::<JobStatus>()?);
        }
        if let Some(search) = &self.search {
            filter = filter.with_search(search.clone());
        }

        let repository = Arc::new(HttpJobRepository::new(&config)?);
        // read-only: nothing destructive is dispatched from here
        let dashboard = Dashboard::new(repository, Arc::new(|_: &str| false), &config);
        dashboard.change_filter(filter).await;

        let mut revisions = dashboard.subscribe();
        let scheduler = RefreshScheduler::from_config(dashboard.clone(), &config)?.spawn();
        info!(
            "Watching {} every {:?}, press Ctrl-C to stop",
            config.api_base_url, config.refresh_interval
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Stopping watch");
                    break;
                }
                changed = revisions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = dashboard.view().await;
                    // clear the screen and home the cursor before each frame
                    print!("\x1B[2J\x1B[1;1H");
                    println!("🛰️  {} | every {:?}", config.api_base_url, config.refresh_interval);
                    print!("{}", render_view(&view));
                }
            }
        }

        scheduler.shutdown().await?;
        Ok(())
    }
}
