//! Periodic background refresh of a [`Dashboard`].

use crate::{Result, config::DashboardConfig, dashboard::Dashboard, error::DashboardError};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

/// Fires a full list refresh once at start and then every `interval`.
///
/// Each tick spawns its own refresh. A slow refresh is never cancelled and a
/// new tick never waits for it, so refreshes may overlap; the dashboard's
/// [`RefreshPolicy`](crate::store::RefreshPolicy) decides which completion
/// the view keeps.
pub struct RefreshScheduler {
    dashboard: Dashboard,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(dashboard: Dashboard, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(DashboardError::Config(
                "Refresh interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dashboard,
            interval,
        })
    }

    pub fn from_config(dashboard: Dashboard, config: &DashboardConfig) -> Result<Self> {
        Self::new(dashboard, config.refresh_interval)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn spawn(self) -> RefreshHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(self.run(shutdown_rx));
        RefreshHandle { shutdown_tx, task }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!("Refresh scheduler started, every {:?}", self.interval);

        let mut ticks = interval(self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Refresh scheduler shutting down");
                    break;
                }
                _ = ticks.tick() => {
                    let dashboard = self.dashboard.clone();
                    tokio::spawn(async move {
                        if let Err(e) = dashboard.refresh().await {
                            debug!("Scheduled refresh failed: {}", e);
                        }
                    });
                }
            }
        }
    }
}

/// Stops a running [`RefreshScheduler`]. Refreshes already in flight still complete.
pub struct RefreshHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub async fn shutdown(self) -> Result<()> {
        if self.shutdown_tx.send(()).await.is_err() {
            warn!("Refresh scheduler already stopped");
        }
        self.task.await.map_err(|e| {
            DashboardError::Config(format!("Refresh scheduler task failed: {}", e))
        })
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{Job, JobStatus};
    use crate::repository::{InMemoryJobRepository, RepositoryCall};
    use std::sync::Arc;
    use tokio::time::sleep;

    const PERIOD: Duration = Duration::from_secs(30);

    fn setup() -> (Arc<InMemoryJobRepository>, Dashboard) {
        let repository = Arc::new(InMemoryJobRepository::with_jobs(vec![
            Job::new("1", "send-email"),
            Job::new("2", "cleanup").with_status(JobStatus::Failed),
        ]));
        let dashboard = Dashboard::new(
            repository.clone(),
            Arc::new(|_: &str| true),
            &DashboardConfig::default(),
        );
        (repository, dashboard)
    }

    async fn list_calls(repository: &InMemoryJobRepository) -> usize {
        repository
            .calls()
            .await
            .iter()
            .filter(|call| matches!(call, RepositoryCall::List(_)))
            .count()
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let (_, dashboard) = setup();
        assert!(RefreshScheduler::new(dashboard, Duration::ZERO).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_immediately_then_periodically() {
        let (repository, dashboard) = setup();
        let handle = RefreshScheduler::new(dashboard.clone(), PERIOD)
            .unwrap()
            .spawn();

        sleep(Duration::from_millis(10)).await;
        assert_eq!(list_calls(&repository).await, 1);
        assert_eq!(dashboard.view().await.total_count, 2);

        sleep(PERIOD * 2).await;
        assert_eq!(list_calls(&repository).await, 3);

        handle.shutdown().await.unwrap();
        sleep(PERIOD * 3).await;
        assert_eq!(list_calls(&repository).await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_refreshes_overlap() {
        let (repository, dashboard) = setup();
        repository.push_list_latency(PERIOD + PERIOD / 2).await;

        let handle = RefreshScheduler::new(dashboard.clone(), PERIOD)
            .unwrap()
            .spawn();

        sleep(PERIOD + Duration::from_secs(1)).await;
        // the second tick fired while the first refresh was still in flight
        assert_eq!(list_calls(&repository).await, 2);
        assert!(dashboard.view().await.loading);

        sleep(PERIOD / 2).await;
        assert!(!dashboard.view().await.loading);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_running() {
        let (repository, dashboard) = setup();
        repository.fail_next(1);

        let handle = RefreshScheduler::new(dashboard.clone(), PERIOD)
            .unwrap()
            .spawn();

        sleep(Duration::from_millis(10)).await;
        let view = dashboard.view().await;
        assert_eq!(view.total_count, 0);
        assert_eq!(view.notifications.len(), 1);

        sleep(PERIOD).await;
        assert_eq!(dashboard.view().await.total_count, 2);
        assert!(!handle.is_finished());

        handle.shutdown().await.unwrap();
    }
}
