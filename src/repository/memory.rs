//! In-memory implementation of [`JobRepository`] for offline use and testing.
//!
//! The repository applies the scheduler's lifecycle rules itself, so commands
//! behave as they would against a live service. It also records every call
//! and can inject failures and list latency, which makes refresh ordering and
//! error-recovery behavior reproducible.
//!
//! # Examples
//!
//! ```rust
//! use jobdeck::repository::{InMemoryJobRepository, JobRepository};
//! use jobdeck::{Job, JobQuery, JobStatus};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = InMemoryJobRepository::with_jobs(vec![
//!     Job::new("1", "send-email").with_status(JobStatus::Failed),
//! ]);
//!
//! repository.retry_job("1").await?;
//! let job = repository.get_job("1").await?;
//! assert_eq!(job.status, JobStatus::Pending);
//! assert_eq!(repository.call_count().await, 2);
//! # Ok(())
//! # }
//! ```

use super::JobRepository;
use crate::{
    Result,
    error::DashboardError,
    form::JobPayload,
    job::{Job, JobQuery, JobStats, JobStatus, SortField, SortOrder},
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

/// A call received by [`InMemoryJobRepository`].
#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryCall {
    List(JobQuery),
    Get(String),
    Stats,
    Create(JobPayload),
    Update(String, JobPayload),
    Cancel(String),
    Retry(String),
    Delete(String),
}

#[derive(Debug, Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<Vec<Job>>,
    calls: Mutex<Vec<RepositoryCall>>,
    pending_failures: AtomicU32,
    list_latencies: Mutex<VecDeque<Duration>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        Self {
            jobs: RwLock::new(jobs),
            ..Self::default()
        }
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.push(job);
    }

    /// Snapshot of the stored jobs in insertion order.
    pub async fn jobs(&self) -> Vec<Job> {
        self.jobs.read().await.clone()
    }

    /// Move a job to `status` as a worker would, bumping attempts on start.
    pub async fn set_status(&self, id: &str, status: JobStatus) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let job = find_mut(&mut jobs, id)?;
        if status == JobStatus::Running {
            job.attempts += 1;
            job.last_run_at = Some(Utc::now());
        }
        job.status = status;
        job.updated_at = Utc::now();
        Ok(())
    }

    pub async fn calls(&self) -> Vec<RepositoryCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    /// Make the next `count` calls fail as if the scheduler were unreachable.
    pub fn fail_next(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Delay the response of the next list call (after its snapshot is taken).
    pub async fn push_list_latency(&self, latency: Duration) {
        self.list_latencies.lock().await.push_back(latency);
    }

    async fn record(&self, call: RepositoryCall) -> Result<()> {
        debug!("In-memory job repository call: {:?}", call);
        self.calls.lock().await.push(call);

        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(DashboardError::unavailable("injected failure"));
        }
        Ok(())
    }
}

fn find_mut<'a>(jobs: &'a mut [Job], id: &str) -> Result<&'a mut Job> {
    jobs.iter_mut()
        .find(|job| job.id == id)
        .ok_or_else(|| DashboardError::JobNotFound { id: id.to_string() })
}

fn conflict(action: &str, job: &Job) -> DashboardError {
    DashboardError::unavailable(format!(
        "scheduler responded with 409 Conflict: cannot {} job {} in status {}",
        action, job.id, job.status
    ))
}

fn apply_query(jobs: &[Job], query: &JobQuery) -> Vec<Job> {
    let mut matched: Vec<Job> = jobs
        .iter()
        .filter(|job| query.name.as_ref().is_none_or(|name| &job.name == name))
        .filter(|job| query.statuses.is_empty() || query.statuses.contains(&job.status))
        .cloned()
        .collect();

    if let Some((field, order)) = query.sort {
        matched.sort_by(|a, b| {
            let ordering = match field {
                SortField::NextRunAt => a.next_run_at.cmp(&b.next_run_at),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    let skip = query.skip.unwrap_or(0) as usize;
    let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
    matched.into_iter().skip(skip).take(limit).collect()
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>> {
        self.record(RepositoryCall::List(query.clone())).await?;
        let snapshot = apply_query(&self.jobs.read().await, query);

        let latency = self.list_latencies.lock().await.pop_front();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(snapshot)
    }

    async fn get_job(&self, id: &str) -> Result<Job> {
        self.record(RepositoryCall::Get(id.to_string())).await?;
        self.jobs
            .read()
            .await
            .iter()
            .find(|job| job.id == id)
            .cloned()
            .ok_or_else(|| DashboardError::JobNotFound { id: id.to_string() })
    }

    async fn get_stats(&self) -> Result<JobStats> {
        self.record(RepositoryCall::Stats).await?;
        Ok(JobStats::from_jobs(self.jobs.read().await.iter()))
    }

    async fn create_job(&self, payload: &JobPayload) -> Result<Job> {
        self.record(RepositoryCall::Create(payload.clone())).await?;
        let name = payload.name.clone().ok_or_else(|| {
            DashboardError::unavailable("scheduler responded with 400 Bad Request: name is required")
        })?;

        let mut job = Job::new(Uuid::new_v4().to_string(), name).with_data(payload.data.clone());
        job.retry = Some(payload.retry.clone());
        job.repeat = payload.repeat.clone();
        if let Some(run_at) = payload.run_at {
            job.next_run_at = Some(run_at);
        }

        self.jobs.write().await.push(job.clone());
        Ok(job)
    }

    async fn update_job(&self, id: &str, payload: &JobPayload) -> Result<Job> {
        self.record(RepositoryCall::Update(id.to_string(), payload.clone()))
            .await?;
        let mut jobs = self.jobs.write().await;
        let job = find_mut(&mut jobs, id)?;

        job.data = payload.data.clone();
        let mut retry = payload.retry.clone();
        if retry.delay.is_dynamic() {
            // an omitted delay leaves the stored one in place
            if let Some(existing) = &job.retry {
                retry.delay = existing.delay;
            }
        }
        job.retry = Some(retry);
        job.repeat = payload.repeat.clone();
        if let Some(run_at) = payload.run_at {
            job.next_run_at = Some(run_at);
        }
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn cancel_job(&self, id: &str) -> Result<()> {
        self.record(RepositoryCall::Cancel(id.to_string())).await?;
        let mut jobs = self.jobs.write().await;
        let job = find_mut(&mut jobs, id)?;
        if !job.status.can_cancel() {
            return Err(conflict("cancel", job));
        }
        job.status = JobStatus::Cancelled;
        job.locked_by = None;
        job.locked_at = None;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn retry_job(&self, id: &str) -> Result<()> {
        self.record(RepositoryCall::Retry(id.to_string())).await?;
        let mut jobs = self.jobs.write().await;
        let job = find_mut(&mut jobs, id)?;
        if !job.status.can_retry() {
            return Err(conflict("retry", job));
        }
        let now = Utc::now();
        job.status = JobStatus::Pending;
        job.next_run_at = Some(now);
        job.locked_by = None;
        job.locked_at = None;
        job.updated_at = now;
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<()> {
        self.record(RepositoryCall::Delete(id.to_string())).await?;
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|job| job.id != id);
        if jobs.len() == before {
            return Err(DashboardError::JobNotFound { id: id.to_string() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::JobForm;
    use crate::job::{RetryDelay, RetryPolicy};

    fn seeded() -> InMemoryJobRepository {
        InMemoryJobRepository::with_jobs(vec![
            Job::new("1", "send-email"),
            Job::new("2", "resize-image").with_status(JobStatus::Running),
            Job::new("3", "send-email").with_status(JobStatus::Failed),
        ])
    }

    #[tokio::test]
    async fn test_list_applies_query() {
        let repository = seeded();

        let all = repository.list_jobs(&JobQuery::new()).await.unwrap();
        assert_eq!(all.len(), 3);

        let named = repository
            .list_jobs(&JobQuery::new().with_name("send-email").with_status(JobStatus::Failed))
            .await
            .unwrap();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].id, "3");

        let paged = repository
            .list_jobs(&JobQuery::new().with_skip(1).with_limit(1))
            .await
            .unwrap();
        assert_eq!(paged[0].id, "2");
    }

    #[tokio::test]
    async fn test_lifecycle_rules_are_enforced() {
        let repository = seeded();

        repository.cancel_job("2").await.unwrap();
        assert_eq!(
            repository.get_job("2").await.unwrap().status,
            JobStatus::Cancelled
        );
        assert!(repository.cancel_job("2").await.unwrap_err().is_repository_error());

        assert!(repository.retry_job("1").await.is_err());
        repository.retry_job("3").await.unwrap();
        assert_eq!(repository.get_job("3").await.unwrap().status, JobStatus::Pending);

        repository.delete_job("1").await.unwrap();
        assert!(matches!(
            repository.get_job("1").await,
            Err(DashboardError::JobNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_injected_failures_and_call_log() {
        let repository = seeded();
        repository.fail_next(1);

        assert!(repository.get_stats().await.is_err());
        let stats = repository.get_stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.failed, 1);

        assert_eq!(
            repository.calls().await,
            vec![RepositoryCall::Stats, RepositoryCall::Stats]
        );
        repository.clear_calls().await;
        assert_eq!(repository.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_keeps_name_and_stored_dynamic_delay() {
        let repository = InMemoryJobRepository::with_jobs(vec![Job::new("7", "backoff").with_retry(
            RetryPolicy::fixed(3, 500),
        )]);

        let mut form = JobForm::from_job(&repository.get_job("7").await.unwrap());
        form.name = "ignored".to_string();
        form.retry_delay.clear();
        let payload = form.validate().unwrap();

        let updated = repository.update_job("7", &payload).await.unwrap();
        assert_eq!(updated.name, "backoff");
        assert_eq!(updated.retry.unwrap().delay, RetryDelay::Fixed(500));
    }

    #[tokio::test]
    async fn test_set_status_counts_attempts() {
        let repository = seeded();
        repository.set_status("1", JobStatus::Running).await.unwrap();
        let job = repository.get_job("1").await.unwrap();
        assert_eq!(job.attempts, 1);
        assert!(job.last_run_at.is_some());
        assert!(repository.set_status("missing", JobStatus::Failed).await.is_err());
    }
}
