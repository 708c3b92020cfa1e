//! Typed boundary to the remote scheduler's job API.
//!
//! Every method issues exactly one remote call and reports the decoded payload
//! or the failure as-is. Nothing here retries or caches; recovery policy
//! belongs to the caller.

pub mod http;
pub mod memory;

use crate::{
    Result,
    form::JobPayload,
    job::{Job, JobQuery, JobStats},
};
use async_trait::async_trait;

pub use http::HttpJobRepository;
pub use memory::{InMemoryJobRepository, RepositoryCall};

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// `GET /jobs`
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>>;

    /// `GET /jobs/{id}`
    async fn get_job(&self, id: &str) -> Result<Job>;

    /// `GET /jobs/stats`
    async fn get_stats(&self) -> Result<JobStats>;

    /// `POST /jobs`
    async fn create_job(&self, payload: &JobPayload) -> Result<Job>;

    /// `PUT /jobs/{id}`; the scheduler ignores any name on update.
    async fn update_job(&self, id: &str, payload: &JobPayload) -> Result<Job>;

    /// `POST /jobs/{id}/cancel`
    async fn cancel_job(&self, id: &str) -> Result<()>;

    /// `POST /jobs/{id}/retry`
    async fn retry_job(&self, id: &str) -> Result<()>;

    /// `DELETE /jobs/{id}`
    async fn delete_job(&self, id: &str) -> Result<()>;
}
