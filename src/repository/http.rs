//! JSON-over-HTTP implementation of [`JobRepository`].

use super::JobRepository;
use crate::{
    Result,
    config::DashboardConfig,
    error::DashboardError,
    form::JobPayload,
    job::{Job, JobQuery, JobStats},
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpJobRepository {
    client: Client,
    base_url: Url,
}

impl HttpJobRepository {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            DashboardError::Config(format!("Invalid API base URL '{}': {}", config.api_base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DashboardError::Config(format!(
                "API base URL cannot carry paths: {}",
                config.api_base_url
            )));
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DashboardError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::Config("API base URL cannot carry paths".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        debug!("{} {}", method, url);
        Ok(self.client.request(method, url))
    }

    /// Send and map failures. `job_id` turns a 404 into [`DashboardError::JobNotFound`].
    async fn send(&self, request: RequestBuilder, job_id: Option<&str>) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            warn!("Job repository request failed: {}", e);
            DashboardError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if let (StatusCode::NOT_FOUND, Some(id)) = (status, job_id) {
            return Err(DashboardError::JobNotFound { id: id.to_string() });
        }

        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY).collect();
        warn!("Job repository responded with {}: {}", status, body);
        Err(DashboardError::unavailable(if body.is_empty() {
            format!("scheduler responded with {}", status)
        } else {
            format!("scheduler responded with {}: {}", status, body)
        }))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            warn!("Undecodable job repository response: {}", e);
            DashboardError::unavailable(format!("undecodable response: {}", e))
        })
    }
}

#[async_trait]
impl JobRepository for HttpJobRepository {
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>> {
        let request = self
            .request(Method::GET, &["jobs"])?
            .query(&query.to_query_pairs());
        let response = self.send(request, None).await?;
        Self::decode(response).await
    }

    async fn get_job(&self, id: &str) -> Result<Job> {
        let request = self.request(Method::GET, &["jobs", id])?;
        let response = self.send(request, Some(id)).await?;
        Self::decode(response).await
    }

    async fn get_stats(&self) -> Result<JobStats> {
        let request = self.request(Method::GET, &["jobs", "stats"])?;
        let response = self.send(request, None).await?;
        Self::decode(response).await
    }

    async fn create_job(&self, payload: &JobPayload) -> Result<Job> {
        let request = self.request(Method::POST, &["jobs"])?.json(payload);
        let response = self.send(request, None).await?;
        Self::decode(response).await
    }

    async fn update_job(&self, id: &str, payload: &JobPayload) -> Result<Job> {
        let request = self.request(Method::PUT, &["jobs", id])?.json(payload);
        let response = self.send(request, Some(id)).await?;
        Self::decode(response).await
    }

    async fn cancel_job(&self, id: &str) -> Result<()> {
        let request = self.request(Method::POST, &["jobs", id, "cancel"])?;
        self.send(request, Some(id)).await?;
        Ok(())
    }

    async fn retry_job(&self, id: &str) -> Result<()> {
        let request = self.request(Method::POST, &["jobs", id, "retry"])?;
        self.send(request, Some(id)).await?;
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &["jobs", id])?;
        self.send(request, Some(id)).await?;
        Ok(())
    }
}
