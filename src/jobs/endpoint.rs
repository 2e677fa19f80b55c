use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::info;

use super::backend::{JobSubmitter, StatusFetcher};
use crate::http::{ApiClient, RequestOptions};
use crate::types::{ApiError, ApiResult, Job, JobCreated};

/// Creation path and status path prefix of one job-backed feature.
#[derive(Debug, Clone)]
pub struct JobEndpoint {
    create: String,
    status_base: String,
    create_options: RequestOptions,
    status_options: RequestOptions,
}

impl JobEndpoint {
    /// Endpoint whose status lives at `{create}/status/{job_id}`.
    pub fn new(create: impl Into<String>) -> Self {
        let create = create.into();
        let status_base = format!("{}/status", create);
        Self::with_status_base(create, status_base)
    }

    pub fn with_status_base(create: impl Into<String>, status_base: impl Into<String>) -> Self {
        Self {
            create: create.into(),
            status_base: status_base.into(),
            create_options: RequestOptions::default(),
            status_options: RequestOptions::default(),
        }
    }

    pub fn create_timeout(mut self, timeout: Duration) -> Self {
        self.create_options.timeout = Some(timeout);
        self
    }

    pub fn status_timeout(mut self, timeout: Duration) -> Self {
        self.status_options.timeout = Some(timeout);
        self
    }

    pub fn create_path(&self) -> &str {
        &self.create
    }

    pub fn status_path(&self, job_id: &str) -> String {
        format!("{}/{}", self.status_base, urlencoding::encode(job_id))
    }
}

/// Submitter and status fetcher for one endpoint pair over HTTP.
pub struct HttpJobs<T> {
    client: ApiClient,
    endpoint: JobEndpoint,
    _result: PhantomData<fn() -> T>,
}

impl<T> HttpJobs<T> {
    pub fn new(client: ApiClient, endpoint: JobEndpoint) -> Self {
        Self {
            client,
            endpoint,
            _result: PhantomData,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn endpoint(&self) -> &JobEndpoint {
        &self.endpoint
    }
}

impl<T> Clone for HttpJobs<T> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone(), self.endpoint.clone())
    }
}

/// Pull the job id out of a creation response.
pub fn job_id_from(created: JobCreated) -> ApiResult<String> {
    created
        .job_id
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingJobId)
}

#[async_trait]
impl<P, T> JobSubmitter<P> for HttpJobs<T>
where
    P: Serialize + Sync + ?Sized,
    T: Send + 'static,
{
    async fn submit(&self, payload: &P) -> ApiResult<String> {
        let created: JobCreated = self
            .client
            .post(self.endpoint.create_path(), payload, &self.endpoint.create_options)
            .await?;
        let job_id = job_id_from(created)?;
        info!(job_id = %job_id, path = self.endpoint.create_path(), "Job created");
        Ok(job_id)
    }
}

#[async_trait]
impl<T> StatusFetcher<T> for HttpJobs<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_status(&self, job_id: &str) -> ApiResult<Job<T>> {
        self.client
            .get(&self.endpoint.status_path(job_id), &self.endpoint.status_options)
            .await
    }
}
