use async_trait::async_trait;

use crate::types::{ApiResult, Job};

/// Creates a job from a feature payload and returns its id.
#[async_trait]
pub trait JobSubmitter<P: ?Sized>: Send + Sync {
    async fn submit(&self, payload: &P) -> ApiResult<String>;
}

/// Reads the current record of a job. A job the backend does not know
/// surfaces as an HTTP 404 error.
#[async_trait]
pub trait StatusFetcher<T>: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> ApiResult<Job<T>>;
}
