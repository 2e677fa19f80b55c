use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::backend::{JobSubmitter, StatusFetcher};
use super::endpoint::{HttpJobs, JobEndpoint};
use super::poller::{PollPolicy, Poller};
use crate::http::ApiClient;
use crate::types::{ApiError, ApiResult, Job};

/// Submit-and-await for one job-backed feature.
///
/// `P` is the creation payload, `T` the result carried by a completed job.
pub struct JobApi<P: ?Sized, T> {
    submitter: Box<dyn JobSubmitter<P>>,
    fetcher: Box<dyn StatusFetcher<T>>,
    policy: PollPolicy,
}

impl<P, T> JobApi<P, T>
where
    P: Serialize + Sync + ?Sized + 'static,
    T: DeserializeOwned + Send + 'static,
{
    /// JSON payload POSTed to `endpoint`, status read from its status path.
    pub fn json(client: ApiClient, endpoint: JobEndpoint, policy: PollPolicy) -> Self {
        let jobs: HttpJobs<T> = HttpJobs::new(client, endpoint);
        Self::from_parts(Box::new(jobs.clone()), Box::new(jobs), policy)
    }
}

impl<P, T> JobApi<P, T>
where
    P: Sync + ?Sized,
    T: Send,
{
    pub fn from_parts(
        submitter: Box<dyn JobSubmitter<P>>,
        fetcher: Box<dyn StatusFetcher<T>>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            submitter,
            fetcher,
            policy,
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn create(&self, payload: &P) -> ApiResult<String> {
        self.submitter.submit(payload).await
    }

    pub async fn status(&self, job_id: &str) -> ApiResult<Job<T>> {
        self.fetcher.fetch_status(job_id).await
    }

    pub fn poller(&self) -> Poller<'_, T> {
        Poller::new(self.fetcher.as_ref(), self.policy.clone())
    }

    /// Create a job and poll it to completion, returning the completed record.
    pub async fn create_and_wait_job<F>(
        &self,
        payload: &P,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> ApiResult<Job<T>>
    where
        F: FnMut(&Job<T>),
    {
        let job_id = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            created = self.create(payload) => created?,
        };
        debug!(job_id = %job_id, "Waiting for job");

        self.poller()
            .with_cancellation(cancel.clone())
            .wait(&job_id, on_progress)
            .await
    }

    /// Create a job, poll it to completion and return its result.
    pub async fn create_and_wait<F>(
        &self,
        payload: &P,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> ApiResult<T>
    where
        F: FnMut(&Job<T>),
    {
        self.create_and_wait_job(payload, cancel, on_progress)
            .await?
            .into_result()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::JobStatus;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// In-memory backend: every job completes on its second status fetch and
    /// echoes its payload as the result.
    #[derive(Clone, Default)]
    pub(crate) struct EchoBackend {
        next_id: Arc<AtomicU32>,
        jobs: Arc<Mutex<HashMap<String, (Value, u32)>>>,
    }

    #[async_trait]
    impl JobSubmitter<Value> for EchoBackend {
        async fn submit(&self, payload: &Value) -> ApiResult<String> {
            let id = format!("job-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            self.jobs.lock().unwrap().insert(id.clone(), (payload.clone(), 0));
            Ok(id)
        }
    }

    #[async_trait]
    impl StatusFetcher<Value> for EchoBackend {
        async fn fetch_status(&self, job_id: &str) -> ApiResult<Job<Value>> {
            let mut jobs = self.jobs.lock().unwrap();
            let Some((payload, polls)) = jobs.get_mut(job_id) else {
                return Err(ApiError::Http {
                    status: 404,
                    message: "Không tìm thấy job".into(),
                    body: None,
                });
            };
            *polls += 1;
            if *polls < 2 {
                return Ok(Job::with_status(JobStatus::Processing));
            }
            let mut job = Job::with_status(JobStatus::Completed);
            job.job_id = Some(job_id.to_string());
            job.result = Some(payload.clone());
            Ok(job)
        }
    }

    fn echo_api(backend: &EchoBackend) -> JobApi<Value, Value> {
        JobApi::from_parts(
            Box::new(backend.clone()),
            Box::new(backend.clone()),
            PollPolicy::default().with_interval(Duration::from_millis(10)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_payloads_run_independent_jobs() {
        let backend = EchoBackend::default();
        let api = echo_api(&backend);
        let cancel = CancellationToken::new();
        let payload = json!({"topic": "Rust"});

        let (first, second) = tokio::join!(
            api.create_and_wait_job(&payload, &cancel, |_| {}),
            api.create_and_wait_job(&payload, &cancel, |_| {}),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_ne!(first.job_id, second.job_id);
        assert_eq!(first.result, Some(payload.clone()));
        assert_eq!(second.result, Some(payload));
        assert_eq!(backend.jobs.lock().unwrap().len(), 2);
        for (_, polls) in backend.jobs.lock().unwrap().values() {
            assert_eq!(*polls, 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_and_wait_returns_result() {
        let backend = EchoBackend::default();
        let mut updates = 0;

        let result = echo_api(&backend)
            .create_and_wait(&json!([1, 2, 3]), &CancellationToken::new(), |_| updates += 1)
            .await
            .unwrap();

        assert_eq!(result, json!([1, 2, 3]));
        assert_eq!(updates, 2);
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_submission() {
        let backend = EchoBackend::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = echo_api(&backend)
            .create_and_wait(&json!({}), &cancel, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Cancelled));
        assert!(backend.jobs.lock().unwrap().is_empty());
    }
}
