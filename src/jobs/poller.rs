//! Poll loop for one job id.
//!
//! The backend keeps jobs in process memory on a host that cold-starts and
//! restarts, so a 404 from a status endpoint is expected for a while after
//! creation and may show up again mid-job. 404s are tolerated within the
//! budgets of [`PollPolicy`]; every other error is a hard stop once the
//! (default empty) error budget is spent.

use futures::Stream;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::StatusFetcher;
use crate::types::{ApiError, ApiResult, Job, JobStatus};

/// Bounds and tolerance constants of a poll loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Upper bound on status fetches, including failed ones.
    pub max_attempts: u32,
    /// Delay after a non-terminal status.
    pub interval: Duration,
    /// Warm-up delay before the first fetch.
    pub initial_delay: Duration,
    /// 404s on attempts below this index are a job not yet materialized.
    pub cold_start_attempts: u32,
    /// Attempts below this index back off with `cold_start_backoff`.
    pub slow_start_attempts: u32,
    pub cold_start_backoff: Duration,
    /// Delay after any other tolerated 404.
    pub not_found_backoff: Duration,
    /// Consecutive errors tolerated once a job was seen `processing` and then vanished.
    pub lost_job_limit: u32,
    pub lost_job_backoff: Duration,
    /// Cumulative 404s tolerated over the whole loop.
    pub not_found_limit: u32,
    /// Consecutive non-404 errors retried before giving up.
    pub error_budget: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_millis(2000),
            initial_delay: Duration::ZERO,
            cold_start_attempts: 10,
            slow_start_attempts: 3,
            cold_start_backoff: Duration::from_millis(3000),
            not_found_backoff: Duration::from_millis(2000),
            lost_job_limit: 10,
            lost_job_backoff: Duration::from_millis(3000),
            not_found_limit: 15,
            error_budget: 0,
        }
    }
}

impl PollPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn with_error_budget(mut self, error_budget: u32) -> Self {
        self.error_budget = error_budget;
        self
    }

    /// Upper bound of the time spent sleeping between regular attempts.
    pub fn nominal_budget(&self) -> Duration {
        self.initial_delay + self.interval * self.max_attempts
    }
}

/// State of one in-flight poll loop. Created per loop, never shared.
pub struct PollSession<'a, T> {
    fetcher: &'a dyn StatusFetcher<T>,
    policy: PollPolicy,
    cancel: CancellationToken,
    job_id: String,
    attempt: u32,
    consecutive_errors: u32,
    not_found: u32,
    last_status: Option<JobStatus>,
    started: Instant,
    pending_delay: Option<Duration>,
    pending_failure: Option<ApiError>,
    finished: bool,
}

impl<'a, T: Send> PollSession<'a, T> {
    pub fn new(
        fetcher: &'a dyn StatusFetcher<T>,
        policy: PollPolicy,
        cancel: CancellationToken,
        job_id: impl Into<String>,
    ) -> Self {
        let pending_delay = (!policy.initial_delay.is_zero()).then_some(policy.initial_delay);
        Self {
            fetcher,
            policy,
            cancel,
            job_id: job_id.into(),
            attempt: 0,
            consecutive_errors: 0,
            not_found: 0,
            last_status: None,
            started: Instant::now(),
            pending_delay,
            pending_failure: None,
            finished: false,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Number of status fetches issued so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn last_status(&self) -> Option<JobStatus> {
        self.last_status
    }

    /// Next fetched record, or the failure that ends the loop.
    ///
    /// Yields every record (terminal ones included). A `failed` record is
    /// followed by `Err(JobFailed)`. After a `completed` record or any error
    /// the session is exhausted and returns `None`.
    pub async fn next(&mut self) -> Option<ApiResult<Job<T>>> {
        if self.finished {
            return None;
        }
        if let Some(err) = self.pending_failure.take() {
            return Some(self.finish(err));
        }

        loop {
            if let Some(delay) = self.pending_delay.take() {
                if let Err(err) = self.pause(delay).await {
                    return Some(self.finish(err));
                }
            }

            if self.attempt >= self.policy.max_attempts {
                let elapsed = self.started.elapsed();
                warn!(job_id = %self.job_id, attempts = self.attempt, ?elapsed, "Polling attempts exhausted");
                return Some(self.finish(ApiError::PollTimeout {
                    attempts: self.attempt,
                    elapsed,
                }));
            }

            let index = self.attempt;
            self.attempt += 1;

            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ApiError::Cancelled),
                result = self.fetcher.fetch_status(&self.job_id) => result,
            };

            match fetched {
                Ok(job) => return Some(Ok(self.observe(index, job))),
                Err(ApiError::Cancelled) => return Some(self.finish(ApiError::Cancelled)),
                Err(err) => match self.classify(index, err) {
                    Ok(delay) => self.pending_delay = Some(delay),
                    Err(err) => return Some(self.finish(err)),
                },
            }
        }
    }

    fn observe(&mut self, index: u32, job: Job<T>) -> Job<T> {
        self.consecutive_errors = 0;
        self.last_status = Some(job.status);

        match job.status {
            JobStatus::Completed => {
                info!(job_id = %self.job_id, attempt = index + 1, "Job completed");
                self.finished = true;
            }
            JobStatus::Failed => {
                let message = job
                    .error
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Job failed".to_string());
                info!(job_id = %self.job_id, error = %message, "Job reported failure");
                self.pending_failure = Some(ApiError::JobFailed(message));
            }
            status => {
                debug!(
                    job_id = %self.job_id,
                    attempt = index + 1,
                    max_attempts = self.policy.max_attempts,
                    %status,
                    "Job still running"
                );
                self.pending_delay = Some(self.policy.interval);
            }
        }
        job
    }

    /// Decide whether a fetch error is retried, and after which delay.
    fn classify(&mut self, index: u32, err: ApiError) -> ApiResult<Duration> {
        let policy = &self.policy;

        if err.is_not_found() {
            self.not_found += 1;

            if index < policy.cold_start_attempts {
                let delay = if index < policy.slow_start_attempts {
                    policy.cold_start_backoff
                } else {
                    policy.not_found_backoff
                };
                debug!(job_id = %self.job_id, attempt = index + 1, not_found = self.not_found, "Job not ready yet");
                return Ok(delay);
            }

            if self.last_status == Some(JobStatus::Processing) {
                self.consecutive_errors += 1;
                if self.consecutive_errors > policy.lost_job_limit {
                    return Err(ApiError::LostJob {
                        job_id: self.job_id.clone(),
                    });
                }
                warn!(
                    job_id = %self.job_id,
                    consecutive_errors = self.consecutive_errors,
                    "Job vanished while processing, backend may have restarted"
                );
                return Ok(policy.lost_job_backoff);
            }

            if self.not_found > policy.not_found_limit {
                return Err(ApiError::NotFound {
                    job_id: self.job_id.clone(),
                    not_found: self.not_found,
                });
            }
            debug!(job_id = %self.job_id, not_found = self.not_found, "Job not found, retrying");
            return Ok(policy.not_found_backoff);
        }

        self.consecutive_errors += 1;
        if self.consecutive_errors > policy.error_budget {
            return Err(err);
        }
        warn!(
            job_id = %self.job_id,
            error = %err,
            consecutive_errors = self.consecutive_errors,
            "Status fetch failed, retrying"
        );
        Ok(policy.interval)
    }

    async fn pause(&self, delay: Duration) -> ApiResult<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ApiError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    fn finish(&mut self, err: ApiError) -> ApiResult<Job<T>> {
        self.finished = true;
        Err(err)
    }
}

/// Drives a status fetcher until the job reaches a terminal state.
pub struct Poller<'a, T> {
    fetcher: &'a dyn StatusFetcher<T>,
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl<'a, T: Send + 'a> Poller<'a, T> {
    pub fn new(fetcher: &'a dyn StatusFetcher<T>, policy: PollPolicy) -> Self {
        Self {
            fetcher,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn session(&self, job_id: &str) -> PollSession<'a, T> {
        PollSession::new(self.fetcher, self.policy.clone(), self.cancel.clone(), job_id)
    }

    /// Lazy stream of fetched records for `job_id`, ending after the first
    /// terminal record or failure.
    pub fn watch(&self, job_id: &str) -> impl Stream<Item = ApiResult<Job<T>>> + Send + 'a {
        futures::stream::unfold(self.session(job_id), |mut session| async move {
            let item = session.next().await?;
            Some((item, session))
        })
    }

    /// Poll until `completed`, handing every fetched record to `on_progress`.
    pub async fn wait<F>(&self, job_id: &str, mut on_progress: F) -> ApiResult<Job<T>>
    where
        F: FnMut(&Job<T>),
    {
        let mut session = self.session(job_id);
        loop {
            match session.next().await {
                Some(Ok(job)) => {
                    on_progress(&job);
                    if job.status == JobStatus::Completed {
                        return Ok(job);
                    }
                }
                Some(Err(err)) => return Err(err),
                None => {
                    return Err(ApiError::PollTimeout {
                        attempts: session.attempts(),
                        elapsed: session.started.elapsed(),
                    })
                }
            }
        }
    }
}
