// Type definitions shared by the transport, the poller and the feature adapters

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state reported by the backend for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Any status string this client does not know; treated as still running.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One job record as returned by a status endpoint.
///
/// `result` is only meaningful once `status` is `Completed`, `error` once it
/// is `Failed`. Timestamps are kept as the backend's strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub status: JobStatus,
    #[serde(default = "none", skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Display-only progress percentage (PDF analysis reports it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_message: Option<String>,
}

fn none<T>() -> Option<T> {
    None
}

impl<T> Job<T> {
    /// A bare record with the given status, used by fetchers that build jobs locally.
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            job_id: None,
            status,
            result: None,
            error: None,
            created_at: None,
            updated_at: None,
            completed_at: None,
            progress: None,
            progress_message: None,
        }
    }

    /// Take the result of a completed job.
    pub fn into_result(self) -> ApiResult<T> {
        self.result.ok_or(ApiError::MissingResult)
    }
}

/// Body returned by every job creation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreated {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `{status, data}` envelope used by the synchronous endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default = "none")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn into_data(self, what: &str) -> ApiResult<T> {
        match (self.status.as_str(), self.data) {
            ("success", Some(data)) => Ok(data),
            _ => Err(ApiError::InvalidRequest(
                self.error.unwrap_or_else(|| format!("Failed to get {}", what)),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// The single error type surfaced by every layer of the client.
///
/// Each variant maps to a numeric status through [`ApiError::status_code`]:
/// 0 for network failures, 408 for timeouts, the server's code for HTTP errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    #[error("Request timeout")]
    Timeout,

    #[error("Network error")]
    Network(#[source] reqwest::Error),

    #[error("Failed to parse response")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Response did not contain a job_id")]
    MissingJobId,

    /// The job itself reported `failed`; the message is the job's own error.
    #[error("{0}")]
    JobFailed(String),

    #[error("Job {job_id} could not be found on the server after {not_found} lookups")]
    NotFound { job_id: String, not_found: u32 },

    #[error("Job {job_id} disappeared after it started processing; the backend may have restarted")]
    LostJob { job_id: String },

    #[error("Polling timed out after {attempts} attempts ({elapsed:?}); the backend may be overloaded")]
    PollTimeout { attempts: u32, elapsed: Duration },

    #[error("Job completed without a result")]
    MissingResult,

    #[error("Polling was cancelled")]
    Cancelled,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Http { status, .. } => *status,
            ApiError::Timeout | ApiError::PollTimeout { .. } => 408,
            ApiError::Network(_) => 0,
            ApiError::NotFound { .. } | ApiError::LostJob { .. } => 404,
            ApiError::Cancelled => 499,
            ApiError::InvalidRequest(_) | ApiError::Io(_) => 400,
            ApiError::Decode(_)
            | ApiError::Base64(_)
            | ApiError::MissingJobId
            | ApiError::JobFailed(_)
            | ApiError::MissingResult => 500,
        }
    }

    /// True for a raw 404 from a status endpoint.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http { status: 404, .. })
    }

    /// Parsed error body, if the server sent one.
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            ApiError::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
