// NhanHoc client - async job client for the NhanHoc learning-assistant backend

pub mod config;
pub mod types;
pub mod http;      // Transport: base URL, default headers, per-request timeout
pub mod jobs;      // Create-then-poll job protocol
pub mod features;  // Roadmap, quiz, resource, chat, recommendations, PDF, analytics
pub mod client;
pub mod utils;

// Re-exports for convenience
pub use client::LearningClient;
pub use config::{ApiConfig, Config};
pub use http::{ApiClient, RequestOptions};
pub use jobs::{JobApi, PollPolicy, Poller};
pub use types::{ApiError, ApiResult, Job, JobStatus};
pub use tokio_util::sync::CancellationToken;
