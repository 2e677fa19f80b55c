//! Async job protocol
//!
//! Every long-running backend feature follows the same shape: POST a payload,
//! receive a `job_id`, then poll `.../status/{job_id}` until the job is
//! `completed` or `failed`. This module holds the generic pieces:
//!
//! - `JobSubmitter` / `StatusFetcher`: the two backend calls
//! - `HttpJobs`: both calls over the HTTP transport for one endpoint pair
//! - `Poller`: drives a status fetcher to a terminal state
//! - `JobApi`: submit-and-await for one feature

pub mod api;
pub mod backend;
pub mod endpoint;
pub mod poller;

pub use api::JobApi;
pub use backend::{JobSubmitter, StatusFetcher};
pub use endpoint::{HttpJobs, JobEndpoint};
pub use poller::{PollPolicy, PollSession, Poller};
