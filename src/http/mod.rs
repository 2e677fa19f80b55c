//! HTTP Transport
//!
//! One request at a time against the configured backend:
//! - JSON default headers plus per-call overrides
//! - A bounded wait per call (408 on expiry)
//! - Every failure folded into a single `ApiError`
//!
//! Retrying is left to the poller.

pub mod client;

pub use client::{ApiClient, RequestOptions};
