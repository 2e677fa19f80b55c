use anyhow::Result;
use std::env;
use std::time::Duration;

use crate::jobs::PollPolicy;

pub const DEFAULT_BASE_URL: &str = "https://nhanhoc-ca30a6361738.herokuapp.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub polling: PollPolicy,
}

/// Everything the HTTP transport needs. Built once and handed to `ApiClient::new`.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub auth_token: Option<String>,
    /// Extra headers sent with every request, after the JSON defaults.
    pub default_headers: Vec<(String, String)>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            auth_token: None,
            default_headers: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut api = ApiConfig::new(
            env::var("NHANHOC_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        )
        .with_timeout(Duration::from_millis(
            env::var("NHANHOC_API_TIMEOUT_MS")
                .unwrap_or_else(|_| DEFAULT_TIMEOUT_MS.to_string())
                .parse()?,
        ));
        if let Ok(token) = env::var("NHANHOC_API_TOKEN") {
            if !token.is_empty() {
                api = api.with_auth_token(token);
            }
        }

        let defaults = PollPolicy::default();
        let polling = PollPolicy {
            max_attempts: env::var("NHANHOC_POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| defaults.max_attempts.to_string())
                .parse()?,
            interval: Duration::from_millis(
                env::var("NHANHOC_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| defaults.interval.as_millis().to_string())
                    .parse()?,
            ),
            initial_delay: Duration::from_millis(
                env::var("NHANHOC_POLL_INITIAL_DELAY_MS")
                    .unwrap_or_else(|_| defaults.initial_delay.as_millis().to_string())
                    .parse()?,
            ),
            ..defaults
        };

        Ok(Self { api, polling })
    }
}
