use serde::{Deserialize, Serialize};

use crate::http::ApiClient;
use crate::jobs::{JobApi, JobEndpoint, PollPolicy};

pub const RESOURCE_PATH: &str = "/api/generate-resource";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub course: String,
    pub knowledge_level: String,
    pub description: String,
    pub time: String,
}

/// Generated study material, as Markdown.
pub type ResourceApi = JobApi<ResourceRequest, String>;

pub fn resource_api(client: ApiClient, policy: PollPolicy) -> ResourceApi {
    JobApi::json(client, JobEndpoint::new(RESOURCE_PATH), policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::types::ApiError;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_server_error_on_status_is_a_hard_stop() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", RESOURCE_PATH)
            .with_status(202)
            .with_body(r#"{"job_id": "res-1", "status": "pending"}"#)
            .create_async()
            .await;
        let status = server
            .mock("GET", "/api/generate-resource/status/res-1")
            .with_status(500)
            .with_body(r#"{"error": "worker crashed"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(&ApiConfig::new(server.url())).unwrap();
        let api = resource_api(client, PollPolicy::default().with_interval(Duration::from_millis(5)));
        let request = ResourceRequest {
            course: "Rust".into(),
            knowledge_level: "Beginner".into(),
            description: "Ownership".into(),
            time: "1 hour".into(),
        };

        let err = api
            .create_and_wait(&request, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        status.assert_async().await;
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
        assert_eq!(err.to_string(), "worker crashed");
    }
}
