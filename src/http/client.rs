use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::types::{ApiError, ApiResult};

/// Per-call adjustments on top of the client defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    default_headers: HeaderMap,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.auth_token {
            default_headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
        }
        for (name, value) in &config.default_headers {
            default_headers.insert(header_name(name)?, header_value(value)?);
        }

        let http = Client::builder().build().map_err(ApiError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            default_headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions) -> ApiResult<T> {
        let builder = self
            .http
            .get(self.url(path))
            .headers(self.headers(options, true)?);
        self.execute(builder, Method::GET, path, options).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, options: &RequestOptions) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(ApiError::Decode)?;
        let builder = self
            .http
            .post(self.url(path))
            .headers(self.headers(options, true)?)
            .body(payload);
        self.execute(builder, Method::POST, path, options).await
    }

    /// POST a multipart form. The JSON content type is left off so reqwest
    /// can set the multipart boundary.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        options: &RequestOptions,
    ) -> ApiResult<T> {
        let builder = self
            .http
            .post(self.url(path))
            .headers(self.headers(options, false)?)
            .multipart(form);
        self.execute(builder, Method::POST, path, options).await
    }

    fn headers(&self, options: &RequestOptions, json_body: bool) -> ApiResult<HeaderMap> {
        let mut headers = self.default_headers.clone();
        if !json_body {
            headers.remove(CONTENT_TYPE);
        }
        for (name, value) in &options.headers {
            headers.insert(header_name(name)?, header_value(value)?);
        }
        Ok(headers)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: Method,
        path: &str,
        options: &RequestOptions,
    ) -> ApiResult<T> {
        let timeout = options.timeout.unwrap_or(self.timeout);
        debug!(%method, path, ?timeout, "API request");

        // Dropping the future on expiry aborts the in-flight request.
        let outcome = tokio::time::timeout(timeout, async {
            let response = builder.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        })
        .await;

        let (status, bytes) = match outcome {
            Err(_) => {
                debug!(%method, path, "Request timeout");
                return Err(ApiError::Timeout);
            }
            Ok(Err(e)) if e.is_timeout() => {
                debug!(%method, path, "Request timeout");
                return Err(ApiError::Timeout);
            }
            Ok(Err(e)) => {
                debug!(%method, path, error = %e, "Network error");
                return Err(ApiError::Network(e));
            }
            Ok(Ok(parts)) => parts,
        };

        debug!(%method, path, status = status.as_u16(), "API response");
        parse_response(status, &bytes)
    }
}

fn parse_response<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> ApiResult<T> {
    if !status.is_success() {
        let body = serde_json::from_slice::<Value>(bytes).ok();
        let message = match &body {
            Some(body) => ["error", "message"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str))
                .unwrap_or("API request failed")
                .to_string(),
            None => status
                .canonical_reason()
                .unwrap_or("API request failed")
                .to_string(),
        };
        debug!(status = status.as_u16(), %message, "API error");
        return Err(ApiError::Http {
            status: status.as_u16(),
            message,
            body,
        });
    }

    serde_json::from_slice(bytes).map_err(ApiError::Decode)
}

fn header_name(name: &str) -> ApiResult<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ApiError::InvalidRequest(format!("invalid header name {:?}: {}", name, e)))
}

fn header_value(value: &str) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ApiError::InvalidRequest(format!("invalid header value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use tokio::net::TcpListener;

    fn client_for(url: &str) -> ApiClient {
        ApiClient::new(&ApiConfig::new(url)).unwrap()
    }

    #[tokio::test]
    async fn test_get_sends_json_headers_and_parses_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/quiz/status/job-1")
            .match_header("accept", "application/json")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "pending"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let body: Value = client
            .get("/api/quiz/status/job-1", &RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(body, json!({"status": "pending"}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_serializes_body_and_merges_header_overrides() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_header("authorization", "Bearer token-1")
            .match_header("x-trace", "abc")
            .match_body(Matcher::Json(json!({"messages": []})))
            .with_status(202)
            .with_body(r#"{"job_id": "j1", "status": "pending"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&ApiConfig::new(server.url()).with_auth_token("token-1")).unwrap();
        let options = RequestOptions::default().header("X-Trace", "abc");
        let body: Value = client.post("/api/chat", &json!({"messages": []}), &options).await.unwrap();

        assert_eq!(body["job_id"], "j1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_message_taken_from_json_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/roadmap/status/missing")
            .with_status(404)
            .with_body(r#"{"error": "Không tìm thấy job"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/api/quiz")
            .with_status(422)
            .with_body(r#"{"message": "topic is required"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .get::<Value>("/api/roadmap/status/missing", &RequestOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Không tìm thấy job");
        assert_eq!(err.body(), Some(&json!({"error": "Không tìm thấy job"})));

        let err = client
            .post::<_, Value>("/api/quiz", &json!({}), &RequestOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.to_string(), "topic is required");
    }

    #[tokio::test]
    async fn test_unparseable_error_body_falls_back_to_status_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate-resource")
            .with_status(400)
            .with_body("Required Fields not provided")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .post::<_, Value>("/api/generate-resource", &json!({}), &RequestOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Bad Request");
        assert!(err.body().is_none());
    }

    #[tokio::test]
    async fn test_invalid_success_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let err = client_for(&server.url())
            .get::<Value>("/", &RequestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_stalled_server_times_out_with_408() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = client_for(&format!("http://{}", addr));
        let err = client
            .get::<Value>("/slow", &RequestOptions::with_timeout(Duration::from_millis(100)))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Timeout));
        assert_eq!(err.status_code(), 408);
        assert_eq!(err.to_string(), "Request timeout");
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(&format!("http://{}", addr))
            .get::<Value>("/", &RequestOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 0);
        assert_eq!(err.to_string(), "Network error");
    }

    #[test]
    fn test_invalid_header_override_is_rejected() {
        let client = client_for("http://localhost:1");
        let options = RequestOptions::default().header("bad header", "x");
        assert!(matches!(
            client.headers(&options, true),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_multipart_headers_drop_json_content_type() {
        let client = client_for("http://localhost:1");
        let headers = client.headers(&RequestOptions::default(), false).unwrap();
        assert!(headers.get(CONTENT_TYPE).is_none());
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }
}
