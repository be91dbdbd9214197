use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{AnswerResponse, QueryRequest};

/// Endpoint used when neither the caller nor the environment names one.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/v1/chat";

/// Environment variable consulted for the answer service endpoint.
pub const ENDPOINT_ENV_VAR: &str = "CAMPUS_ASSISTANT_API_URL";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A remote question-answering service.
///
/// The exchange controller talks to the service only through this trait, so
/// tests and alternative transports can stand in for the HTTP client.
#[async_trait::async_trait]
pub trait AnswerService: Send + Sync {
    /// Ask one question and wait for the answer.
    async fn ask(&self, request: &QueryRequest) -> Result<AnswerResponse>;
}

#[async_trait::async_trait]
impl<T: AnswerService + ?Sized> AnswerService for Arc<T> {
    async fn ask(&self, request: &QueryRequest) -> Result<AnswerResponse> {
        self.as_ref().ask(request).await
    }
}

/// Pick the endpoint: an explicit value wins, then the environment, then the default.
///
/// Blank values are treated as unset.
pub fn resolve_endpoint(explicit: Option<String>, from_env: Option<String>) -> String {
    explicit
        .filter(|s| !s.trim().is_empty())
        .or_else(|| from_env.filter(|s| !s.trim().is_empty()))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

/// HTTP client for the answer service.
#[derive(Debug, Clone)]
pub struct AnswerClient {
    client: ReqwestClient,
    endpoint: Url,
    timeout: Duration,
}

impl AnswerClient {
    /// Create a new client.
    ///
    /// The endpoint can be provided directly or read from the
    /// `CAMPUS_ASSISTANT_API_URL` environment variable; without either the
    /// local development endpoint is used.
    pub fn new(endpoint: Option<String>) -> Result<Self> {
        Self::with_options(endpoint, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(endpoint: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = resolve_endpoint(endpoint, env::var(ENDPOINT_ENV_VAR).ok());
        let endpoint = Url::parse(&endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::url(
                format!("unsupported endpoint scheme: {}", endpoint.scheme()),
                None,
            ));
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// The endpoint questions are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        match response.text().await {
            Ok(body) if body.trim().is_empty() => Error::api(status_code, "empty response body"),
            Ok(body) => Error::api(status_code, body),
            Err(e) => Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            ),
        }
    }

    async fn post_query(&self, request: &QueryRequest) -> Result<AnswerResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(Self::default_headers())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<AnswerResponse>().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(
                    format!("Timed out reading response: {}", e),
                    Some(self.timeout.as_secs_f64()),
                )
            } else {
                Error::serialization(
                    format!("Failed to parse response: {}", e),
                    Some(Box::new(e)),
                )
            }
        })
    }
}

#[async_trait::async_trait]
impl AnswerService for AnswerClient {
    async fn ask(&self, request: &QueryRequest) -> Result<AnswerResponse> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.post_query(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            tracing::debug!(endpoint = %self.endpoint, error = %err, "answer request failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client =
            AnswerClient::new(Some("http://localhost:9000/api/v1/chat".to_string())).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:9000/api/v1/chat");
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);

        let client = AnswerClient::with_options(
            Some("https://assistant.example.edu/api/v1/chat".to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://assistant.example.edu/api/v1/chat"
        );
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let err = AnswerClient::new(Some("not a url".to_string())).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));

        let err = AnswerClient::new(Some("ftp://example.edu/chat".to_string())).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn endpoint_precedence() {
        assert_eq!(
            resolve_endpoint(
                Some("http://a.example/chat".to_string()),
                Some("http://b.example/chat".to_string())
            ),
            "http://a.example/chat"
        );
        assert_eq!(
            resolve_endpoint(None, Some("http://b.example/chat".to_string())),
            "http://b.example/chat"
        );
        assert_eq!(
            resolve_endpoint(Some("  ".to_string()), Some(String::new())),
            DEFAULT_ENDPOINT
        );
        assert_eq!(resolve_endpoint(None, None), DEFAULT_ENDPOINT);
    }

    #[tokio::test]
    async fn unreachable_service_is_connection_error() {
        // Bind then drop a listener to get a port nothing is serving.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = AnswerClient::with_options(
            Some(format!("http://{addr}/api/v1/chat")),
            Some(Duration::from_secs(2)),
        )
        .unwrap();
        let err = client
            .ask(&QueryRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(err.is_connection(), "got {err:?}");
    }
}
