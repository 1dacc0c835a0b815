//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! It only moves bytes: variable substitution, body shaping and response
//! normalization happen in the application layer.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use relay_application::ports::{HttpClient, TransportError, TransportResponse};
use relay_domain::{HttpMethod, PreparedRequest};
use reqwest::{Client, Method, Url};

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_REDIRECTS: usize = 10;

/// HTTP client implementation using reqwest.
///
/// Wraps `reqwest::Client` and implements the `HttpClient` port from the
/// application layer.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    timeout: Duration,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// Default configuration:
    /// - Request timeout: 30 seconds
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled
    /// - User-Agent: "Relay/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("Relay/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Creates a new HTTP client with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Maps reqwest errors to the port's `TransportError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        let host = || {
            error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_connect() {
            let message = error_chain(error);
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return TransportError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lowered.contains("refused") {
                return TransportError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return TransportError::TooManyRedirects { max: MAX_REDIRECTS };
        }

        TransportError::Other(error_chain(error))
    }
}

/// Renders an error with its sources; reqwest keeps the useful part there.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl HttpClient for ReqwestHttpClient {
    fn send(
        &self,
        request: &PreparedRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + '_>> {
        // Clone what we need to move into the async block
        let method = request.method;
        let url = request.url.clone();
        let headers = request.headers.clone();
        let body = request.body.clone();
        let timeout = self.timeout;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        Box::pin(async move {
            let parsed_url =
                Url::parse(&url).map_err(|e| TransportError::InvalidUrl(format!("{e}: {url}")))?;

            let mut builder = self
                .client
                .request(Self::to_reqwest_method(method), parsed_url)
                .timeout(timeout);

            for (name, value) in &headers {
                builder = builder.header(name, value);
            }

            if let Some(body) = body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?;

            let status = response.status();

            // Repeated headers are folded into one comma-separated value.
            let mut response_headers: BTreeMap<String, String> = BTreeMap::new();
            for (name, value) in response.headers() {
                let value = value.to_str().unwrap_or("<binary>");
                response_headers
                    .entry(name.to_string())
                    .and_modify(|existing| {
                        existing.push_str(", ");
                        existing.push_str(value);
                    })
                    .or_insert_with(|| value.to_string());
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?
                .to_vec();

            Ok(TransportResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().map(String::from),
                headers: response_headers,
                body,
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prepared(method: HttpMethod, url: String) -> PreparedRequest {
        PreparedRequest {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Post),
            Method::POST
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Options),
            Method::OPTIONS
        );
    }

    #[tokio::test]
    async fn test_send_returns_status_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"[{"id":1}]"#),
            )
            .mount(&server)
            .await;

        let client = ReqwestHttpClient::new().unwrap();
        let response = client
            .send(&prepared(
                HttpMethod::Get,
                format!("{}/users?page=2", server.uri()),
            ))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.reason.as_deref(), Some("OK"));
        assert_eq!(
            response.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(response.body, br#"[{"id":1}]"#.to_vec());
    }

    #[tokio::test]
    async fn test_repeated_response_headers_are_joined() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "a=1")
                    .append_header("set-cookie", "b=2"),
            )
            .mount(&server)
            .await;

        let client = ReqwestHttpClient::new().unwrap();
        let response = client
            .send(&prepared(HttpMethod::Get, server.uri()))
            .await
            .unwrap();

        assert_eq!(
            response.headers.get("set-cookie").map(String::as_str),
            Some("a=1, b=2")
        );
    }

    #[tokio::test]
    async fn test_send_transmits_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/items"))
            .and(header("authorization", "Bearer abc"))
            .and(body_string(r#"{"name":"ada"}"#))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReqwestHttpClient::new().unwrap();
        let request = PreparedRequest {
            method: HttpMethod::Post,
            url: format!("{}/items", server.uri()),
            headers: vec![("Authorization".to_string(), "Bearer abc".to_string())],
            body: Some(r#"{"name":"ada"}"#.to_string()),
        };

        let response = client.send(&request).await.unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.reason.as_deref(), Some("Created"));
    }

    #[tokio::test]
    async fn test_error_status_is_still_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let client = ReqwestHttpClient::new().unwrap();
        let response = client
            .send(&prepared(HttpMethod::Delete, format!("{}/x", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, b"missing".to_vec());
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = ReqwestHttpClient::with_timeout(Duration::from_millis(100)).unwrap();
        let result = client
            .send(&prepared(HttpMethod::Get, format!("{}/slow", server.uri())))
            .await;

        assert_eq!(result, Err(TransportError::Timeout { timeout_ms: 100 }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_transport_error() {
        let client = ReqwestHttpClient::with_timeout(Duration::from_secs(5)).unwrap();
        let result = client
            .send(&prepared(HttpMethod::Get, "http://127.0.0.1:1/".to_string()))
            .await;

        assert!(matches!(
            result,
            Err(TransportError::ConnectionRefused { .. } | TransportError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let client = ReqwestHttpClient::new().unwrap();
        let result = client
            .send(&prepared(HttpMethod::Get, "not a url".to_string()))
            .await;
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }
}
