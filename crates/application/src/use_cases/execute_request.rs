//! Execute Request Use Case
//!
//! Turns a saved [`Request`] plus workspace variables into a
//! [`PreparedRequest`], dispatches it through the [`HttpClient`] port and
//! normalizes whatever comes back into a [`ResponseRecord`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use relay_domain::{BodyType, KeyValueList, PreparedRequest, Request, ResponseRecord, Variables};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::ports::{CancellationReceiver, HttpClient, TransportError};
use crate::variable_resolver::VariableResolver;

/// Use case for sending requests.
///
/// Stateless and reentrant: several sends may run through the same
/// instance. Keeping one send per editor is up to the caller (see
/// [`relay_domain::SendState`]).
///
/// # Example
///
/// ```ignore
/// let use_case = ExecuteRequest::new(Arc::new(ReqwestHttpClient::new()?));
/// let record = use_case.execute(&request, &workspace.variables).await;
/// println!("{} {}", record.status, record.status_text);
/// ```
pub struct ExecuteRequest<C: HttpClient> {
    client: Arc<C>,
}

impl<C: HttpClient> ExecuteRequest<C> {
    /// Creates a new `ExecuteRequest` use case with the given HTTP client.
    #[must_use]
    pub const fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Prepares and sends `request`.
    ///
    /// Never fails: transport failures and unusable URLs come back as a
    /// record with status `0`.
    pub async fn execute(&self, request: &Request, variables: &Variables) -> ResponseRecord {
        match prepare_request(request, variables) {
            Ok(prepared) => self.dispatch(&prepared).await,
            Err(error) => {
                warn!(request_id = %request.id, %error, "request not sent");
                ResponseRecord::network_error(error.to_string(), Duration::ZERO)
            }
        }
    }

    /// Like [`execute`](Self::execute), but gives up when `cancel` fires.
    ///
    /// Returns `None` when cancelled; no record is produced in that case.
    pub async fn execute_with_cancellation(
        &self,
        request: &Request,
        variables: &Variables,
        mut cancel: CancellationReceiver,
    ) -> Option<ResponseRecord> {
        tokio::select! {
            record = self.execute(request, variables) => Some(record),
            () = cancel.cancelled() => {
                debug!(request_id = %request.id, "send cancelled");
                None
            }
        }
    }

    async fn dispatch(&self, prepared: &PreparedRequest) -> ResponseRecord {
        debug!(method = %prepared.method, url = %prepared.url, "sending request");

        let started = Instant::now();
        let outcome = self.client.send(prepared).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(response) => {
                debug!(
                    status = response.status,
                    elapsed_ms = elapsed.as_millis(),
                    "response received"
                );
                ResponseRecord::from_http(
                    response.status,
                    response.reason.as_deref(),
                    response.headers,
                    &response.body,
                    elapsed,
                )
            }
            Err(error) => {
                warn!(url = %prepared.url, %error, "request failed");
                ResponseRecord::network_error(error.to_string(), elapsed)
            }
        }
    }
}

/// Builds the dispatchable form of `request`.
///
/// - The URL is resolved, must be absolute `http`/`https`, and gets every
///   active param appended after any query it already carries.
/// - Active headers are kept in order with resolved values.
/// - A body is only produced for methods that carry one and for non-empty
///   content. JSON bodies are re-serialized when they parse and sent as the
///   resolved text when they don't.
/// - `Content-Type` defaults from the body type unless a header sets it.
///
/// # Errors
///
/// [`TransportError::InvalidUrl`] when the resolved URL is unusable.
pub fn prepare_request(
    request: &Request,
    variables: &Variables,
) -> Result<PreparedRequest, TransportError> {
    let resolver = VariableResolver::new(variables);

    let url = build_url(&resolver.substitute(&request.url), &request.params, &resolver)?;
    let body = build_body(request, &resolver);

    let mut headers: Vec<(String, String)> = request
        .headers
        .active()
        .map(|h| (h.key.trim().to_string(), resolver.substitute(&h.value)))
        .collect();

    if body.is_some()
        && let Some(content_type) = request.body.body_type.default_content_type()
        && !request.headers.contains_active_key("content-type")
    {
        headers.push(("Content-Type".to_string(), content_type.to_string()));
    }

    Ok(PreparedRequest {
        method: request.method,
        url,
        headers,
        body,
    })
}

fn build_url(
    resolved: &str,
    params: &KeyValueList,
    resolver: &VariableResolver<'_>,
) -> Result<String, TransportError> {
    let resolved = resolved.trim();
    if resolved.is_empty() {
        return Err(TransportError::InvalidUrl("URL is required".to_string()));
    }

    let mut url =
        Url::parse(resolved).map_err(|e| TransportError::InvalidUrl(format!("{resolved}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TransportError::InvalidUrl(format!(
            "{resolved}: URL must start with http:// or https://"
        )));
    }

    let mut active = params.active().peekable();
    if active.peek().is_some() {
        let mut query = url.query_pairs_mut();
        for param in active {
            query.append_pair(param.key.trim(), &resolver.substitute(&param.value));
        }
    }

    Ok(url.into())
}

fn build_body(request: &Request, resolver: &VariableResolver<'_>) -> Option<String> {
    if !request.method.has_body() || request.body.is_empty() {
        return None;
    }

    let resolved = resolver.substitute(&request.body.content);
    if request.body.body_type == BodyType::Json {
        match serde_json::from_str::<Value>(&resolved) {
            Ok(value) => return Some(value.to_string()),
            Err(error) => {
                debug!(request_id = %request.id, %error, "JSON body sent as raw text");
            }
        }
    }
    Some(resolved)
}
