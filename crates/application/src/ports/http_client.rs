//! HTTP client port

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use relay_domain::PreparedRequest;
use thiserror::Error;
use tokio::sync::watch;

/// What the transport hands back for any received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase reported by the transport, if any.
    pub reason: Option<String>,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Fully read body.
    pub body: Vec<u8>,
}

/// Failures that produced no HTTP response at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request timed out.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("could not resolve host {host}: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Underlying message.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The resolved URL is not a valid absolute URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Redirect limit.
        max: usize,
    },

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Port for dispatching prepared HTTP requests.
///
/// This trait abstracts the HTTP client implementation, allowing
/// the application layer to be independent of specific HTTP libraries.
pub trait HttpClient: Send + Sync {
    /// Sends the request and waits for the full response body.
    ///
    /// # Errors
    ///
    /// Returns an error when no HTTP response was received.
    fn send(
        &self,
        request: &PreparedRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// Handle that aborts an in-flight send.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    /// Creates a token and the receiver handed to the send.
    #[must_use]
    pub fn new() -> (Self, CancellationReceiver) {
        let (sender, receiver) = watch::channel(false);
        (
            Self {
                sender: Arc::new(sender),
            },
            CancellationReceiver { receiver },
        )
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once `cancel` has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Receiving side of a [`CancellationToken`].
#[derive(Debug)]
pub struct CancellationReceiver {
    receiver: watch::Receiver<bool>,
}

impl CancellationReceiver {
    /// Completes when cancellation is requested.
    ///
    /// Never completes if the token is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
