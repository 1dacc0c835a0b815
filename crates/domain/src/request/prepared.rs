//! A fully resolved request, ready for the transport.

use crate::request::HttpMethod;

/// The dispatchable form of a saved request.
///
/// Every `{{variable}}` has been substituted, disabled entries dropped and
/// query parameters appended to `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL including the query string.
    pub url: String,
    /// Headers in send order.
    pub headers: Vec<(String, String)>,
    /// Body text, absent when nothing is sent.
    pub body: Option<String>,
}

impl PreparedRequest {
    /// Returns the first header value matching `name`, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
