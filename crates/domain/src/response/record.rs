//! Normalized response record.
//!
//! Every send produces one of these, whether the server answered with an
//! error status or no HTTP response arrived at all.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::status::StatusCode;

/// Response body after content-type driven decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ResponseBody {
    /// No body (network failures).
    #[default]
    Null,
    /// Body kept as text.
    Text(String),
    /// Body decoded as structured data.
    Json(serde_json::Value),
}

impl ResponseBody {
    /// Returns true for the `Null` body.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Renders the body for display: pretty JSON, raw text or nothing.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(text) => text.clone(),
            Self::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// Uniform outcome of a request execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    /// HTTP status, `0` when no response was received.
    pub status: u16,
    /// Reason phrase, `"Network Error"` for status `0`.
    pub status_text: String,
    /// Wall-clock time from dispatch to full body.
    #[serde(with = "duration_millis")]
    pub time: Duration,
    /// Body size in bytes.
    pub size: usize,
    /// Response headers. Repeated names are joined into one value with `, `.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Decoded body.
    #[serde(default)]
    pub body: ResponseBody,
    /// Transport failure message, only set for status `0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseRecord {
    /// Builds a record for a failure that produced no HTTP response.
    #[must_use]
    pub fn network_error(message: impl Into<String>, time: Duration) -> Self {
        Self {
            status: StatusCode::NETWORK_ERROR.as_u16(),
            status_text: StatusCode::NETWORK_ERROR.reason_phrase().to_string(),
            time,
            size: 0,
            headers: BTreeMap::new(),
            body: ResponseBody::Null,
            error: Some(message.into()),
        }
    }

    /// Builds a record from a received HTTP response.
    ///
    /// The body is decoded as JSON when the `Content-Type` names a JSON
    /// media type (`application/json`, `*/*+json`). A decode failure falls
    /// back to text, as does every other content type.
    #[must_use]
    pub fn from_http(
        status: u16,
        reason: Option<&str>,
        headers: BTreeMap<String, String>,
        body: &[u8],
        time: Duration,
    ) -> Self {
        let status_text = reason
            .filter(|r| !r.is_empty())
            .map_or_else(|| StatusCode(status).reason_phrase().to_string(), String::from);

        let structured = header_value(&headers, "content-type").is_some_and(is_json_media_type);
        let body_value = decode_body(body, structured);

        Self {
            status,
            status_text,
            time,
            size: body.len(),
            headers,
            body: body_value,
            error: None,
        }
    }

    /// Returns true when no HTTP response was received.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        self.status == 0
    }

    /// Returns the status as a [`StatusCode`].
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::new(self.status)
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// Returns a human-readable size string (e.g., "1.2 KB").
    #[must_use]
    pub fn size_display(&self) -> String {
        format_bytes(self.size)
    }

    /// Returns a human-readable duration string (e.g., "124 ms").
    #[must_use]
    pub fn time_display(&self) -> String {
        let millis = self.time.as_millis();
        if millis < 1000 {
            format!("{millis} ms")
        } else {
            format!("{:.2} s", self.time.as_secs_f64())
        }
    }
}

fn header_value<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn is_json_media_type(content_type: &str) -> bool {
    content_type.parse::<mime::Mime>().is_ok_and(|m| {
        m.subtype() == mime::JSON || m.suffix().is_some_and(|s| s == mime::JSON)
    })
}

fn decode_body(body: &[u8], structured: bool) -> ResponseBody {
    if structured && let Ok(value) = serde_json::from_slice(body) {
        return ResponseBody::Json(value);
    }
    ResponseBody::Text(String::from_utf8_lossy(body).into_owned())
}

/// Formats bytes into a human-readable string.
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    #[allow(clippy::cast_precision_loss)]
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_network_error_shape() {
        let record = ResponseRecord::network_error("connection refused", Duration::from_millis(3));
        assert_eq!(record.status, 0);
        assert_eq!(record.status_text, "Network Error");
        assert_eq!(record.error.as_deref(), Some("connection refused"));
        assert!(record.body.is_null());
        assert!(record.is_network_error());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["body"], serde_json::Value::Null);
        assert_eq!(json["time"], 3);
        assert_eq!(json["statusText"], "Network Error");
    }

    #[test]
    fn test_json_body_is_structured() {
        let record = ResponseRecord::from_http(
            200,
            None,
            headers(&[("content-type", "application/json; charset=utf-8")]),
            br#"{"ok":true}"#,
            Duration::ZERO,
        );
        assert_eq!(record.body, ResponseBody::Json(json!({"ok": true})));
        assert_eq!(record.status_text, "OK");
        assert_eq!(record.size, 11);
        assert_eq!(record.error, None);
    }

    #[test]
    fn test_vendor_json_suffix_is_structured() {
        let record = ResponseRecord::from_http(
            422,
            Some("Unprocessable"),
            headers(&[("Content-Type", "application/problem+json")]),
            br#"{"title":"bad"}"#,
            Duration::ZERO,
        );
        assert!(matches!(record.body, ResponseBody::Json(_)));
        assert_eq!(record.status_text, "Unprocessable");
        assert!(!record.is_network_error());
    }

    #[test]
    fn test_malformed_json_falls_back_to_text() {
        let record = ResponseRecord::from_http(
            500,
            None,
            headers(&[("content-type", "application/json")]),
            b"<html>oops</html>",
            Duration::ZERO,
        );
        assert_eq!(record.body, ResponseBody::Text("<html>oops</html>".to_string()));
    }

    #[test]
    fn test_text_body_stays_text() {
        let record = ResponseRecord::from_http(
            200,
            None,
            headers(&[("content-type", "text/plain")]),
            b"{\"looks\":\"like json\"}",
            Duration::ZERO,
        );
        assert!(matches!(record.body, ResponseBody::Text(_)));
        assert_eq!(record.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_displays() {
        let mut record = ResponseRecord::network_error("x", Duration::from_millis(1500));
        record.size = 1536;
        assert_eq!(record.time_display(), "1.50 s");
        assert_eq!(record.size_display(), "1.50 KB");
        assert_eq!(format_bytes(500), "500 B");
    }
}
