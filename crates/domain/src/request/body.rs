//! HTTP request body types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// The kind of body saved with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    /// No body
    #[default]
    None,
    /// JSON text, parsed before sending when possible
    Json,
    /// Raw text sent verbatim
    Raw,
    /// URL-encoded form content
    #[serde(alias = "form-data", alias = "x-www-form-urlencoded")]
    Form,
}

impl BodyType {
    /// Returns the type as its persisted string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Json => "json",
            Self::Raw => "raw",
            Self::Form => "form",
        }
    }

    /// Content type applied when the request carries no explicit one.
    #[must_use]
    pub const fn default_content_type(self) -> Option<&'static str> {
        match self {
            Self::Json => Some("application/json"),
            Self::Form => Some("application/x-www-form-urlencoded"),
            Self::None | Self::Raw => None,
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyType {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "json" => Ok(Self::Json),
            "raw" => Ok(Self::Raw),
            "form" | "form-data" | "x-www-form-urlencoded" => Ok(Self::Form),
            other => Err(DomainError::UnsupportedBodyType(other.to_string())),
        }
    }
}

/// Request body: a type tag plus the unresolved text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestBody {
    /// The kind of body
    #[serde(rename = "type", default)]
    pub body_type: BodyType,
    /// The body content, possibly containing `{{variables}}`
    #[serde(default)]
    pub content: String,
}

impl RequestBody {
    /// Creates an empty body.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            body_type: BodyType::None,
            content: String::new(),
        }
    }

    /// Creates a JSON body.
    #[must_use]
    pub fn json(content: impl Into<String>) -> Self {
        Self {
            body_type: BodyType::Json,
            content: content.into(),
        }
    }

    /// Creates a raw text body.
    #[must_use]
    pub fn raw(content: impl Into<String>) -> Self {
        Self {
            body_type: BodyType::Raw,
            content: content.into(),
        }
    }

    /// Creates a form body.
    #[must_use]
    pub fn form(content: impl Into<String>) -> Self {
        Self {
            body_type: BodyType::Form,
            content: content.into(),
        }
    }

    /// Returns whether nothing would be transmitted for this body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body_type == BodyType::None || self.content.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body() {
        let body = RequestBody::json(r#"{"key": "value"}"#);
        assert_eq!(body.body_type.default_content_type(), Some("application/json"));
        assert!(!body.is_empty());
    }

    #[test]
    fn test_empty_body() {
        let body = RequestBody::none();
        assert!(body.is_empty());
        assert_eq!(body.body_type.default_content_type(), None);
    }

    #[test]
    fn test_persisted_shape() {
        let json = serde_json::to_string(&RequestBody::raw("hi")).unwrap();
        assert_eq!(json, r#"{"type":"raw","content":"hi"}"#);
    }

    #[test]
    fn test_legacy_form_aliases() {
        let body: RequestBody =
            serde_json::from_str(r#"{"type":"x-www-form-urlencoded","content":"a=1"}"#).unwrap();
        assert_eq!(body.body_type, BodyType::Form);
        assert_eq!("form-data".parse::<BodyType>().unwrap(), BodyType::Form);
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let body: RequestBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body, RequestBody::none());
    }
}
