//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The body type is not one of none, json, raw or form.
    #[error("unsupported body type: {0}")]
    UnsupportedBodyType(String),

    /// An identifier is invalid or empty.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A parent reference does not point at an existing folder.
    #[error("invalid parent: {0} is not a folder in this workspace")]
    InvalidParent(String),

    /// Re-parenting would make an item its own ancestor.
    #[error("moving {item} under {parent} would create a cycle")]
    CycleDetected {
        /// The item being placed.
        item: String,
        /// The requested parent.
        parent: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
