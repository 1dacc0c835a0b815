//! Application error types

use relay_domain::DomainError;
use thiserror::Error;

use crate::ports::PersistenceError;

/// Errors surfaced by the collection store.
///
/// Validation failures abort the operation before any state changes.
/// Persistence failures are normally logged and swallowed; they only show up
/// here when an operation reports them as recoverable.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No workspace with this id is known.
    #[error("unknown workspace: {0}")]
    UnknownWorkspace(String),

    /// No item with this id is loaded.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// The default workspace cannot be deleted.
    #[error("the default workspace cannot be deleted")]
    DefaultWorkspaceProtected,

    /// The parent id does not name a loaded folder.
    #[error("invalid parent: {0} is not a folder in the active workspace")]
    InvalidParent(String),

    /// Another domain rule was violated.
    #[error("domain error: {0}")]
    Domain(DomainError),

    /// The backend failed; in-memory state is still usable.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl From<DomainError> for StoreError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::InvalidParent(id) => Self::InvalidParent(id),
            other => Self::Domain(other),
        }
    }
}

impl StoreError {
    /// Returns true for validation failures (nothing was changed).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Persistence(_))
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
