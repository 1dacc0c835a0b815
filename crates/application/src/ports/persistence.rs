//! Persistence adapter port.
//!
//! One contract, three interchangeable backends (on-disk hierarchy,
//! embedded key-value storage, remote service) chosen by the composition
//! root. The store holds the adapter as `Arc<dyn PersistenceAdapter>`.

use std::collections::HashMap;

use async_trait::async_trait;
use relay_domain::{Folder, ItemMap, Locator, Request, Variables, Workspace};
use thiserror::Error;

/// Storage-kind failures reported by any backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The workspace or item does not exist in the backend.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend refused to delete the default workspace.
    #[error("the default workspace cannot be deleted")]
    DefaultWorkspaceProtected,

    /// An update was attempted for an item that was never stored.
    #[error("item {0} has no storage locator")]
    MissingLocator(String),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The underlying storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The remote service answered with an error status.
    #[error("remote service returned {status}: {message}")]
    Remote {
        /// HTTP status.
        status: u16,
        /// Error text from the service.
        message: String,
    },

    /// The backend could not be reached.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for adapter operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Contract every storage backend satisfies.
///
/// Locators returned by `create_folder`/`create_request` are opaque: callers
/// only pass them back to the same backend.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Loads every stored workspace, seeding the default workspace when the
    /// backend has none. The store seeds it again in memory if an adapter
    /// does not.
    async fn load_workspaces(&self) -> PersistenceResult<HashMap<String, Workspace>>;

    /// Loads a single workspace.
    async fn load_workspace(&self, id: &str) -> PersistenceResult<Option<Workspace>>;

    /// Creates a workspace record.
    async fn create_workspace(
        &self,
        id: &str,
        name: &str,
        description: &str,
        variables: Option<Variables>,
    ) -> PersistenceResult<Workspace>;

    /// Overwrites a workspace record (metadata and variables).
    async fn update_workspace(&self, workspace: &Workspace) -> PersistenceResult<()>;

    /// Deletes a workspace and everything stored under it.
    ///
    /// Rejects `"default"` with [`PersistenceError::DefaultWorkspaceProtected`].
    async fn delete_workspace(&self, id: &str) -> PersistenceResult<()>;

    /// Loads a workspace's items as a flat map with parent links rebuilt.
    async fn load_collections(&self, workspace_id: &str) -> PersistenceResult<ItemMap>;

    /// Stores a folder under `parent` (root when `None`).
    async fn create_folder(
        &self,
        workspace_id: &str,
        folder: &Folder,
        parent: Option<&Locator>,
    ) -> PersistenceResult<Locator>;

    /// Stores a request under `parent` (root when `None`).
    async fn create_request(
        &self,
        workspace_id: &str,
        request: &Request,
        parent: Option<&Locator>,
    ) -> PersistenceResult<Locator>;

    /// Overwrites a stored request. The request must carry its locator.
    async fn update_request(&self, request: &Request) -> PersistenceResult<()>;

    /// Deletes a stored item.
    async fn delete_item(&self, locator: &Locator) -> PersistenceResult<()>;
}
