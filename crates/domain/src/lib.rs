//! Relay Domain - Core business types
//!
//! Workspaces, collection items, request and response value types for the
//! Relay API client. All types here are pure Rust with no I/O dependencies.

pub mod collection;
pub mod error;
pub mod id;
pub mod persistence;
pub mod request;
pub mod response;
pub mod state;
pub mod workspace;

pub use collection::{
    Folder, Item, ItemKind, ItemMap, Locator, Request, RequestPatch, TreeNode, flatten_ids,
};
pub use error::{DomainError, DomainResult};
pub use id::{DEFAULT_WORKSPACE_ID, generate_id, is_default_workspace};
pub use request::{BodyType, HttpMethod, KeyValue, KeyValueList, PreparedRequest, RequestBody};
pub use response::{ResponseBody, ResponseRecord, StatusCode};
pub use state::SendState;
pub use workspace::{Variables, Workspace};
