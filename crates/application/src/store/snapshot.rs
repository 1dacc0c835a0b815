//! Serializable copy of the store's in-memory state.

use std::collections::BTreeMap;

use relay_domain::{Item, Workspace};
use serde::{Deserialize, Serialize};

/// Workspaces, the loaded items and both active pointers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Every known workspace by id.
    #[serde(default)]
    pub workspaces: BTreeMap<String, Workspace>,
    /// Items of the active workspace by id.
    #[serde(default)]
    pub collections: BTreeMap<String, Item>,
    /// Active workspace id.
    #[serde(default)]
    pub active_workspace: Option<String>,
    /// Active request id.
    #[serde(default)]
    pub active_request: Option<String>,
}
