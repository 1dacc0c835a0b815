//! Change notifications emitted by the store.

use relay_domain::ItemKind;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// What changed. Emitted once per mutating operation, after memory is
/// consistent and the backend call has returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Workspaces and the active workspace's items were (re)loaded.
    Hydrated {
        /// The active workspace after hydration.
        workspace_id: String,
    },
    /// A workspace was created.
    WorkspaceCreated {
        /// New workspace id.
        workspace_id: String,
    },
    /// A workspace was deleted.
    WorkspaceDeleted {
        /// Deleted workspace id.
        workspace_id: String,
    },
    /// The active workspace changed and its items were loaded.
    WorkspaceActivated {
        /// Newly active workspace id.
        workspace_id: String,
    },
    /// A folder or request was created.
    ItemCreated {
        /// New item id.
        id: String,
        /// Folder or request.
        kind: ItemKind,
    },
    /// A request was updated.
    RequestUpdated {
        /// Request id.
        id: String,
    },
    /// An item and its descendants were removed, children first.
    ItemsDeleted {
        /// Removed ids in removal order.
        ids: Vec<String>,
    },
    /// A workspace variable was set or removed.
    VariableChanged {
        /// Owning workspace.
        workspace_id: String,
        /// Variable name.
        key: String,
    },
    /// The active request pointer changed.
    ActiveRequestChanged {
        /// New active request, `None` when cleared.
        id: Option<String>,
    },
    /// A folder was expanded or collapsed.
    FolderCollapsed {
        /// Folder id.
        id: String,
        /// New state.
        collapsed: bool,
    },
    /// State was replaced from a snapshot.
    SnapshotImported,
}
