//! The collection store.
//!
//! Mutations are applied to memory first, then handed to the persistence
//! adapter. Adapter failures are logged and never roll back memory: the
//! store degrades to memory-only durability instead of failing the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use relay_domain::{
    DEFAULT_WORKSPACE_ID, Folder, HttpMethod, Item, ItemKind, ItemMap, Locator, Request,
    RequestPatch, TreeNode, Workspace, generate_id, is_default_workspace,
};
use tracing::{debug, warn};

use super::events::{StoreEvent, SubscriptionId};
use super::snapshot::StoreSnapshot;
use crate::error::{StoreError, StoreResult};
use crate::ports::{Clock, PersistenceAdapter, PersistenceError};

type Listener = Box<dyn Fn(&StoreEvent) + Send + Sync>;

/// Outcome of [`CollectionStore::set_active_workspace`].
#[derive(Debug)]
pub enum WorkspaceSwitch {
    /// The id is unknown; nothing changed.
    Unchanged,
    /// The workspace is active and its items were loaded.
    Loaded {
        /// Number of items loaded.
        items: usize,
    },
    /// The workspace is active but its items could not be loaded; the
    /// store continues with an empty item map.
    MemoryOnly {
        /// Why loading failed.
        error: PersistenceError,
    },
}

impl WorkspaceSwitch {
    /// Returns true if the active workspace changed.
    #[must_use]
    pub const fn is_switched(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Where a new item goes in the backend.
enum Placement {
    Root,
    Under(Locator),
    /// The parent was never stored, so the child cannot be either.
    Detached,
}

/// Authoritative in-memory state of workspaces and the active collection.
///
/// Owned by the composition root and passed by reference; there is one per
/// process.
pub struct CollectionStore {
    adapter: Arc<dyn PersistenceAdapter>,
    clock: Arc<dyn Clock>,
    workspaces: BTreeMap<String, Workspace>,
    items: ItemMap,
    active_workspace: String,
    active_request: Option<String>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl CollectionStore {
    /// Creates a store holding only the default workspace.
    ///
    /// Call [`hydrate`](Self::hydrate) to load persisted state.
    #[must_use]
    pub fn new(adapter: Arc<dyn PersistenceAdapter>, clock: Arc<dyn Clock>) -> Self {
        let default = Workspace::default_workspace(clock.now());
        let mut workspaces = BTreeMap::new();
        workspaces.insert(default.id.clone(), default);

        Self {
            adapter,
            clock,
            workspaces,
            items: ItemMap::new(),
            active_workspace: DEFAULT_WORKSPACE_ID.to_string(),
            active_request: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ----- observers -----

    /// Registers a listener called synchronously after every mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&self, event: &StoreEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    // ----- bootstrap -----

    /// Loads workspaces and the active workspace's items from the adapter.
    ///
    /// The default workspace is always present afterwards. Listeners are
    /// notified once whether or not loading succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the adapter failed. The store
    /// stays usable in memory.
    pub async fn hydrate(&mut self) -> StoreResult<()> {
        let mut outcome = Ok(());

        match self.adapter.load_workspaces().await {
            Ok(loaded) => {
                let mut workspaces: BTreeMap<_, _> = loaded.into_iter().collect();
                if !workspaces.contains_key(DEFAULT_WORKSPACE_ID) {
                    let default = Workspace::default_workspace(self.clock.now());
                    workspaces.insert(default.id.clone(), default);
                }
                self.workspaces = workspaces;
            }
            Err(error) => {
                warn!(%error, "failed to load workspaces, continuing in memory");
                outcome = Err(error.into());
            }
        }

        if !self.workspaces.contains_key(&self.active_workspace) {
            self.active_workspace = DEFAULT_WORKSPACE_ID.to_string();
        }
        self.active_request = None;

        match self.adapter.load_collections(&self.active_workspace).await {
            Ok(items) => {
                warn_on_parent_cycles(&self.active_workspace, &items);
                self.items = items;
            }
            Err(error) => {
                warn!(workspace_id = %self.active_workspace, %error, "failed to load collections");
                self.items = ItemMap::new();
                if outcome.is_ok() {
                    outcome = Err(error.into());
                }
            }
        }

        debug!(
            workspaces = self.workspaces.len(),
            items = self.items.len(),
            "store hydrated"
        );
        self.notify(&StoreEvent::Hydrated {
            workspace_id: self.active_workspace.clone(),
        });
        outcome
    }

    // ----- workspaces -----

    /// All known workspaces, ordered by id.
    pub fn workspaces(&self) -> impl Iterator<Item = &Workspace> {
        self.workspaces.values()
    }

    /// Looks up a workspace.
    #[must_use]
    pub fn workspace(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.get(id)
    }

    /// Id of the active workspace.
    #[must_use]
    pub fn active_workspace_id(&self) -> &str {
        &self.active_workspace
    }

    /// The active workspace.
    #[must_use]
    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.workspaces.get(&self.active_workspace)
    }

    /// Creates a workspace with a fresh id.
    pub async fn create_workspace(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Workspace {
        let workspace = Workspace::new(generate_id(), name, description, self.clock.now());
        self.workspaces
            .insert(workspace.id.clone(), workspace.clone());

        if let Err(error) = self
            .adapter
            .create_workspace(
                &workspace.id,
                &workspace.name,
                &workspace.description,
                Some(workspace.variables.clone()),
            )
            .await
        {
            warn!(workspace_id = %workspace.id, %error, "workspace kept in memory only");
        }

        self.notify(&StoreEvent::WorkspaceCreated {
            workspace_id: workspace.id.clone(),
        });
        workspace
    }

    /// Deletes a workspace. Falls back to the default workspace when the
    /// deleted one was active.
    ///
    /// # Errors
    ///
    /// [`StoreError::DefaultWorkspaceProtected`] for `"default"` and
    /// [`StoreError::UnknownWorkspace`] for unknown ids. Nothing changes in
    /// either case.
    pub async fn delete_workspace(&mut self, id: &str) -> StoreResult<()> {
        if is_default_workspace(id) {
            return Err(StoreError::DefaultWorkspaceProtected);
        }
        if self.workspaces.remove(id).is_none() {
            return Err(StoreError::UnknownWorkspace(id.to_string()));
        }

        if let Err(error) = self.adapter.delete_workspace(id).await {
            warn!(workspace_id = %id, %error, "failed to delete stored workspace");
        }

        if self.active_workspace == id {
            self.active_workspace = DEFAULT_WORKSPACE_ID.to_string();
            self.active_request = None;
            self.items = match self.adapter.load_collections(DEFAULT_WORKSPACE_ID).await {
                Ok(items) => {
                    warn_on_parent_cycles(DEFAULT_WORKSPACE_ID, &items);
                    items
                }
                Err(error) => {
                    warn!(%error, "failed to load default workspace collections");
                    ItemMap::new()
                }
            };
        }

        self.notify(&StoreEvent::WorkspaceDeleted {
            workspace_id: id.to_string(),
        });
        Ok(())
    }

    /// Makes `id` the active workspace and loads its items.
    ///
    /// Unknown ids are ignored. A load failure leaves the workspace active
    /// with no items and is reported in the returned value.
    pub async fn set_active_workspace(&mut self, id: &str) -> WorkspaceSwitch {
        if !self.workspaces.contains_key(id) {
            debug!(workspace_id = %id, "ignoring switch to unknown workspace");
            return WorkspaceSwitch::Unchanged;
        }

        self.active_workspace = id.to_string();
        self.active_request = None;

        let switch = match self.adapter.load_collections(id).await {
            Ok(items) => {
                warn_on_parent_cycles(id, &items);
                let count = items.len();
                self.items = items;
                WorkspaceSwitch::Loaded { items: count }
            }
            Err(error) => {
                warn!(workspace_id = %id, %error, "collections unavailable, using empty map");
                self.items = ItemMap::new();
                WorkspaceSwitch::MemoryOnly { error }
            }
        };

        self.notify(&StoreEvent::WorkspaceActivated {
            workspace_id: id.to_string(),
        });
        switch
    }

    // ----- variables -----

    /// Sets a workspace variable.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownWorkspace`] if the workspace does not exist.
    pub async fn set_variable(
        &mut self,
        workspace_id: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> StoreResult<()> {
        let now = self.clock.now();
        let key = key.into();
        let workspace = self
            .workspaces
            .get_mut(workspace_id)
            .ok_or_else(|| StoreError::UnknownWorkspace(workspace_id.to_string()))?;
        workspace.set_variable(key.clone(), value, now);
        let stored = workspace.clone();

        self.persist_workspace(&stored).await;
        self.notify(&StoreEvent::VariableChanged {
            workspace_id: workspace_id.to_string(),
            key,
        });
        Ok(())
    }

    /// Reads a workspace variable.
    #[must_use]
    pub fn get_variable(&self, workspace_id: &str, key: &str) -> Option<&str> {
        self.workspaces.get(workspace_id)?.variable(key)
    }

    /// Removes a workspace variable, returning its old value.
    ///
    /// Removing an absent key changes nothing and notifies nobody.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownWorkspace`] if the workspace does not exist.
    pub async fn remove_variable(
        &mut self,
        workspace_id: &str,
        key: &str,
    ) -> StoreResult<Option<String>> {
        let now = self.clock.now();
        let workspace = self
            .workspaces
            .get_mut(workspace_id)
            .ok_or_else(|| StoreError::UnknownWorkspace(workspace_id.to_string()))?;
        let Some(removed) = workspace.remove_variable(key, now) else {
            return Ok(None);
        };
        let stored = workspace.clone();

        self.persist_workspace(&stored).await;
        self.notify(&StoreEvent::VariableChanged {
            workspace_id: workspace_id.to_string(),
            key: key.to_string(),
        });
        Ok(Some(removed))
    }

    async fn persist_workspace(&self, workspace: &Workspace) {
        if let Err(error) = self.adapter.update_workspace(workspace).await {
            warn!(workspace_id = %workspace.id, %error, "workspace change kept in memory only");
        }
    }

    // ----- items -----

    /// Looks up a loaded item.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// The flat item map of the active workspace.
    #[must_use]
    pub const fn items(&self) -> &ItemMap {
        &self.items
    }

    /// Number of loaded items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no items are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Display tree of the active workspace. Pure; calling it twice without
    /// a mutation in between yields identical trees.
    #[must_use]
    pub fn collection_tree(&self) -> Vec<TreeNode> {
        self.items.build_tree()
    }

    /// Creates a folder under `parent_id` (root when `None`).
    ///
    /// The folder is kept in memory even if the backend fails.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidParent`] if `parent_id` is not a loaded folder.
    pub async fn create_folder(
        &mut self,
        name: impl Into<String>,
        parent_id: Option<&str>,
    ) -> StoreResult<Folder> {
        self.items.check_parent(parent_id)?;

        let mut folder = Folder::new(generate_id(), name, self.clock.now())
            .with_parent(parent_id.map(String::from));
        self.items.insert(folder.clone().into());

        let placement = self.placement(parent_id);
        let locator = self.store_new_item(&Item::from(folder.clone()), placement).await;

        if let Some(locator) = locator {
            self.attach_locator(&folder.id, locator.clone());
            folder.locator = Some(locator);
        }

        self.notify(&StoreEvent::ItemCreated {
            id: folder.id.clone(),
            kind: ItemKind::Folder,
        });
        Ok(folder)
    }

    /// Creates a request. `method` defaults to `GET` and `url` to empty.
    ///
    /// The request is kept in memory even if the backend fails.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidParent`] if `parent_id` is not a loaded folder.
    pub async fn create_request(
        &mut self,
        name: impl Into<String>,
        method: Option<HttpMethod>,
        url: Option<&str>,
        parent_id: Option<&str>,
    ) -> StoreResult<Request> {
        self.items.check_parent(parent_id)?;

        let mut request = Request::new(generate_id(), name, self.clock.now())
            .with_method(method.unwrap_or_default())
            .with_url(url.unwrap_or_default())
            .with_parent(parent_id.map(String::from));
        self.items.insert(request.clone().into());

        let placement = self.placement(parent_id);
        let locator = self.store_new_item(&Item::from(request.clone()), placement).await;

        if let Some(locator) = locator {
            self.attach_locator(&request.id, locator.clone());
            request.locator = Some(locator);
        }

        self.notify(&StoreEvent::ItemCreated {
            id: request.id.clone(),
            kind: ItemKind::Request,
        });
        Ok(request)
    }

    fn placement(&self, parent_id: Option<&str>) -> Placement {
        let Some(parent_id) = parent_id else {
            return Placement::Root;
        };
        match self.items.get(parent_id).and_then(Item::locator) {
            Some(locator) => Placement::Under(locator.clone()),
            None => {
                warn!(parent_id = %parent_id, "parent folder was never stored");
                Placement::Detached
            }
        }
    }

    async fn store_new_item(&self, item: &Item, placement: Placement) -> Option<Locator> {
        let parent = match &placement {
            Placement::Root => None,
            Placement::Under(locator) => Some(locator),
            Placement::Detached => return None,
        };
        let workspace_id = self.active_workspace.as_str();
        let stored = match item {
            Item::Folder(folder) => {
                self.adapter
                    .create_folder(workspace_id, folder, parent)
                    .await
            }
            Item::Request(request) => {
                self.adapter
                    .create_request(workspace_id, request, parent)
                    .await
            }
        };
        match stored {
            Ok(locator) => Some(locator),
            Err(error) => {
                warn!(id = %item.id(), %error, "item kept in memory only");
                None
            }
        }
    }

    fn attach_locator(&mut self, id: &str, locator: Locator) {
        if let Some(item) = self.items.get_mut(id) {
            item.set_locator(locator);
        }
    }

    /// Merges `patch` into a request and re-stamps `updatedAt`.
    ///
    /// Returns `None` (and does nothing) if `id` is not a loaded request.
    pub async fn update_request(&mut self, id: &str, patch: RequestPatch) -> Option<Request> {
        let now = self.clock.now();
        let request = self.items.get_mut(id)?.as_request_mut()?;
        patch.apply(request, now);
        let updated = request.clone();

        if let Err(error) = self.adapter.update_request(&updated).await {
            warn!(id = %id, %error, "request update kept in memory only");
        }

        self.notify(&StoreEvent::RequestUpdated { id: id.to_string() });
        Some(updated)
    }

    /// Deletes an item and its whole subtree, children before parents.
    ///
    /// Every removed item that was stored gets one backend delete call. The
    /// in-memory removal happens regardless of those calls' outcome.
    /// Returns false if `id` is not loaded.
    pub async fn delete_item(&mut self, id: &str) -> bool {
        let order = self.items.descendants_post_order(id);
        if order.is_empty() {
            return false;
        }

        for item_id in &order {
            let Some(item) = self.items.remove(item_id) else {
                continue;
            };
            if let Some(locator) = item.locator()
                && let Err(error) = self.adapter.delete_item(locator).await
            {
                warn!(id = %item_id, %locator, %error, "failed to delete stored item");
            }
        }

        if self
            .active_request
            .as_ref()
            .is_some_and(|active| order.contains(active))
        {
            self.active_request = None;
        }

        self.notify(&StoreEvent::ItemsDeleted { ids: order });
        true
    }

    /// Sets a folder's display-only collapsed flag. Not persisted.
    pub fn set_folder_collapsed(&mut self, id: &str, collapsed: bool) -> bool {
        let Some(folder) = self.items.get_mut(id).and_then(Item::as_folder_mut) else {
            return false;
        };
        folder.collapsed = collapsed;
        self.notify(&StoreEvent::FolderCollapsed {
            id: id.to_string(),
            collapsed,
        });
        true
    }

    // ----- active request -----

    /// Points the editor at a request. Ignored unless `id` is a loaded
    /// request.
    pub fn set_active_request(&mut self, id: &str) -> bool {
        if !matches!(self.items.get(id), Some(Item::Request(_))) {
            return false;
        }
        self.active_request = Some(id.to_string());
        self.notify(&StoreEvent::ActiveRequestChanged {
            id: Some(id.to_string()),
        });
        true
    }

    /// Id of the active request.
    #[must_use]
    pub fn active_request_id(&self) -> Option<&str> {
        self.active_request.as_deref()
    }

    /// The active request.
    #[must_use]
    pub fn active_request(&self) -> Option<&Request> {
        self.items
            .get(self.active_request.as_deref()?)
            .and_then(Item::as_request)
    }

    // ----- snapshots -----

    /// Copies the in-memory state.
    #[must_use]
    pub fn export_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            workspaces: self.workspaces.clone(),
            collections: self
                .items
                .values()
                .map(|item| (item.id().to_string(), item.clone()))
                .collect(),
            active_workspace: Some(self.active_workspace.clone()),
            active_request: self.active_request.clone(),
        }
    }

    /// Replaces the in-memory state with `snapshot`. Not persisted.
    ///
    /// The default workspace is restored if missing; active pointers that
    /// name nothing fall back to the default workspace and no request.
    pub fn import_snapshot(&mut self, snapshot: StoreSnapshot) {
        self.workspaces = snapshot.workspaces;
        if !self.workspaces.contains_key(DEFAULT_WORKSPACE_ID) {
            let default = Workspace::default_workspace(self.clock.now());
            self.workspaces.insert(default.id.clone(), default);
        }

        self.items = snapshot.collections.into_values().collect();

        self.active_workspace = snapshot
            .active_workspace
            .filter(|id| self.workspaces.contains_key(id))
            .unwrap_or_else(|| DEFAULT_WORKSPACE_ID.to_string());
        warn_on_parent_cycles(&self.active_workspace, &self.items);
        self.active_request = snapshot
            .active_request
            .filter(|id| matches!(self.items.get(id), Some(Item::Request(_))));

        self.notify(&StoreEvent::SnapshotImported);
    }
}

/// Loaded maps may carry parent cycles the store never creates itself; the
/// tree shows those folders at the root.
fn warn_on_parent_cycles(workspace_id: &str, items: &ItemMap) {
    let cyclic = items.cyclic_ids();
    if !cyclic.is_empty() {
        warn!(workspace_id, ?cyclic, "folders with cyclic parents shown at root");
    }
}
