//! Embedded key-value persistence backend on `sled`.
//!
//! Keys:
//!
//! - `workspace/<id>`: the workspace record
//! - `item/<workspaceId>/<itemId>`: one folder or request, parent link
//!   included
//!
//! An item's key is its locator.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use relay_application::ports::{Clock, PersistenceAdapter, PersistenceError, PersistenceResult};
use relay_domain::{
    DEFAULT_WORKSPACE_ID, Folder, Item, ItemMap, Locator, Request, Variables, Workspace,
    is_default_workspace,
};
use sled::{Batch, Db};
use tracing::{debug, warn};

use crate::adapters::SystemClock;
use crate::serialization::{from_json_bytes, to_json_compact_bytes};

const WORKSPACE_PREFIX: &str = "workspace/";
const ITEM_PREFIX: &str = "item/";

/// Stores workspaces and items in a `sled` database.
#[derive(Clone)]
pub struct KvAdapter {
    db: Db,
    clock: Arc<dyn Clock>,
}

impl KvAdapter {
    /// Opens (or creates) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let db = sled::open(path).map_err(kv_error)?;
        Ok(Self::new(db))
    }

    /// Opens a throwaway database that is removed on drop.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn temporary() -> PersistenceResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(kv_error)?;
        Ok(Self::new(db))
    }

    /// Wraps an already opened database.
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Replaces the clock used to stamp new workspaces.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Writes pending changes to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> PersistenceResult<()> {
        self.db.flush().map_err(kv_error)?;
        Ok(())
    }

    fn put_workspace(&self, workspace: &Workspace) -> PersistenceResult<()> {
        let key = workspace_key(&workspace.id)?;
        let value = to_json_compact_bytes(workspace)?;
        self.db.insert(key, value).map_err(kv_error)?;
        Ok(())
    }

    fn put_item(&self, key: &str, item: &Item) -> PersistenceResult<()> {
        let value = to_json_compact_bytes(item)?;
        self.db.insert(key, value).map_err(kv_error)?;
        Ok(())
    }

    /// Stores a new item, checking that its parent was stored first.
    fn insert_new(
        &self,
        workspace_id: &str,
        item: Item,
        parent: Option<&Locator>,
    ) -> PersistenceResult<Locator> {
        if let Some(parent) = parent
            && !self.db.contains_key(parent.as_str()).map_err(kv_error)?
        {
            return Err(PersistenceError::NotFound(parent.to_string()));
        }

        let key = item_key(workspace_id, item.id())?;
        self.put_item(&key, &without_locator(item))?;
        debug!(%key, "item stored");
        Ok(Locator::new(key))
    }
}

#[async_trait]
impl PersistenceAdapter for KvAdapter {
    async fn load_workspaces(&self) -> PersistenceResult<HashMap<String, Workspace>> {
        let mut workspaces = HashMap::new();
        for entry in self.db.scan_prefix(WORKSPACE_PREFIX) {
            let (key, value) = entry.map_err(kv_error)?;
            match from_json_bytes::<Workspace>(&value) {
                Ok(workspace) => {
                    workspaces.insert(workspace.id.clone(), workspace);
                }
                Err(error) => {
                    warn!(key = %String::from_utf8_lossy(&key), %error, "skipping unreadable workspace");
                }
            }
        }

        if !workspaces.contains_key(DEFAULT_WORKSPACE_ID) {
            let default = Workspace::default_workspace(self.clock.now());
            self.db
                .insert(workspace_key(&default.id)?, to_json_compact_bytes(&default)?)
                .map_err(kv_error)?;
            workspaces.insert(default.id.clone(), default);
        }
        Ok(workspaces)
    }

    async fn load_workspace(&self, id: &str) -> PersistenceResult<Option<Workspace>> {
        let Some(value) = self.db.get(workspace_key(id)?).map_err(kv_error)? else {
            return Ok(None);
        };
        Ok(Some(from_json_bytes(&value)?))
    }

    async fn create_workspace(
        &self,
        id: &str,
        name: &str,
        description: &str,
        variables: Option<Variables>,
    ) -> PersistenceResult<Workspace> {
        let workspace = Workspace::new(id, name, description, self.clock.now())
            .with_variables(variables.unwrap_or_default());
        self.put_workspace(&workspace)?;
        Ok(workspace)
    }

    async fn update_workspace(&self, workspace: &Workspace) -> PersistenceResult<()> {
        self.put_workspace(workspace)
    }

    async fn delete_workspace(&self, id: &str) -> PersistenceResult<()> {
        if is_default_workspace(id) {
            return Err(PersistenceError::DefaultWorkspaceProtected);
        }

        let mut batch = Batch::default();
        batch.remove(workspace_key(id)?.as_str());
        for entry in self.db.scan_prefix(item_prefix(id)?) {
            let (key, _) = entry.map_err(kv_error)?;
            batch.remove(key);
        }
        self.db.apply_batch(batch).map_err(kv_error)?;
        Ok(())
    }

    async fn load_collections(&self, workspace_id: &str) -> PersistenceResult<ItemMap> {
        let mut items = ItemMap::new();
        for entry in self.db.scan_prefix(item_prefix(workspace_id)?) {
            let (key, value) = entry.map_err(kv_error)?;
            let key = String::from_utf8_lossy(&key).into_owned();
            match from_json_bytes::<Item>(&value) {
                Ok(mut item) => {
                    item.set_locator(Locator::new(key));
                    items.insert(item);
                }
                Err(error) => warn!(%key, %error, "skipping unreadable item"),
            }
        }
        debug!(workspace_id, count = items.len(), "collections loaded");
        Ok(items)
    }

    async fn create_folder(
        &self,
        workspace_id: &str,
        folder: &Folder,
        parent: Option<&Locator>,
    ) -> PersistenceResult<Locator> {
        self.insert_new(workspace_id, Item::from(folder.clone()), parent)
    }

    async fn create_request(
        &self,
        workspace_id: &str,
        request: &Request,
        parent: Option<&Locator>,
    ) -> PersistenceResult<Locator> {
        self.insert_new(workspace_id, Item::from(request.clone()), parent)
    }

    async fn update_request(&self, request: &Request) -> PersistenceResult<()> {
        let locator = request
            .locator
            .as_ref()
            .ok_or_else(|| PersistenceError::MissingLocator(request.id.clone()))?;
        if !self.db.contains_key(locator.as_str()).map_err(kv_error)? {
            return Err(PersistenceError::NotFound(locator.to_string()));
        }
        self.put_item(locator.as_str(), &without_locator(Item::from(request.clone())))
    }

    async fn delete_item(&self, locator: &Locator) -> PersistenceResult<()> {
        if !locator.as_str().starts_with(ITEM_PREFIX) {
            return Err(PersistenceError::Storage(format!(
                "not an item locator: {locator}"
            )));
        }
        self.db.remove(locator.as_str()).map_err(kv_error)?;
        Ok(())
    }
}

fn checked_segment(value: &str) -> PersistenceResult<&str> {
    if value.is_empty() || value.contains('/') {
        return Err(PersistenceError::Storage(format!("invalid key segment: {value:?}")));
    }
    Ok(value)
}

fn workspace_key(id: &str) -> PersistenceResult<String> {
    Ok(format!("{WORKSPACE_PREFIX}{}", checked_segment(id)?))
}

fn item_prefix(workspace_id: &str) -> PersistenceResult<String> {
    Ok(format!("{ITEM_PREFIX}{}/", checked_segment(workspace_id)?))
}

fn item_key(workspace_id: &str, item_id: &str) -> PersistenceResult<String> {
    Ok(format!(
        "{}{}",
        item_prefix(workspace_id)?,
        checked_segment(item_id)?
    ))
}

/// The locator is the key itself, so it is never stored in the value.
fn without_locator(mut item: Item) -> Item {
    match &mut item {
        Item::Folder(folder) => folder.locator = None,
        Item::Request(request) => request.locator = None,
    }
    item
}

fn kv_error(error: sled::Error) -> PersistenceError {
    PersistenceError::Storage(error.to_string())
}
