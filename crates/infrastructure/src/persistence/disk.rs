//! On-disk persistence backend.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/
//! └── <workspace-id>/
//!     ├── workspace.json
//!     ├── health-check.json        request at the collection root
//!     └── users/                   folder
//!         ├── folder.json
//!         ├── list-users.json
//!         └── list-users-2.json    same-named sibling
//! ```
//!
//! Locators are `/`-separated paths relative to the root.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use relay_application::ports::{
    Clock, FileSystem, FileSystemError, PersistenceAdapter, PersistenceError, PersistenceResult,
};
use relay_domain::persistence::{CURRENT_SCHEMA_VERSION, FolderRecord, RequestRecord};
use relay_domain::{
    DEFAULT_WORKSPACE_ID, Folder, ItemMap, Locator, Request, Variables, Workspace,
    is_default_workspace,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::adapters::SystemClock;
use crate::serialization::{from_json, to_json_stable};

/// File names used in the workspace structure.
const WORKSPACE_FILE: &str = "workspace.json";
const FOLDER_FILE: &str = "folder.json";
const JSON_EXTENSION: &str = "json";

/// Stores workspaces as directories of JSON files.
pub struct DiskAdapter<F: FileSystem> {
    fs: F,
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl<F: FileSystem> DiskAdapter<F> {
    /// Creates an adapter rooted at `root`. Nothing is created until the
    /// first write.
    #[must_use]
    pub fn new(fs: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Replaces the clock used to stamp new workspaces.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workspace_dir(&self, id: &str) -> PersistenceResult<PathBuf> {
        let relative = checked_relative(id, 1, 1)?;
        Ok(self.root.join(relative))
    }

    fn resolve(&self, locator: &Locator) -> PersistenceResult<PathBuf> {
        let relative = checked_relative(locator.as_str(), 2, usize::MAX)?;
        Ok(self.root.join(relative))
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> PersistenceResult<T> {
        let content = self
            .fs
            .read_file_string(path)
            .await
            .map_err(storage_error)?;
        Ok(from_json(&content)?)
    }

    async fn write_json<T: Serialize + Sync>(&self, path: &Path, value: &T) -> PersistenceResult<()> {
        let json = to_json_stable(value)?;
        self.fs
            .write_file(path, json.as_bytes())
            .await
            .map_err(storage_error)
    }

    /// Directory and locator prefix that a new item goes into.
    async fn target_dir(
        &self,
        workspace_id: &str,
        parent: Option<&Locator>,
    ) -> PersistenceResult<(PathBuf, String)> {
        match parent {
            Some(parent) => {
                let dir = self.resolve(parent)?;
                if !self.fs.is_dir(&dir).await {
                    return Err(PersistenceError::NotFound(parent.to_string()));
                }
                Ok((dir, parent.as_str().to_string()))
            }
            None => {
                let dir = self.workspace_dir(workspace_id)?;
                self.fs.create_dir_all(&dir).await.map_err(storage_error)?;
                Ok((dir, workspace_id.to_string()))
            }
        }
    }

    /// First free entry name in `dir`: `base`, then `base-2`, `base-3`, ...
    async fn unique_name(&self, dir: &Path, base: &str, suffix: &str) -> String {
        let mut candidate = format!("{base}{suffix}");
        let mut counter = 2;
        while is_reserved(&candidate) || self.fs.exists(&dir.join(&candidate)).await {
            candidate = format!("{base}-{counter}{suffix}");
            counter += 1;
        }
        candidate
    }

    async fn read_folder_record(&self, dir: &Path) -> Option<FolderRecord> {
        let path = dir.join(FOLDER_FILE);
        if !self.fs.exists(&path).await {
            let now = self.clock.now();
            return Some(FolderRecord {
                created_at: now,
                id: None,
                name: None,
                schema_version: CURRENT_SCHEMA_VERSION,
                updated_at: now,
            });
        }
        match self.read_json::<FolderRecord>(&path).await {
            Ok(record) if record.schema_version > CURRENT_SCHEMA_VERSION => {
                warn!(path = %path.display(), version = record.schema_version, "skipping folder with newer schema");
                None
            }
            Ok(record) => Some(record),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable folder");
                None
            }
        }
    }

    async fn read_request_record(&self, path: &Path) -> Option<RequestRecord> {
        match self.read_json::<RequestRecord>(path).await {
            Ok(record) if record.schema_version > CURRENT_SCHEMA_VERSION => {
                warn!(path = %path.display(), version = record.schema_version, "skipping request with newer schema");
                None
            }
            Ok(record) => Some(record),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable request file");
                None
            }
        }
    }
}

#[async_trait]
impl<F: FileSystem> PersistenceAdapter for DiskAdapter<F> {
    async fn load_workspaces(&self) -> PersistenceResult<HashMap<String, Workspace>> {
        let mut workspaces = HashMap::new();
        let entries = if self.fs.exists(&self.root).await {
            self.fs.read_dir(&self.root).await.map_err(storage_error)?
        } else {
            Vec::new()
        };

        for entry in entries {
            let Some(dir_name) = file_name(&entry) else {
                continue;
            };
            let file = entry.join(WORKSPACE_FILE);
            if !self.fs.exists(&file).await {
                continue;
            }
            match self.read_json::<Workspace>(&file).await {
                Ok(mut workspace) => {
                    if workspace.id != dir_name {
                        warn!(id = %workspace.id, dir = %dir_name, "workspace id differs from its directory");
                        workspace.id = dir_name;
                    }
                    workspaces.insert(workspace.id.clone(), workspace);
                }
                Err(error) => {
                    warn!(path = %file.display(), %error, "skipping unreadable workspace");
                }
            }
        }

        if !workspaces.contains_key(DEFAULT_WORKSPACE_ID) {
            let default = Workspace::default_workspace(self.clock.now());
            let file = self.root.join(DEFAULT_WORKSPACE_ID).join(WORKSPACE_FILE);
            if let Err(error) = self.write_json(&file, &default).await {
                warn!(%error, "default workspace not written");
            }
            workspaces.insert(default.id.clone(), default);
        }

        debug!(root = %self.root.display(), count = workspaces.len(), "workspaces loaded");
        Ok(workspaces)
    }

    async fn load_workspace(&self, id: &str) -> PersistenceResult<Option<Workspace>> {
        let file = self.workspace_dir(id)?.join(WORKSPACE_FILE);
        if !self.fs.exists(&file).await {
            return Ok(None);
        }
        self.read_json(&file).await.map(Some)
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
        let file = self.workspace_dir(id)?.join(WORKSPACE_FILE);
        self.write_json(&file, &workspace).await?;
        Ok(workspace)
    }

    async fn update_workspace(&self, workspace: &Workspace) -> PersistenceResult<()> {
        let file = self.workspace_dir(&workspace.id)?.join(WORKSPACE_FILE);
        self.write_json(&file, workspace).await
    }

    async fn delete_workspace(&self, id: &str) -> PersistenceResult<()> {
        if is_default_workspace(id) {
            return Err(PersistenceError::DefaultWorkspaceProtected);
        }
        let dir = self.workspace_dir(id)?;
        if self.fs.exists(&dir).await {
            self.fs.remove_dir_all(&dir).await.map_err(storage_error)?;
        }
        Ok(())
    }

    async fn load_collections(&self, workspace_id: &str) -> PersistenceResult<ItemMap> {
        let mut items = ItemMap::new();
        let dir = self.workspace_dir(workspace_id)?;
        if !self.fs.is_dir(&dir).await {
            return Ok(items);
        }

        let mut pending: Vec<(PathBuf, String, Option<String>)> =
            vec![(dir, workspace_id.to_string(), None)];

        while let Some((dir, prefix, parent_id)) = pending.pop() {
            let entries = match self.fs.read_dir(&dir).await {
                Ok(entries) => entries,
                Err(error) => {
                    warn!(path = %dir.display(), %error, "skipping unreadable directory");
                    continue;
                }
            };

            for entry in entries {
                let Some(name) = file_name(&entry) else {
                    continue;
                };
                if name.starts_with('.') || is_reserved(&name) {
                    continue;
                }
                let locator = Locator::new(format!("{prefix}/{name}"));

                if self.fs.is_dir(&entry).await {
                    let Some(record) = self.read_folder_record(&entry).await else {
                        continue;
                    };
                    let anonymous = record.id.is_none();
                    let mut folder = record.into_folder(&name, parent_id.clone(), locator.clone());
                    if anonymous {
                        folder.id = locator.to_string();
                    }
                    if items.contains(&folder.id) {
                        warn!(id = %folder.id, %locator, "skipping folder with duplicate id");
                        continue;
                    }
                    pending.push((entry, locator.into_inner(), Some(folder.id.clone())));
                    items.insert(folder.into());
                } else if entry
                    .extension()
                    .is_some_and(|ext| ext == JSON_EXTENSION)
                {
                    let Some(record) = self.read_request_record(&entry).await else {
                        continue;
                    };
                    let stem = entry
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or(&name)
                        .to_string();
                    let anonymous = record.id.is_none();
                    let mut request = record.into_request(&stem, parent_id.clone(), locator.clone());
                    if anonymous {
                        request.id = locator.to_string();
                    }
                    if items.contains(&request.id) {
                        warn!(id = %request.id, %locator, "skipping request with duplicate id");
                        continue;
                    }
                    items.insert(request.into());
                }
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
        let (dir, prefix) = self.target_dir(workspace_id, parent).await?;
        let name = self
            .unique_name(&dir, &slug_or(&folder.name, "folder"), "")
            .await;
        let path = dir.join(&name);

        self.fs.create_dir_all(&path).await.map_err(storage_error)?;
        self.write_json(&path.join(FOLDER_FILE), &FolderRecord::from_folder(folder))
            .await?;

        debug!(id = %folder.id, path = %path.display(), "folder created");
        Ok(Locator::new(format!("{prefix}/{name}")))
    }

    async fn create_request(
        &self,
        workspace_id: &str,
        request: &Request,
        parent: Option<&Locator>,
    ) -> PersistenceResult<Locator> {
        let (dir, prefix) = self.target_dir(workspace_id, parent).await?;
        let name = self
            .unique_name(&dir, &slug_or(&request.name, "request"), ".json")
            .await;
        let path = dir.join(&name);

        self.write_json(&path, &RequestRecord::from_request(request))
            .await?;

        debug!(id = %request.id, path = %path.display(), "request created");
        Ok(Locator::new(format!("{prefix}/{name}")))
    }

    async fn update_request(&self, request: &Request) -> PersistenceResult<()> {
        let locator = request
            .locator
            .as_ref()
            .ok_or_else(|| PersistenceError::MissingLocator(request.id.clone()))?;
        let path = self.resolve(locator)?;
        if !self.fs.exists(&path).await {
            return Err(PersistenceError::NotFound(locator.to_string()));
        }
        self.write_json(&path, &RequestRecord::from_request(request))
            .await
    }

    async fn delete_item(&self, locator: &Locator) -> PersistenceResult<()> {
        let path = self.resolve(locator)?;
        if !self.fs.exists(&path).await {
            debug!(%locator, "item already gone");
            return Ok(());
        }
        let removed = if self.fs.is_dir(&path).await {
            self.fs.remove_dir_all(&path).await
        } else {
            self.fs.remove_file(&path).await
        };
        removed.map_err(storage_error)
    }
}

/// Turns a display name into a file-system friendly slug.
///
/// Lowercases, replaces every non-alphanumeric run with a single `-` and
/// trims dashes at both ends.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn slug_or(name: &str, fallback: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

fn is_reserved(name: &str) -> bool {
    name == WORKSPACE_FILE || name == FOLDER_FILE
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(ToString::to_string)
}

/// Accepts only plain relative paths with a bounded number of components.
fn checked_relative(value: &str, min: usize, max: usize) -> PersistenceResult<&Path> {
    let path = Path::new(value);
    let mut count = 0;
    for component in path.components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(PersistenceError::Storage(format!("invalid path: {value}")));
        }
        count += 1;
    }
    if count < min || count > max {
        return Err(PersistenceError::Storage(format!("invalid path: {value}")));
    }
    Ok(path)
}

fn storage_error(error: FileSystemError) -> PersistenceError {
    match error {
        FileSystemError::NotFound(path) => PersistenceError::NotFound(path.display().to_string()),
        other => PersistenceError::Storage(other.to_string()),
    }
}
