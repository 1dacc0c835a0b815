//! Remote persistence backend speaking the workbench server's REST API.
//!
//! | operation          | route                                   |
//! |--------------------|-----------------------------------------|
//! | list workspaces    | `GET /api/workspaces`                   |
//! | one workspace      | `GET /api/workspaces/:id`               |
//! | create workspace   | `POST /api/workspaces`                  |
//! | update workspace   | `PUT /api/workspaces/:id`               |
//! | delete workspace   | `DELETE /api/workspaces/:id` (1)        |
//! | collections tree   | `GET /api/workspaces/:id/collections`   |
//! | create folder      | `POST /api/workspaces/:id/folders`      |
//! | create request     | `POST /api/workspaces/:id/requests`     |
//! | update request     | `PUT /api/requests/:locator`            |
//! | delete item        | `DELETE /api/items/:locator`            |
//!
//! The server identifies items by the `path` it returns; that path is the
//! locator.
//!
//! (1) The stock workbench server has no workspace delete route. Its 404
//! is reported as [`PersistenceError::NotFound`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_application::ports::{PersistenceAdapter, PersistenceError, PersistenceResult};
use relay_domain::persistence::RequestRecord;
use relay_domain::{
    DEFAULT_WORKSPACE_ID, Folder, HttpMethod, ItemMap, KeyValue, KeyValueList, Locator, Request,
    RequestBody, Variables, Workspace, generate_id, is_default_workspace,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::serialization::from_json_bytes;

/// Talks to a remote workbench server.
#[derive(Debug, Clone)]
pub struct RemoteAdapter {
    client: Client,
    base_url: String,
}

impl RemoteAdapter {
    /// Creates an adapter for the server at `base_url`
    /// (e.g. `http://localhost:3102`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> PersistenceResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("Relay/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates an adapter with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    fn workspace_url(&self, id: &str, suffix: &str) -> String {
        self.url(&format!("/workspaces/{}{suffix}", urlencoding::encode(id)))
    }

    /// Sends a request and fails on any non-success status.
    async fn send(&self, builder: RequestBuilder) -> PersistenceResult<Vec<u8>> {
        let response = builder
            .send()
            .await
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(remote_error(status, &body));
        }
        Ok(body.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> PersistenceResult<T> {
        let body = self.send(builder).await?;
        Ok(from_json_bytes(&body)?)
    }

    async fn create_item(
        &self,
        workspace_id: &str,
        kind: &str,
        payload: &impl Serialize,
    ) -> PersistenceResult<Locator> {
        let url = self.workspace_url(workspace_id, &format!("/{kind}"));
        let created: CreatedItem = self.fetch(self.client.post(url).json(payload)).await?;
        let path = created.path.ok_or_else(|| {
            PersistenceError::Serialization(format!("server returned no path for new {kind}"))
        })?;
        debug!(workspace_id, %path, kind, "item created remotely");
        Ok(Locator::new(path))
    }
}

#[async_trait]
impl PersistenceAdapter for RemoteAdapter {
    async fn load_workspaces(&self) -> PersistenceResult<HashMap<String, Workspace>> {
        let raw: Vec<Value> = self
            .fetch(self.client.get(self.url("/workspaces")))
            .await?;

        let mut workspaces = HashMap::new();
        for value in raw {
            match serde_json::from_value::<Workspace>(value) {
                Ok(workspace) => {
                    workspaces.insert(workspace.id.clone(), workspace);
                }
                Err(error) => warn!(%error, "skipping malformed workspace from server"),
            }
        }
        workspaces
            .entry(DEFAULT_WORKSPACE_ID.to_string())
            .or_insert_with(|| Workspace::default_workspace(Utc::now()));
        Ok(workspaces)
    }

    async fn load_workspace(&self, id: &str) -> PersistenceResult<Option<Workspace>> {
        match self
            .fetch(self.client.get(self.workspace_url(id, "")))
            .await
        {
            Ok(workspace) => Ok(Some(workspace)),
            Err(PersistenceError::Remote { status: 404, .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn create_workspace(
        &self,
        id: &str,
        name: &str,
        description: &str,
        variables: Option<Variables>,
    ) -> PersistenceResult<Workspace> {
        let payload = NewWorkspace {
            id,
            name,
            description,
            variables: variables.unwrap_or_default(),
        };
        self.fetch(self.client.post(self.url("/workspaces")).json(&payload))
            .await
    }

    async fn update_workspace(&self, workspace: &Workspace) -> PersistenceResult<()> {
        self.send(
            self.client
                .put(self.workspace_url(&workspace.id, ""))
                .json(workspace),
        )
        .await?;
        Ok(())
    }

    async fn delete_workspace(&self, id: &str) -> PersistenceResult<()> {
        if is_default_workspace(id) {
            return Err(PersistenceError::DefaultWorkspaceProtected);
        }
        match self.send(self.client.delete(self.workspace_url(id, ""))).await {
            Ok(_) => Ok(()),
            Err(PersistenceError::Remote { status: 404, .. }) => {
                Err(PersistenceError::NotFound(id.to_string()))
            }
            Err(error) => Err(error),
        }
    }

    async fn load_collections(&self, workspace_id: &str) -> PersistenceResult<ItemMap> {
        let tree: Vec<RemoteItem> = self
            .fetch(
                self.client
                    .get(self.workspace_url(workspace_id, "/collections")),
            )
            .await?;

        let mut items = ItemMap::new();
        flatten_into(tree, None, &mut items, Utc::now());
        debug!(workspace_id, count = items.len(), "collections loaded remotely");
        Ok(items)
    }

    async fn create_folder(
        &self,
        workspace_id: &str,
        folder: &Folder,
        parent: Option<&Locator>,
    ) -> PersistenceResult<Locator> {
        let payload = NewFolder {
            id: &folder.id,
            name: &folder.name,
            parent_path: parent.map(Locator::as_str),
        };
        self.create_item(workspace_id, "folders", &payload).await
    }

    async fn create_request(
        &self,
        workspace_id: &str,
        request: &Request,
        parent: Option<&Locator>,
    ) -> PersistenceResult<Locator> {
        let payload = NewRequest {
            record: RequestRecord::from_request(request),
            parent_path: parent.map(Locator::as_str),
        };
        self.create_item(workspace_id, "requests", &payload).await
    }

    async fn update_request(&self, request: &Request) -> PersistenceResult<()> {
        let locator = request
            .locator
            .as_ref()
            .ok_or_else(|| PersistenceError::MissingLocator(request.id.clone()))?;
        let url = self.url(&format!("/requests/{}", urlencoding::encode(locator.as_str())));
        self.send(
            self.client
                .put(url)
                .json(&RequestRecord::from_request(request)),
        )
        .await?;
        Ok(())
    }

    async fn delete_item(&self, locator: &Locator) -> PersistenceResult<()> {
        let url = self.url(&format!("/items/{}", urlencoding::encode(locator.as_str())));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct NewWorkspace<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    variables: Variables,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewFolder<'a> {
    id: &'a str,
    name: &'a str,
    parent_path: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewRequest<'a> {
    #[serde(flatten)]
    record: RequestRecord,
    parent_path: Option<&'a str>,
}

#[derive(Deserialize)]
struct CreatedItem {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// One node of the server's nested collections tree.
///
/// The server is loose about shapes: headers and params may be objects or
/// entry arrays, and a body may be a plain string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RemoteItem {
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    method: Option<String>,
    url: Option<String>,
    headers: Value,
    params: Value,
    body: Value,
    path: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    children: Vec<Self>,
}

impl RemoteItem {
    fn is_folder(&self) -> bool {
        self.kind.as_deref() == Some("folder") || !self.children.is_empty()
    }
}

/// Flattens the nested tree into `items`, turning nesting into `parent_id`
/// links.
fn flatten_into(
    nodes: Vec<RemoteItem>,
    parent_id: Option<&str>,
    items: &mut ItemMap,
    now: DateTime<Utc>,
) {
    for mut node in nodes {
        let id = node
            .id
            .take()
            .or_else(|| node.path.clone())
            .unwrap_or_else(generate_id);
        let name = node.name.take().unwrap_or_else(|| id.clone());
        let created_at = node.created_at.unwrap_or(now);
        let updated_at = node.updated_at.unwrap_or(created_at);
        let locator = node.path.take().map(Locator::new);
        let parent = parent_id.map(String::from);

        if node.is_folder() {
            let children = std::mem::take(&mut node.children);
            let mut folder = Folder::new(id.clone(), name, created_at).with_parent(parent);
            folder.updated_at = updated_at;
            folder.locator = locator;
            items.insert(folder.into());
            flatten_into(children, Some(&id), items, now);
        } else {
            let mut request = Request::new(id, name, created_at)
                .with_parent(parent)
                .with_method(
                    node.method
                        .as_deref()
                        .and_then(|m| m.parse().ok())
                        .unwrap_or(HttpMethod::Get),
                )
                .with_url(node.url.unwrap_or_default())
                .with_body(loose_body(node.body));
            request.headers = loose_pairs(node.headers);
            request.params = loose_pairs(node.params);
            request.updated_at = updated_at;
            request.locator = locator;
            items.insert(request.into());
        }
    }
}

/// Accepts `[{key, value, enabled}]` or `{"key": "value"}`.
fn loose_pairs(value: Value) -> KeyValueList {
    match value {
        Value::Array(_) => serde_json::from_value(value).unwrap_or_default(),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| KeyValue::new(key, value_to_text(value)))
            .collect(),
        _ => KeyValueList::new(),
    }
}

/// Accepts `{type, content}` or a bare string.
fn loose_body(value: Value) -> RequestBody {
    match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        Value::String(text) if text.is_empty() => RequestBody::none(),
        Value::String(text) => RequestBody::raw(text),
        _ => RequestBody::none(),
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn remote_error(status: StatusCode, body: &[u8]) -> PersistenceError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
    PersistenceError::Remote {
        status: status.as_u16(),
        message,
    }
}
