//! Collection item types: folders, requests and the polymorphic `Item`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::{HttpMethod, KeyValueList, RequestBody};
use crate::workspace::fallback_timestamp;

/// Opaque handle returned by a persistence backend for a stored item.
///
/// Only the backend that produced a locator knows what it means. Callers
/// pass it back unchanged for updates and deletes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// Wraps a backend-specific handle.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the locator, returning the raw handle.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Locator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The closed set of item kinds. Ordering puts folders before requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A container.
    Folder,
    /// A leaf holding an HTTP request definition.
    Request,
}

/// A folder grouping requests and other folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parent folder id, `None` for root items.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Display-only flag; the tree structure never depends on it.
    #[serde(default)]
    pub collapsed: bool,
    /// Creation time.
    #[serde(default = "fallback_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    #[serde(default = "fallback_timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Where the backend stored this folder, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<Locator>,
}

impl Folder {
    /// Creates a root folder.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            collapsed: false,
            created_at: now,
            updated_at: now,
            locator: None,
        }
    }

    /// Places the folder under `parent_id`.
    #[must_use]
    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// A saved HTTP request definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parent folder id, `None` for root items.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// HTTP method.
    #[serde(default)]
    pub method: HttpMethod,
    /// URL template, may contain `{{variables}}`.
    #[serde(default)]
    pub url: String,
    /// Ordered header entries.
    #[serde(default)]
    pub headers: KeyValueList,
    /// Ordered query parameter entries.
    #[serde(default)]
    pub params: KeyValueList,
    /// Request body.
    #[serde(default)]
    pub body: RequestBody,
    /// Creation time.
    #[serde(default = "fallback_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    #[serde(default = "fallback_timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Where the backend stored this request, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<Locator>,
}

impl Request {
    /// Creates a root `GET` request with an empty URL and no body.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            method: HttpMethod::Get,
            url: String::new(),
            headers: KeyValueList::new(),
            params: KeyValueList::new(),
            body: RequestBody::none(),
            created_at: now,
            updated_at: now,
            locator: None,
        }
    }

    /// Sets the method.
    #[must_use]
    pub const fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the URL template.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Places the request under `parent_id`.
    #[must_use]
    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

/// Partial update for a [`Request`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPatch {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    /// New URL template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Replacement header list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<KeyValueList>,
    /// Replacement parameter list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<KeyValueList>,
    /// Replacement body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

impl RequestPatch {
    /// Returns true when the patch would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.method.is_none()
            && self.url.is_none()
            && self.headers.is_none()
            && self.params.is_none()
            && self.body.is_none()
    }

    /// Merges the patch into `request` and re-stamps `updated_at`.
    ///
    /// Identity, parent link, creation time and locator never change.
    pub fn apply(self, request: &mut Request, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            request.name = name;
        }
        if let Some(method) = self.method {
            request.method = method;
        }
        if let Some(url) = self.url {
            request.url = url;
        }
        if let Some(headers) = self.headers {
            request.headers = headers;
        }
        if let Some(params) = self.params {
            request.params = params;
        }
        if let Some(body) = self.body {
            request.body = body;
        }
        request.updated_at = now;
    }
}

/// A node of a workspace's collection: either a folder or a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Item {
    /// A folder.
    Folder(Folder),
    /// A request.
    Request(Request),
}

impl Item {
    /// Returns the item id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Folder(f) => &f.id,
            Self::Request(r) => &r.id,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(f) => &f.name,
            Self::Request(r) => &r.name,
        }
    }

    /// Returns the parent folder id.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Folder(f) => f.parent_id.as_deref(),
            Self::Request(r) => r.parent_id.as_deref(),
        }
    }

    /// Returns the kind of this item.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Folder(_) => ItemKind::Folder,
            Self::Request(_) => ItemKind::Request,
        }
    }

    /// Returns true for folders.
    #[must_use]
    pub const fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    /// Returns the backend locator, if the item was persisted.
    #[must_use]
    pub const fn locator(&self) -> Option<&Locator> {
        match self {
            Self::Folder(f) => f.locator.as_ref(),
            Self::Request(r) => r.locator.as_ref(),
        }
    }

    /// Records where the backend stored the item.
    pub fn set_locator(&mut self, locator: Locator) {
        match self {
            Self::Folder(f) => f.locator = Some(locator),
            Self::Request(r) => r.locator = Some(locator),
        }
    }

    /// Returns the folder, if this is one.
    #[must_use]
    pub const fn as_folder(&self) -> Option<&Folder> {
        match self {
            Self::Folder(f) => Some(f),
            Self::Request(_) => None,
        }
    }

    /// Returns the request, if this is one.
    #[must_use]
    pub const fn as_request(&self) -> Option<&Request> {
        match self {
            Self::Request(r) => Some(r),
            Self::Folder(_) => None,
        }
    }

    /// Mutable access to the request, if this is one.
    pub const fn as_request_mut(&mut self) -> Option<&mut Request> {
        match self {
            Self::Request(r) => Some(r),
            Self::Folder(_) => None,
        }
    }

    /// Mutable access to the folder, if this is one.
    pub const fn as_folder_mut(&mut self) -> Option<&mut Folder> {
        match self {
            Self::Folder(f) => Some(f),
            Self::Request(_) => None,
        }
    }
}

impl From<Folder> for Item {
    fn from(folder: Folder) -> Self {
        Self::Folder(folder)
    }
}

impl From<Request> for Item {
    fn from(request: Request) -> Self {
        Self::Request(request)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::request::{BodyType, KeyValue};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_new_request_defaults() {
        let req = Request::new("r1", "List users", at(0));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "");
        assert!(req.headers.is_empty());
        assert!(req.params.is_empty());
        assert_eq!(req.body.body_type, BodyType::None);
        assert_eq!(req.body.content, "");
        assert_eq!(req.parent_id, None);
    }

    #[test]
    fn test_kind_ordering() {
        assert!(ItemKind::Folder < ItemKind::Request);
    }

    #[test]
    fn test_patch_merges_and_restamps() {
        let mut req = Request::new("r1", "Old", at(0)).with_url("https://a");
        req.locator = Some(Locator::new("ws/old.json"));

        let patch = RequestPatch {
            name: Some("New".to_string()),
            headers: Some(KeyValueList::new().with(KeyValue::new("Accept", "*/*"))),
            ..RequestPatch::default()
        };
        patch.apply(&mut req, at(50));

        assert_eq!(req.name, "New");
        assert_eq!(req.url, "https://a");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.created_at, at(0));
        assert_eq!(req.updated_at, at(50));
        assert_eq!(req.locator, Some(Locator::new("ws/old.json")));
    }

    #[test]
    fn test_item_serializes_with_type_tag() {
        let item = Item::from(Folder::new("f1", "Users", at(0)).with_parent(Some("f0".into())));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "folder");
        assert_eq!(json["parentId"], "f0");
        assert!(json.get("locator").is_none());

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_item_accessors() {
        let mut item = Item::from(Request::new("r1", "Ping", at(0)));
        assert_eq!(item.id(), "r1");
        assert_eq!(item.kind(), ItemKind::Request);
        assert!(item.as_folder().is_none());
        assert!(item.locator().is_none());

        item.set_locator(Locator::from("item/ws/r1"));
        assert_eq!(item.locator().map(Locator::as_str), Some("item/ws/r1"));
    }
}
