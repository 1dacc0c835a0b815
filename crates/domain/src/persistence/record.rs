//! Folder and request records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collection::{Folder, Locator, Request};
use crate::request::{HttpMethod, KeyValueList, RequestBody};
use crate::workspace::fallback_timestamp;

/// Current record schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

/// Folder metadata (`folder.json` in the disk layout).
///
/// Fields are ordered alphabetically for deterministic serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    /// Creation time.
    #[serde(default = "fallback_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Folder id. Falls back to the storage name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Folder name. Falls back to the storage name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Schema version for migration support.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Last modification time.
    #[serde(default = "fallback_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl FolderRecord {
    /// Builds the record for a folder.
    #[must_use]
    pub fn from_folder(folder: &Folder) -> Self {
        Self {
            created_at: folder.created_at,
            id: Some(folder.id.clone()),
            name: Some(folder.name.clone()),
            schema_version: CURRENT_SCHEMA_VERSION,
            updated_at: folder.updated_at,
        }
    }

    /// Rebuilds the folder, filling a missing id or name from `storage_name`.
    #[must_use]
    pub fn into_folder(
        self,
        storage_name: &str,
        parent_id: Option<String>,
        locator: Locator,
    ) -> Folder {
        Folder {
            id: self.id.unwrap_or_else(|| storage_name.to_string()),
            name: self.name.unwrap_or_else(|| storage_name.to_string()),
            parent_id,
            collapsed: false,
            created_at: self.created_at,
            updated_at: self.updated_at,
            locator: Some(locator),
        }
    }
}

/// Request record (`<name>.json` in the disk layout).
///
/// Fields are ordered alphabetically for deterministic serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    /// Request body.
    #[serde(default)]
    pub body: RequestBody,
    /// Creation time.
    #[serde(default = "fallback_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Header entries.
    #[serde(default)]
    pub headers: KeyValueList,
    /// Request id. Falls back to the storage name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// HTTP method.
    #[serde(default)]
    pub method: HttpMethod,
    /// Request name. Falls back to the storage name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Query parameter entries.
    #[serde(default)]
    pub params: KeyValueList,
    /// Schema version for migration support.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Last modification time.
    #[serde(default = "fallback_timestamp")]
    pub updated_at: DateTime<Utc>,
    /// URL template.
    #[serde(default)]
    pub url: String,
}

impl RequestRecord {
    /// Builds the record for a request.
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        Self {
            body: request.body.clone(),
            created_at: request.created_at,
            headers: request.headers.clone(),
            id: Some(request.id.clone()),
            method: request.method,
            name: Some(request.name.clone()),
            params: request.params.clone(),
            schema_version: CURRENT_SCHEMA_VERSION,
            updated_at: request.updated_at,
            url: request.url.clone(),
        }
    }

    /// Rebuilds the request, filling a missing id or name from `storage_name`.
    #[must_use]
    pub fn into_request(
        self,
        storage_name: &str,
        parent_id: Option<String>,
        locator: Locator,
    ) -> Request {
        Request {
            id: self.id.unwrap_or_else(|| storage_name.to_string()),
            name: self.name.unwrap_or_else(|| storage_name.to_string()),
            parent_id,
            method: self.method,
            url: self.url,
            headers: self.headers,
            params: self.params,
            body: self.body,
            created_at: self.created_at,
            updated_at: self.updated_at,
            locator: Some(locator),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_record_round_trip() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let request = Request::new("r1", "Get user", now)
            .with_method(HttpMethod::Post)
            .with_url("{{host}}/users")
            .with_body(RequestBody::json("{}"))
            .with_parent(Some("f1".to_string()));

        let record = RequestRecord::from_request(&request);
        let json = serde_json::to_string(&record).unwrap();
        let back: RequestRecord = serde_json::from_str(&json).unwrap();
        let rebuilt = back.into_request(
            "get-user",
            Some("f1".to_string()),
            Locator::new("ws/f/get-user.json"),
        );

        assert_eq!(rebuilt.id, "r1");
        assert_eq!(rebuilt.name, "Get user");
        assert_eq!(rebuilt.url, "{{host}}/users");
        assert_eq!(rebuilt.body, RequestBody::json("{}"));
        assert_eq!(rebuilt.locator, Some(Locator::new("ws/f/get-user.json")));
    }

    #[test]
    fn test_missing_id_and_name_fall_back_to_storage_name() {
        let record: RequestRecord =
            serde_json::from_str(r#"{"method":"DELETE","url":"https://x"}"#).unwrap();
        let request = record.into_request("remove-user", None, Locator::new("remove-user.json"));
        assert_eq!(request.id, "remove-user");
        assert_eq!(request.name, "remove-user");
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.parent_id, None);
    }

    #[test]
    fn test_folder_record_fallbacks() {
        let record: FolderRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.schema_version, CURRENT_SCHEMA_VERSION);
        let folder = record.into_folder("users", Some("p".into()), Locator::new("ws/users"));
        assert_eq!(folder.id, "users");
        assert_eq!(folder.name, "users");
        assert_eq!(folder.parent_id.as_deref(), Some("p"));
    }

    #[test]
    fn test_record_fields_are_camel_case() {
        let now = Utc.timestamp_opt(0, 0).unwrap();
        let folder = Folder::new("f1", "Users", now);
        let json = serde_json::to_value(FolderRecord::from_folder(&folder)).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("schemaVersion").is_some());
    }
}
