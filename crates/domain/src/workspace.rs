//! Workspace: a named container with its own variable table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{DEFAULT_WORKSPACE_ID, is_default_workspace};

/// Variable table of a workspace. Ordered for deterministic serialization.
pub type Variables = BTreeMap<String, String>;

/// A workspace and its metadata record.
///
/// The same shape is used in memory and in every persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Stable identifier. `"default"` is reserved.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Flat `{{name}}` substitution table.
    #[serde(default)]
    pub variables: Variables,
    /// Creation time.
    #[serde(default = "fallback_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    #[serde(default = "fallback_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Timestamp used when a stored record lacks one.
pub(crate) fn fallback_timestamp() -> DateTime<Utc> {
    Utc::now()
}

impl Workspace {
    /// Display name of the seeded default workspace.
    pub const DEFAULT_NAME: &'static str = "My Workspace";

    /// Creates a workspace with an empty variable table.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            variables: Variables::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the protected default workspace.
    #[must_use]
    pub fn default_workspace(now: DateTime<Utc>) -> Self {
        Self::new(
            DEFAULT_WORKSPACE_ID,
            Self::DEFAULT_NAME,
            "Default workspace",
            now,
        )
    }

    /// Replaces the variable table.
    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Returns true for the workspace that can never be deleted.
    #[must_use]
    pub fn is_default(&self) -> bool {
        is_default_workspace(&self.id)
    }

    /// Looks up a variable.
    #[must_use]
    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Sets a variable and re-stamps `updated_at`.
    pub fn set_variable(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.variables.insert(key.into(), value.into());
        self.updated_at = now;
    }

    /// Removes a variable, re-stamping `updated_at` when something was removed.
    pub fn remove_variable(&mut self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let removed = self.variables.remove(key);
        if removed.is_some() {
            self.updated_at = now;
        }
        removed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn default_workspace_is_protected() {
        let ws = Workspace::default_workspace(at(0));
        assert_eq!(ws.id, "default");
        assert_eq!(ws.name, "My Workspace");
        assert!(ws.is_default());
        assert!(!Workspace::new("ws-1", "Other", "", at(0)).is_default());
    }

    #[test]
    fn set_variable_restamps() {
        let mut ws = Workspace::new("ws-1", "API", "", at(10));
        ws.set_variable("host", "localhost", at(20));
        assert_eq!(ws.variable("host"), Some("localhost"));
        assert_eq!(ws.created_at, at(10));
        assert_eq!(ws.updated_at, at(20));
    }

    #[test]
    fn remove_missing_variable_keeps_timestamp() {
        let mut ws = Workspace::new("ws-1", "API", "", at(10));
        assert_eq!(ws.remove_variable("nope", at(30)), None);
        assert_eq!(ws.updated_at, at(10));
    }

    #[test]
    fn record_uses_camel_case() {
        let ws = Workspace::new("ws-1", "API", "d", at(0));
        let json = serde_json::to_value(&ws).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["variables"], serde_json::json!({}));
    }

    #[test]
    fn minimal_record_deserializes() {
        let ws: Workspace = serde_json::from_str(r#"{"id":"x","name":"X"}"#).unwrap();
        assert_eq!(ws.description, "");
        assert!(ws.variables.is_empty());
    }
}
