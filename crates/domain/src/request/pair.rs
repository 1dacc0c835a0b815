//! Key/value entries used for both headers and query parameters.

use serde::{Deserialize, Serialize};

/// A single `{key, value, enabled}` entry.
///
/// Entries can be switched off without being deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// The header name or parameter key
    #[serde(default)]
    pub key: String,
    /// The value, possibly containing `{{variables}}`
    #[serde(default)]
    pub value: String,
    /// Whether this entry is sent
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl KeyValue {
    /// Creates a new enabled entry.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Creates a new disabled entry.
    #[must_use]
    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: false,
        }
    }

    /// Returns true if this entry takes part in a send: enabled and keyed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.key.trim().is_empty()
    }
}

/// An ordered list of entries. Order is preserved on save and on send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValueList {
    items: Vec<KeyValue>,
}

impl KeyValueList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Appends an entry.
    pub fn add(&mut self, entry: KeyValue) {
        self.items.push(entry);
    }

    /// Appends an entry, builder style.
    #[must_use]
    pub fn with(mut self, entry: KeyValue) -> Self {
        self.items.push(entry);
        self
    }

    /// Returns an iterator over entries that are enabled and have a key.
    pub fn active(&self) -> impl Iterator<Item = &KeyValue> {
        self.items.iter().filter(|e| e.is_active())
    }

    /// Returns all entries (enabled and disabled).
    #[must_use]
    pub fn all(&self) -> &[KeyValue] {
        &self.items
    }

    /// Case-insensitive lookup among active entries.
    #[must_use]
    pub fn contains_active_key(&self, key: &str) -> bool {
        self.active().any(|e| e.key.trim().eq_ignore_ascii_case(key))
    }

    /// Returns the number of entries.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len is not const in stable
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty is not const in stable
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<KeyValue> for KeyValueList {
    fn from_iter<T: IntoIterator<Item = KeyValue>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = KeyValue::new("Accept", "application/json");
        assert_eq!(entry.key, "Accept");
        assert!(entry.enabled);
        assert!(!KeyValue::disabled("X-Debug", "1").enabled);
    }

    #[test]
    fn test_active_skips_disabled_and_blank_keys() {
        let list = KeyValueList::new()
            .with(KeyValue::new("page", "1"))
            .with(KeyValue::disabled("debug", "true"))
            .with(KeyValue::new("   ", "orphan"))
            .with(KeyValue::new("limit", "10"));

        let keys: Vec<_> = list.active().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["page", "limit"]);
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_contains_active_key_is_case_insensitive() {
        let list = KeyValueList::new()
            .with(KeyValue::new("content-type", "text/plain"))
            .with(KeyValue::disabled("Authorization", "x"));
        assert!(list.contains_active_key("Content-Type"));
        assert!(!list.contains_active_key("authorization"));
    }

    #[test]
    fn test_enabled_defaults_to_true() {
        let entry: KeyValue = serde_json::from_str(r#"{"key":"a","value":"b"}"#).unwrap();
        assert!(entry.enabled);
    }
}
