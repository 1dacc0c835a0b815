//! ID generation utilities.

use uuid::Uuid;

/// Identifier of the workspace that always exists and can never be deleted.
pub const DEFAULT_WORKSPACE_ID: &str = "default";

/// Generates a new unique identifier as a string.
///
/// UUID v7 embeds a timestamp, so identifiers are never reused and sort by
/// creation time.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Returns true if `id` names the protected default workspace.
#[must_use]
pub fn is_default_workspace(id: &str) -> bool {
    id == DEFAULT_WORKSPACE_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_format() {
        let id = generate_id();
        // 8-4-4-4-12 = 36 chars
        assert_eq!(id.len(), 36);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_generate_id_uniqueness() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_default_workspace_id() {
        assert!(is_default_workspace("default"));
        assert!(!is_default_workspace("Default"));
        assert!(!is_default_workspace(&generate_id()));
    }
}
