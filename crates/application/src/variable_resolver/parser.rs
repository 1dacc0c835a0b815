//! Variable parser for {{variable}} syntax
//!
//! Parses strings to extract variable references with their positions.

use std::ops::Range;

/// Represents a parsed variable reference in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    /// The variable name (without {{ }}), trimmed.
    pub name: String,

    /// Byte range in the original string covering the whole placeholder.
    pub span: Range<usize>,
}

impl VariableReference {
    /// Creates a new variable reference.
    #[must_use]
    pub fn new(name: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// Parses a string and extracts all variable references.
///
/// A placeholder is `{{`, one or more characters other than `}`, then `}}`.
/// Matches never overlap and each one ends at the first `}}` after its
/// opening braces. Placeholders whose name is blank are skipped.
///
/// # Examples
///
/// ```
/// use relay_application::variable_resolver::parser::parse_variables;
///
/// let refs = parse_variables("Hello {{name}}, your ID is {{ user_id }}");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[0].name, "name");
/// assert_eq!(refs[1].name, "user_id");
/// ```
#[must_use]
pub fn parse_variables(input: &str) -> Vec<VariableReference> {
    let mut references = Vec::new();
    let mut pos = 0;

    while let Some(offset) = input[pos..].find("{{") {
        let start = pos + offset;
        let name_start = start + 2;
        let rest = &input[name_start..];
        let name_len = rest.find('}').unwrap_or(rest.len());

        if name_len > 0 && rest[name_len..].starts_with("}}") {
            let end = name_start + name_len + 2;
            let name = rest[..name_len].trim();
            if !name.is_empty() {
                references.push(VariableReference::new(name, start..end));
            }
            pos = end;
        } else {
            // Not a placeholder here; retry from the next brace.
            pos = start + 1;
        }
    }

    references
}

/// Returns true if the input string contains any variable references.
#[must_use]
pub fn has_variables(input: &str) -> bool {
    !parse_variables(input).is_empty()
}

/// Extracts just the variable names from the input without full parsing info.
#[must_use]
pub fn extract_variable_names(input: &str) -> Vec<String> {
    parse_variables(input)
        .into_iter()
        .map(|r| r.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_variable() {
        let refs = parse_variables("{{name}}");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "name");
        assert_eq!(refs[0].span, 0..8);
    }

    #[test]
    fn test_parse_multiple_variables() {
        let refs = parse_variables("{{base_url}}/api/{{version}}/users/{{id}}");
        let names: Vec<_> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["base_url", "version", "id"]);
    }

    #[test]
    fn test_parse_with_whitespace() {
        let refs = parse_variables("{{ name }}");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "name");
    }

    #[test]
    fn test_no_variables() {
        assert!(parse_variables("Hello, World!").is_empty());
    }

    #[test]
    fn test_unclosed_variable() {
        assert!(parse_variables("{{name").is_empty());
    }

    #[test]
    fn test_empty_and_blank_variables() {
        assert!(parse_variables("{{}}").is_empty());
        assert!(parse_variables("{{   }}").is_empty());
    }

    #[test]
    fn test_adjacent_variables() {
        let refs = parse_variables("{{a}}{{b}}{{c}}");
        let names: Vec<_> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_single_brace() {
        assert!(parse_variables("{name}").is_empty());
    }

    #[test]
    fn test_shortest_span_wins() {
        // The first `}}` closes the placeholder.
        let input = "{{a}}b}}";
        let refs = parse_variables(input);
        assert_eq!(refs.len(), 1);
        assert_eq!(&input[refs[0].span.clone()], "{{a}}");
    }

    #[test]
    fn test_extra_opening_brace_belongs_to_name() {
        let refs = parse_variables("{{{x}}");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "{x");
        assert_eq!(refs[0].span, 0..6);
    }

    #[test]
    fn test_lone_closing_brace_breaks_placeholder() {
        assert!(parse_variables("{{a}b}}").is_empty());
        let refs = parse_variables("{{a}b}} {{c}}");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "c");
    }

    #[test]
    fn test_variable_in_json() {
        let refs = parse_variables(r#"{"name": "{{user_name}}", "id": "{{id}}"}"#);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "user_name");
    }

    #[test]
    fn test_has_variables() {
        assert!(has_variables("Hello {{name}}!"));
        assert!(!has_variables("Hello World!"));
        assert!(!has_variables("{{incomplete"));
        assert!(!has_variables("incomplete}}"));
    }

    #[test]
    fn test_extract_variable_names() {
        let names = extract_variable_names("{{a}} and {{b}} and {{c}}");
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_span_positions_with_multibyte_text() {
        let input = "héllo {{name}}, welcome!";
        let refs = parse_variables(input);
        assert_eq!(&input[refs[0].span.clone()], "{{name}}");
    }
}
