//! Variable resolution engine
//!
//! Substitutes `{{variable}}` references from a workspace's variable table.
//! Unknown names are left in place, verbatim.

use relay_domain::{Variables, Workspace};
use serde_json::Value;

use super::parser::parse_variables;

/// A variable that was substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariable {
    /// Variable name.
    pub name: String,
    /// Substituted value.
    pub value: String,
}

/// Result of variable resolution for a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    /// The input with every known placeholder substituted.
    pub resolved: String,

    /// Variables that were successfully resolved, in order of appearance.
    pub resolved_variables: Vec<ResolvedVariable>,

    /// Variable names that could not be resolved.
    pub unresolved: Vec<String>,

    /// Whether all variables were successfully resolved.
    pub is_complete: bool,
}

impl ResolutionResult {
    /// Creates a result for input with no variables.
    #[must_use]
    pub fn no_variables(input: &str) -> Self {
        Self {
            resolved: input.to_string(),
            resolved_variables: Vec::new(),
            unresolved: Vec::new(),
            is_complete: true,
        }
    }

    /// Returns the count of resolved variables.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.resolved_variables.len()
    }

    /// Returns the count of unresolved variables.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }
}

/// Resolves `{{variable}}` references against one variable table.
#[derive(Debug, Clone, Copy)]
pub struct VariableResolver<'a> {
    variables: &'a Variables,
}

impl<'a> VariableResolver<'a> {
    /// Creates a resolver over `variables`.
    #[must_use]
    pub const fn new(variables: &'a Variables) -> Self {
        Self { variables }
    }

    /// Creates a resolver over a workspace's variables.
    #[must_use]
    pub const fn for_workspace(workspace: &'a Workspace) -> Self {
        Self::new(&workspace.variables)
    }

    /// Resolves all variables in the input string.
    #[must_use]
    pub fn resolve(&self, input: &str) -> ResolutionResult {
        let references = parse_variables(input);

        if references.is_empty() {
            return ResolutionResult::no_variables(input);
        }

        let mut resolved_vars = Vec::new();
        let mut unresolved = Vec::new();
        let mut result = String::with_capacity(input.len());
        let mut last_end = 0;

        for var_ref in &references {
            result.push_str(&input[last_end..var_ref.span.start]);

            if let Some(value) = self.variables.get(&var_ref.name) {
                result.push_str(value);
                resolved_vars.push(ResolvedVariable {
                    name: var_ref.name.clone(),
                    value: value.clone(),
                });
            } else {
                result.push_str(&input[var_ref.span.clone()]);
                unresolved.push(var_ref.name.clone());
            }

            last_end = var_ref.span.end;
        }

        result.push_str(&input[last_end..]);

        let is_complete = unresolved.is_empty();
        ResolutionResult {
            resolved: result,
            resolved_variables: resolved_vars,
            unresolved,
            is_complete,
        }
    }

    /// Checks which variables in the input would be unresolved.
    /// Useful for validation before sending a request.
    #[must_use]
    pub fn find_unresolved(&self, input: &str) -> Vec<String> {
        parse_variables(input)
            .into_iter()
            .filter(|r| !self.variables.contains_key(&r.name))
            .map(|r| r.name)
            .collect()
    }

    /// Returns the substituted string only.
    #[must_use]
    pub fn substitute(&self, input: &str) -> String {
        self.resolve(input).resolved
    }
}

/// Substitutes every known `{{name}}` in `text`; unknown placeholders stay.
#[must_use]
pub fn substitute(text: &str, variables: &Variables) -> String {
    VariableResolver::new(variables).substitute(text)
}

/// Substitutes a JSON value: strings are resolved, every other value is
/// returned unchanged.
#[must_use]
pub fn substitute_value(value: &Value, variables: &Variables) -> Value {
    match value {
        Value::String(text) => Value::String(substitute(text, variables)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_substitution_correctness() {
        let variables = vars(&[("host", "api.example.com"), ("v", "1")]);
        assert_eq!(
            substitute("https://{{host}}/a?b={{v}}", &variables),
            "https://api.example.com/a?b=1"
        );
    }

    #[test]
    fn test_unresolved_placeholder_preserved() {
        let variables = vars(&[("other", "x")]);
        assert_eq!(substitute("{{missing}}", &variables), "{{missing}}");
    }

    #[test]
    fn test_no_match_is_identity() {
        let empty = Variables::new();
        for text in [
            "{{x}}",
            "a {{x}} b {{ y }}",
            "{{x}}{{x}}",
            "{{a}b}}",
            "{{{x}}}",
            "plain",
            "",
        ] {
            assert_eq!(substitute(text, &empty), text);
        }
    }

    #[test]
    fn test_name_is_trimmed_but_unresolved_kept_verbatim() {
        let variables = vars(&[("token", "abc")]);
        assert_eq!(
            substitute("Bearer {{ token }} {{ nope }}", &variables),
            "Bearer abc {{ nope }}"
        );
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let variables = vars(&[("a", "{{b}}"), ("b", "x")]);
        assert_eq!(substitute("{{a}}", &variables), "{{b}}");
    }

    #[test]
    fn test_resolution_result_reports_both_sides() {
        let variables = vars(&[("base_url", "http://localhost:3000")]);
        let result = VariableResolver::new(&variables).resolve("{{base_url}}/{{unknown}}/users");
        assert_eq!(result.resolved, "http://localhost:3000/{{unknown}}/users");
        assert!(!result.is_complete);
        assert_eq!(result.resolved_count(), 1);
        assert_eq!(result.unresolved, vec!["unknown"]);
    }

    #[test]
    fn test_find_unresolved() {
        let variables = vars(&[("base_url", "x")]);
        let resolver = VariableResolver::new(&variables);
        assert_eq!(
            resolver.find_unresolved("{{base_url}}/{{unknown}}/{{$uuid}}"),
            vec!["unknown", "$uuid"]
        );
    }

    #[test]
    fn test_for_workspace() {
        let mut workspace = Workspace::default_workspace(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
        workspace
            .variables
            .insert("env".to_string(), "prod".to_string());
        let resolver = VariableResolver::for_workspace(&workspace);
        assert_eq!(resolver.substitute("{{env}}"), "prod");
    }

    #[test]
    fn test_substitute_value_only_touches_strings() {
        let variables = vars(&[("x", "1")]);
        assert_eq!(substitute_value(&json!("{{x}}"), &variables), json!("1"));
        assert_eq!(substitute_value(&json!(42), &variables), json!(42));
        assert_eq!(substitute_value(&json!(null), &variables), json!(null));
        assert_eq!(
            substitute_value(&json!({"k": "{{x}}"}), &variables),
            json!({"k": "{{x}}"})
        );
    }
}
