//! Variable resolution module
//!
//! Provides parsing and resolution of `{{variable}}` syntax in strings.
//!
//! # Usage
//!
//! ```
//! use relay_application::variable_resolver::substitute;
//! use relay_domain::Variables;
//!
//! let mut vars = Variables::new();
//! vars.insert("host".to_string(), "api.example.com".to_string());
//!
//! assert_eq!(substitute("https://{{host}}/a", &vars), "https://api.example.com/a");
//! assert_eq!(substitute("{{missing}}", &vars), "{{missing}}");
//! ```

pub mod engine;
pub mod parser;

pub use engine::{ResolutionResult, ResolvedVariable, VariableResolver, substitute, substitute_value};
pub use parser::{VariableReference, extract_variable_names, has_variables, parse_variables};
