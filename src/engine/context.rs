//! Execution context for a single run
//!
//! A [`RunContext`] carries the bound runtime state handed to the engine:
//! positional arguments in caller order, resolved parameter values and named
//! variables. Templates in step configuration reference these values with
//! the `${name}` syntax; dotted names are allowed for built-ins such as
//! [`INTERNAL_DIRECTORY_VARIABLE`].

use crate::pipeline::Parameters;
use crate::rows::Row;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Built-in variable holding the repository directory of the running artifact
pub const INTERNAL_DIRECTORY_VARIABLE: &str = "Internal.Current.Directory";

static NAME_PATTERN: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("name pattern is valid")
});

/// Runtime state bound to one execution
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Identifier of this run
    pub run_id: Uuid,

    /// Positional arguments, verbatim and ordered
    pub arguments: Vec<String>,

    /// Resolved parameter values (declared defaults plus applied overrides)
    pub parameters: HashMap<String, String>,

    /// Named variables
    pub variables: HashMap<String, String>,
}

impl RunContext {
    /// Creates an empty context with a fresh run id
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            arguments: Vec::new(),
            parameters: HashMap::new(),
            variables: HashMap::new(),
        }
    }

    /// Looks up a name, checking parameters before variables
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .or_else(|| self.variables.get(name))
            .map(String::as_str)
    }

    /// Expands `${name}` references against parameters and variables
    ///
    /// Unknown names are left unchanged in the output.
    #[must_use]
    pub fn expand(&self, template: &str) -> String {
        NAME_PATTERN
            .replace_all(template, |caps: &regex::Captures| {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                match self.lookup(name) {
                    Some(value) => value.to_string(),
                    None => caps
                        .get(0)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                }
            })
            .to_string()
    }

    /// Expands `${name}` references, letting row fields shadow context values
    #[must_use]
    pub fn expand_with_row(&self, template: &str, columns: &[String], row: &Row) -> String {
        NAME_PATTERN
            .replace_all(template, |caps: &regex::Captures| {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                if let Some(idx) = columns.iter().position(|c| c == name)
                    && let Some(value) = row.get(idx)
                {
                    return cell_to_string(value);
                }
                match self.lookup(name) {
                    Some(value) => value.to_string(),
                    None => caps
                        .get(0)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                }
            })
            .to_string()
    }

    /// Derives the context for a nested transformation run
    ///
    /// Arguments and variables are inherited unchanged. Parameters start
    /// from the nested definition's own defaults; values from this context
    /// overlay them only where the nested definition declares the name.
    #[must_use]
    pub fn for_nested(&self, declared: &Parameters) -> Self {
        let mut parameters = HashMap::new();
        for param in declared.iter() {
            parameters.insert(
                param.name.clone(),
                param.default_value.clone().unwrap_or_default(),
            );
        }
        for (name, value) in &self.parameters {
            if declared.declares(name) {
                parameters.insert(name.clone(), value.clone());
            }
        }
        Self {
            run_id: Uuid::new_v4(),
            arguments: self.arguments.clone(),
            parameters,
            variables: self.variables.clone(),
        }
    }
}

/// Renders a cell value the way it appears in templates and the log
#[must_use]
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> RunContext {
        let mut ctx = RunContext::new();
        ctx.parameters
            .insert("param1".to_string(), "param1DefaultValue".to_string());
        ctx.variables
            .insert("customVariable".to_string(), "customVariableValue".to_string());
        ctx.variables.insert(
            INTERNAL_DIRECTORY_VARIABLE.to_string(),
            "/etl".to_string(),
        );
        ctx
    }

    #[test]
    fn test_expand_parameter_and_variable() {
        let ctx = context();
        assert_eq!(ctx.expand("${param1}"), "param1DefaultValue");
        assert_eq!(ctx.expand("${customVariable}"), "customVariableValue");
    }

    #[test]
    fn test_expand_dotted_builtin() {
        let ctx = context();
        assert_eq!(ctx.expand("dir=${Internal.Current.Directory}"), "dir=/etl");
    }

    #[test]
    fn test_expand_unknown_left_unchanged() {
        let ctx = context();
        assert_eq!(ctx.expand("${missing}"), "${missing}");
    }

    #[test]
    fn test_expand_with_row_field_shadowing() {
        let mut ctx = context();
        ctx.variables
            .insert("TITLE".to_string(), "from-context".to_string());
        let columns = vec!["TITLE".to_string()];
        let row: Row = vec![json!("from-row")];
        assert_eq!(
            ctx.expand_with_row("Hello, ${TITLE}", &columns, &row),
            "Hello, from-row"
        );
    }

    #[test]
    fn test_for_nested_parameter_passthrough() {
        let mut parent = RunContext::new();
        parent
            .parameters
            .insert("firstName".to_string(), "John".to_string());
        parent
            .parameters
            .insert("unrelated".to_string(), "x".to_string());
        parent
            .variables
            .insert("customVariable".to_string(), "v".to_string());
        parent.arguments.push("dummyArg".to_string());

        let declared = Parameters::new()
            .with("firstName", "nobody")
            .with("lastName", "nobody");
        let nested = parent.for_nested(&declared);

        assert_eq!(nested.parameters.get("firstName").unwrap(), "John");
        assert_eq!(nested.parameters.get("lastName").unwrap(), "nobody");
        assert!(!nested.parameters.contains_key("unrelated"));
        assert_eq!(nested.variables.get("customVariable").unwrap(), "v");
        assert_eq!(nested.arguments, vec!["dummyArg".to_string()]);
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&json!("abc")), "abc");
        assert_eq!(cell_to_string(&json!(12)), "12");
    }
}
