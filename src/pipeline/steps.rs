//! Step types for transformation definitions
//!
//! Steps are the units of work inside a transformation. Rows flow from the
//! first step to the last; each step reads the rows written by its upstream
//! neighbour and writes rows for its downstream neighbour.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of steps available in transformations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepType {
    /// Accepts rows supplied by the host before the run starts
    Injector {
        /// Column names of the injected rows, in order
        columns: Vec<String>,
    },

    /// Generates a fixed number of identical rows
    Generator {
        /// Number of rows to generate; may reference `${name}` values
        rows: String,
        /// Columns of each generated row
        columns: Vec<GeneratedColumn>,
    },

    /// Keeps rows matching all conditions, rejects the rest
    Filter {
        /// Equality conditions that must all hold for a row to pass
        conditions: Vec<FilterCondition>,
        /// What happens to rows that do not match
        #[serde(default)]
        on_mismatch: MismatchAction,
    },

    /// Appends a computed field to each row
    Formula {
        /// Name of the field to append
        field: String,
        /// Template for the field value; may reference row fields and
        /// `${name}` values
        value: String,
    },

    /// Writes a message to the execution log for each row
    Log {
        /// Message template; may reference row fields and `${name}` values
        message: String,
    },

    /// Aborts the transformation when a row arrives
    Abort {
        /// Message recorded in the log when aborting
        #[serde(default)]
        message: String,
    },

    /// Terminal step buffering rows for the host to read back
    Output,
}

/// A column produced by a generator step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedColumn {
    /// Column name
    pub name: String,
    /// Value template; may reference `${name}` values
    pub value: String,
}

/// A single equality condition of a filter step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Column the condition applies to
    pub column: String,
    /// Value the column must equal
    pub value: String,
}

/// What a filter does with rows that fail its conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MismatchAction {
    /// Discard the row silently
    #[default]
    Drop,
    /// Route the row to the step's error rows
    Error,
}

impl StepType {
    /// Creates an injector step type
    pub fn injector(columns: Vec<String>) -> Self {
        Self::Injector { columns }
    }

    /// Creates a generator step type
    pub fn generator(rows: impl Into<String>, columns: Vec<GeneratedColumn>) -> Self {
        Self::Generator {
            rows: rows.into(),
            columns,
        }
    }

    /// Creates a filter step type
    pub fn filter(conditions: Vec<FilterCondition>, on_mismatch: MismatchAction) -> Self {
        Self::Filter {
            conditions,
            on_mismatch,
        }
    }

    /// Creates a formula step type
    pub fn formula(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Formula {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a log step type
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
        }
    }

    /// Creates an abort step type
    pub fn abort(message: impl Into<String>) -> Self {
        Self::Abort {
            message: message.into(),
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Injector { columns } => write!(f, "injector({} columns)", columns.len()),
            Self::Generator { rows, .. } => write!(f, "generator({rows})"),
            Self::Filter { conditions, .. } => write!(f, "filter({} conditions)", conditions.len()),
            Self::Formula { field, .. } => write!(f, "formula({field})"),
            Self::Log { message } => write!(f, "log({message})"),
            Self::Abort { .. } => write!(f, "abort"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// A single named step in a transformation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step name, unique within its transformation
    pub name: String,

    /// Type of step
    #[serde(flatten)]
    pub step_type: StepType,
}

impl Step {
    /// Creates a new step
    pub fn new(name: impl Into<String>, step_type: StepType) -> Self {
        Self {
            name: name.into(),
            step_type,
        }
    }

    /// Creates an injector step
    pub fn injector(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self::new(name, StepType::injector(columns))
    }

    /// Creates a generator step
    pub fn generator(
        name: impl Into<String>,
        rows: impl Into<String>,
        columns: Vec<GeneratedColumn>,
    ) -> Self {
        Self::new(name, StepType::generator(rows, columns))
    }

    /// Creates a filter step
    pub fn filter(
        name: impl Into<String>,
        conditions: Vec<FilterCondition>,
        on_mismatch: MismatchAction,
    ) -> Self {
        Self::new(name, StepType::filter(conditions, on_mismatch))
    }

    /// Creates a formula step
    pub fn formula(
        name: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(name, StepType::formula(field, value))
    }

    /// Creates a log step
    pub fn log(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, StepType::log(message))
    }

    /// Creates an abort step
    pub fn abort(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, StepType::abort(message))
    }

    /// Creates an output step
    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name, StepType::Output)
    }

    /// Returns true if this step accepts externally injected rows
    pub fn accepts_injection(&self) -> bool {
        matches!(self.step_type, StepType::Injector { .. })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step({}): {}", self.name, self.step_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_injector() {
        let step = Step::injector("Injector", vec!["A".to_string(), "B".to_string()]);
        assert!(step.accepts_injection());
        assert_eq!(step.to_string(), "Step(Injector): injector(2 columns)");
    }

    #[test]
    fn test_step_filter() {
        let step = Step::filter(
            "Filter rows",
            vec![FilterCondition {
                column: "REGION".to_string(),
                value: "Central".to_string(),
            }],
            MismatchAction::Drop,
        );
        assert!(!step.accepts_injection());
        assert!(matches!(step.step_type, StepType::Filter { .. }));
    }

    #[test]
    fn test_mismatch_action_default() {
        assert_eq!(MismatchAction::default(), MismatchAction::Drop);
    }

    #[test]
    fn test_step_serde_roundtrip() {
        let yaml = r"
name: Say hello
type: formula
field: GREETING
value: 'Hello, ${POSITIONTITLE}'
";
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.name, "Say hello");
        assert!(matches!(step.step_type, StepType::Formula { .. }));
    }

    #[test]
    fn test_output_step_serde() {
        let step: Step = serde_yaml::from_str("{ name: Output, type: output }").unwrap();
        assert!(matches!(step.step_type, StepType::Output));
    }

    #[test]
    fn test_filter_default_mismatch_from_yaml() {
        let yaml = r"
name: Filter rows
type: filter
conditions:
  - { column: REGION, value: Central }
";
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        match step.step_type {
            StepType::Filter { on_mismatch, .. } => {
                assert_eq!(on_mismatch, MismatchAction::Drop);
            }
            other => panic!("expected filter, got {other}"),
        }
    }
}
