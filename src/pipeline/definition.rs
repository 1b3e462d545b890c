//! Transformation and job definitions
//!
//! Definitions are the artifacts stored in a repository. A transformation is
//! a row pipeline of [`Step`]s; a job is an orchestration of [`Entry`]s with
//! sequential control flow. Both may declare parameters with default values
//! that the host can override at execution time.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use crate::pipeline::entries::Entry;
use crate::pipeline::errors::ValidationError;
use crate::pipeline::steps::{Step, StepType};
use crate::pipeline::types::Validate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of artifact an execution request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A row pipeline of steps
    Transformation,
    /// An orchestration of entries
    Job,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transformation => write!(f, "transformation"),
            Self::Job => write!(f, "job"),
        }
    }
}

/// A parameter declared by a definition
///
/// Only declared parameters can be overridden by the host; an override for
/// an undeclared name is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Parameter name
    pub name: String,

    /// Default value used when the host supplies no override
    #[serde(rename = "default", skip_serializing_if = "Option::is_none", default)]
    pub default_value: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Collection of declared parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Parameters(pub Vec<ParameterDef>);

impl Parameters {
    /// Creates a new empty parameters collection
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a parameter declaration
    pub fn push(&mut self, param: ParameterDef) {
        self.0.push(param);
    }

    /// Adds a declaration with a default value, builder style
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, default_value: impl Into<String>) -> Self {
        self.0.push(ParameterDef {
            name: name.into(),
            default_value: Some(default_value.into()),
            description: String::new(),
        });
        self
    }

    /// Gets a declaration by name
    pub fn get(&self, name: &str) -> Option<&ParameterDef> {
        self.0.iter().find(|p| p.name == name)
    }

    /// Returns true if a parameter with this name is declared
    pub fn declares(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns an iterator over all declarations
    pub fn iter(&self) -> impl Iterator<Item = &ParameterDef> {
        self.0.iter()
    }

    /// Returns the number of declarations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no declarations
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Validate for Parameters {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        let mut names = HashSet::new();
        for param in &self.0 {
            let valid = !param.name.is_empty()
                && param
                    .name
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.');
            if !valid {
                return Err(ValidationError::InvalidParameterName {
                    name: param.name.clone(),
                });
            }
            if !names.insert(param.name.as_str()) {
                return Err(ValidationError::DuplicateName {
                    name: param.name.clone(),
                    definition: "parameters".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A transformation definition: a row pipeline of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
    /// Transformation name
    pub name: String,

    /// Declared parameters with defaults
    #[serde(default)]
    pub parameters: Parameters,

    /// Steps in pipeline order; rows flow from the first to the last
    pub steps: Vec<Step>,
}

impl Transformation {
    /// Creates a new transformation
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            parameters: Parameters::new(),
            steps,
        }
    }

    /// Sets the declared parameters, builder style
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Gets a step by name
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Returns true if a step with this name exists
    pub fn has_step(&self, name: &str) -> bool {
        self.step(name).is_some()
    }

    /// Returns the number of steps
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl Validate for Transformation {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.steps.is_empty() {
            return Err(ValidationError::EmptyTransformation {
                name: self.name.clone(),
            });
        }
        let mut names = HashSet::new();
        for step in &self.steps {
            if !names.insert(step.name.as_str()) {
                return Err(ValidationError::DuplicateName {
                    name: step.name.clone(),
                    definition: self.name.clone(),
                });
            }
            if let StepType::Injector { columns } = &step.step_type
                && columns.is_empty()
            {
                return Err(ValidationError::EmptyInjectorColumns {
                    step: step.name.clone(),
                });
            }
        }
        self.parameters.validate()
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transformation({}): {} steps", self.name, self.steps.len())
    }
}

/// A job definition: an orchestration of entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job name
    pub name: String,

    /// Declared parameters with defaults
    #[serde(default)]
    pub parameters: Parameters,

    /// Entries in execution order
    pub entries: Vec<Entry>,
}

impl Job {
    /// Creates a new job
    pub fn new(name: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            name: name.into(),
            parameters: Parameters::new(),
            entries,
        }
    }

    /// Sets the declared parameters, builder style
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Gets an entry by name
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Returns the number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl Validate for Job {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.entries.is_empty() {
            return Err(ValidationError::EmptyJob {
                name: self.name.clone(),
            });
        }
        let mut names = HashSet::new();
        for entry in &self.entries {
            if !names.insert(entry.name.as_str()) {
                return Err(ValidationError::DuplicateName {
                    name: entry.name.clone(),
                    definition: self.name.clone(),
                });
            }
        }
        self.parameters.validate()
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({}): {} entries", self.name, self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::steps::{FilterCondition, MismatchAction};

    fn sample_transformation() -> Transformation {
        Transformation::new(
            "filter-regions",
            vec![
                Step::injector("Injector", vec!["REGION".to_string()]),
                Step::filter(
                    "Filter rows",
                    vec![FilterCondition {
                        column: "REGION".to_string(),
                        value: "Central".to_string(),
                    }],
                    MismatchAction::Drop,
                ),
                Step::output("Output"),
            ],
        )
    }

    #[test]
    fn test_transformation_validate_ok() {
        assert!(sample_transformation().validate().is_ok());
    }

    #[test]
    fn test_transformation_validate_empty_steps() {
        let trans = Transformation::new("empty", vec![]);
        assert!(matches!(
            trans.validate(),
            Err(ValidationError::EmptyTransformation { .. })
        ));
    }

    #[test]
    fn test_transformation_validate_duplicate_step() {
        let trans = Transformation::new(
            "dup",
            vec![Step::output("Output"), Step::output("Output")],
        );
        assert!(matches!(
            trans.validate(),
            Err(ValidationError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_transformation_has_step() {
        let trans = sample_transformation();
        assert!(trans.has_step("Filter rows"));
        assert!(!trans.has_step("Absent"));
    }

    #[test]
    fn test_parameters_declares() {
        let params = Parameters::new().with("param1", "param1DefaultValue");
        assert!(params.declares("param1"));
        assert!(!params.declares("param2"));
        assert_eq!(
            params.get("param1").unwrap().default_value.as_deref(),
            Some("param1DefaultValue")
        );
    }

    #[test]
    fn test_parameters_validate_duplicate() {
        let params = Parameters::new().with("p", "1").with("p", "2");
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_job_validate() {
        let job = Job::new("nightly", vec![Entry::log("start", "starting")]);
        assert!(job.validate().is_ok());

        let empty = Job::new("empty", vec![]);
        assert!(matches!(empty.validate(), Err(ValidationError::EmptyJob { .. })));
    }

    #[test]
    fn test_transformation_from_yaml() {
        let yaml = r"
name: generate-rows
parameters:
  - name: param1
    default: param1DefaultValue
  - name: param2
    default: '2'
steps:
  - name: Generate rows
    type: generator
    rows: '${param2}'
    columns:
      - { name: param1, value: '${param1}' }
  - name: Output
    type: output
";
        let trans: Transformation = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(trans.name, "generate-rows");
        assert_eq!(trans.parameters.len(), 2);
        assert_eq!(trans.step_count(), 2);
        assert!(trans.validate().is_ok());
    }
}
