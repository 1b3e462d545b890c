//! Error types for the pipeline domain

use thiserror::Error;

/// Errors that can occur while validating, resolving or executing
/// a transformation or job
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Adapter configuration is incomplete or inconsistent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested artifact does not exist in the repository
    #[error("Artifact '{name}' not found under '{directory}'")]
    ArtifactNotFound {
        /// Directory the lookup was performed in.
        directory: String,
        /// Name of the missing artifact.
        name: String,
    },

    /// The stored artifact could not be parsed into a definition
    #[error("Invalid definition '{name}': {reason}")]
    InvalidDefinition {
        /// Name of the artifact that failed to parse.
        name: String,
        /// Reason reported by the parser.
        reason: String,
    },

    /// An injector or monitor step name does not exist in the definition
    #[error("Step '{step}' not found in '{definition}'")]
    StepNotFound {
        /// Name of the missing step.
        step: String,
        /// Name of the definition that was searched.
        definition: String,
    },

    /// The current session lacks a required capability
    #[error("Action '{action}' is not permitted for principal '{principal}'")]
    Authorization {
        /// Capability that was denied.
        action: String,
        /// Principal the denial applies to.
        principal: String,
    },

    /// The engine failed to initialize from the definition
    #[error("Initialization of '{definition}' failed: {reason}")]
    Initialization {
        /// Name of the definition being initialized.
        definition: String,
        /// Reason reported by the engine.
        reason: String,
    },

    /// The engine failed to prepare the execution plan
    #[error("Prepare execution of '{definition}' failed: {reason}")]
    PrepareExecution {
        /// Name of the definition being prepared.
        definition: String,
        /// Reason reported by the engine.
        reason: String,
    },

    /// A transformation step failed at runtime
    #[error("Step '{step}' failed: {reason}")]
    StepFailed {
        /// Name of the failing step.
        step: String,
        /// Error message describing the failure.
        reason: String,
    },

    /// A job entry failed at runtime
    #[error("Job '{job}' failed with {errors} error(s)")]
    EntryFailed {
        /// Name of the failing job.
        job: String,
        /// Number of errors accumulated by the run.
        errors: i32,
    },

    /// Definition-level validation failed
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Validation errors for definitions and adapter settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name cannot be empty
    #[error("Name cannot be empty")]
    EmptyName,

    /// Transformation must have at least one step
    #[error("Transformation '{name}' must have at least one step")]
    EmptyTransformation {
        /// Name of the empty transformation.
        name: String,
    },

    /// Job must have at least one entry
    #[error("Job '{name}' must have at least one entry")]
    EmptyJob {
        /// Name of the empty job.
        name: String,
    },

    /// Step or entry names must be unique within a definition
    #[error("Duplicate name '{name}' in '{definition}'")]
    DuplicateName {
        /// The duplicated step or entry name.
        name: String,
        /// Name of the definition containing the duplicate.
        definition: String,
    },

    /// Parameter declarations must have valid names
    #[error("Invalid parameter name: '{name}'")]
    InvalidParameterName {
        /// The invalid name.
        name: String,
    },

    /// An injector step must declare at least one column
    #[error("Injector step '{step}' must declare at least one column")]
    EmptyInjectorColumns {
        /// Name of the offending injector step.
        step: String,
    },
}
