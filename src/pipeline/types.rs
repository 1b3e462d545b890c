//! Core types for the pipeline domain
//!
//! This module contains fundamental types shared by transformations,
//! jobs and the execution adapter.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for adapter operations
pub type PipelineResult<T = ()> = std::result::Result<T, super::errors::PipelineError>;

/// Lifecycle status of a transformation or job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Execution has not been started yet
    NotStarted,
    /// Execution is in progress
    Running,
    /// Execution completed without errors
    Finished,
    /// Execution completed with errors
    Failed,
    /// Execution was aborted before completion
    Halted,
}

impl RunStatus {
    /// Returns true if the run reached a terminal state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Halted)
    }

    /// Returns true if the run finished without errors
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Returns true if the run failed or was halted
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Halted)
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "Not started"),
            Self::Running => write!(f, "Running"),
            Self::Finished => write!(f, "Finished"),
            Self::Failed => write!(f, "Failed"),
            Self::Halted => write!(f, "Halted"),
        }
    }
}

/// Trait for types that can be validated
#[allow(clippy::missing_errors_doc)]
pub trait Validate {
    /// Type of validation error
    type Error;

    /// Validates this type
    fn validate(&self) -> std::result::Result<(), Self::Error>;
}
