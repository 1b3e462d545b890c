//! Artifact repository abstraction
//!
//! A repository resolves a (directory, name) pair to a stored transformation
//! or job definition. The adapter is agnostic to the backing store; this
//! module ships a filesystem-backed implementation ([`FileRepository`]) and
//! an in-memory one ([`MemoryRepository`]) for programmatic hosts and tests.

pub mod file;
pub mod memory;

pub use file::FileRepository;
pub use memory::MemoryRepository;

use crate::pipeline::{Job, PipelineError, Transformation};
use thiserror::Error;

/// Errors raised by repository lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No artifact is stored under the given directory and name
    #[error("Artifact '{name}' not found under '{directory}'")]
    NotFound {
        /// Directory the lookup was performed in.
        directory: String,
        /// Name of the missing artifact.
        name: String,
    },

    /// The stored content could not be parsed into a definition
    #[error("Invalid definition '{name}': {reason}")]
    InvalidDefinition {
        /// Name of the artifact that failed to parse.
        name: String,
        /// Reason reported by the parser.
        reason: String,
    },

    /// The backing store failed to read the artifact
    #[error("IO error: {0}")]
    Io(String),
}

impl From<RepositoryError> for PipelineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { directory, name } => {
                Self::ArtifactNotFound { directory, name }
            }
            RepositoryError::InvalidDefinition { name, reason } => {
                Self::InvalidDefinition { name, reason }
            }
            RepositoryError::Io(reason) => Self::Io(reason),
        }
    }
}

/// Read-only store of transformation and job definitions
#[allow(clippy::missing_errors_doc)]
pub trait ArtifactRepository: Send + Sync {
    /// Returns the identifier this repository answers to
    fn id(&self) -> &str;

    /// Returns true if an artifact exists under the directory and name
    ///
    /// A name starting with `/` is resolved from the repository root,
    /// ignoring the directory; both spellings of the same target resolve
    /// to the same artifact.
    fn exists(&self, directory: &str, name: &str) -> bool;

    /// Loads a transformation definition
    fn load_transformation(
        &self,
        directory: &str,
        name: &str,
    ) -> Result<Transformation, RepositoryError>;

    /// Loads a job definition
    fn load_job(&self, directory: &str, name: &str) -> Result<Job, RepositoryError>;
}

/// Normalizes a (directory, name) pair into a repository-relative key
///
/// A name with a leading `/` denotes an absolute in-repository path and
/// ignores the directory; otherwise the name is joined under the directory.
#[must_use]
pub fn artifact_key(directory: &str, name: &str) -> String {
    if let Some(absolute) = name.strip_prefix('/') {
        return absolute.trim_start_matches('/').to_string();
    }
    let dir = directory.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
