//! In-memory artifact repository
//!
//! Holds parsed definitions keyed by their normalized repository path.
//! Useful for hosts that build definitions programmatically and for tests.

use super::{ArtifactRepository, RepositoryError, artifact_key};
use crate::pipeline::{Job, Transformation};
use std::collections::HashMap;

/// Repository identifier that [`MemoryRepository`] answers to
pub const MEMORY_REPOSITORY_ID: &str = "memory";

/// Artifact repository holding definitions in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    transformations: HashMap<String, Transformation>,
    jobs: HashMap<String, Job>,
}

impl MemoryRepository {
    /// Creates an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a transformation under a directory and name, builder style
    #[must_use]
    pub fn with_transformation(
        mut self,
        directory: &str,
        name: &str,
        definition: Transformation,
    ) -> Self {
        self.insert_transformation(directory, name, definition);
        self
    }

    /// Stores a job under a directory and name, builder style
    #[must_use]
    pub fn with_job(mut self, directory: &str, name: &str, definition: Job) -> Self {
        self.insert_job(directory, name, definition);
        self
    }

    /// Stores a transformation under a directory and name
    pub fn insert_transformation(
        &mut self,
        directory: &str,
        name: &str,
        definition: Transformation,
    ) {
        self.transformations
            .insert(artifact_key(directory, name), definition);
    }

    /// Stores a job under a directory and name
    pub fn insert_job(&mut self, directory: &str, name: &str, definition: Job) {
        self.jobs.insert(artifact_key(directory, name), definition);
    }
}

impl ArtifactRepository for MemoryRepository {
    fn id(&self) -> &str {
        MEMORY_REPOSITORY_ID
    }

    fn exists(&self, directory: &str, name: &str) -> bool {
        let key = artifact_key(directory, name);
        self.transformations.contains_key(&key) || self.jobs.contains_key(&key)
    }

    fn load_transformation(
        &self,
        directory: &str,
        name: &str,
    ) -> Result<Transformation, RepositoryError> {
        self.transformations
            .get(&artifact_key(directory, name))
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                directory: directory.to_string(),
                name: name.to_string(),
            })
    }

    fn load_job(&self, directory: &str, name: &str) -> Result<Job, RepositoryError> {
        self.jobs
            .get(&artifact_key(directory, name))
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                directory: directory.to_string(),
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Step;

    fn sample() -> Transformation {
        Transformation::new(
            "pass-through",
            vec![
                Step::injector("Injector", vec!["A".to_string()]),
                Step::output("Output"),
            ],
        )
    }

    #[test]
    fn test_memory_repository_lookup() {
        let repo = MemoryRepository::new().with_transformation("etl", "pass.yaml", sample());

        assert!(repo.exists("etl", "pass.yaml"));
        assert!(repo.exists("/", "/etl/pass.yaml"));
        assert!(!repo.exists("etl", "other.yaml"));

        let trans = repo.load_transformation("/", "/etl/pass.yaml").unwrap();
        assert_eq!(trans.name, "pass-through");
    }

    #[test]
    fn test_memory_repository_missing() {
        let repo = MemoryRepository::new();
        let err = repo.load_job("/", "missing.yaml").unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
