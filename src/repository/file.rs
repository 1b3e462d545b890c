//! Filesystem-backed artifact repository
//!
//! Stores definitions as YAML (`.yaml`/`.yml`) or JSON (`.json`) files under
//! a base directory. The (directory, name) pair of a lookup is normalized
//! with [`artifact_key`](super::artifact_key), so `("/etl", "orders.yaml")`
//! and `("/", "/etl/orders.yaml")` denote the same file.

use super::{ArtifactRepository, RepositoryError, artifact_key};
use crate::pipeline::{Job, Transformation};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Repository identifier that [`FileRepository`] answers to
pub const FILE_REPOSITORY_ID: &str = "file";

/// Artifact repository backed by a directory tree of definition files
#[derive(Debug, Clone)]
pub struct FileRepository {
    base_dir: PathBuf,
}

impl FileRepository {
    /// Creates a repository rooted at the given base directory
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Returns the base directory
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, directory: &str, name: &str) -> PathBuf {
        self.base_dir.join(artifact_key(directory, name))
    }

    fn load<T: DeserializeOwned>(
        &self,
        directory: &str,
        name: &str,
    ) -> Result<T, RepositoryError> {
        let path = self.resolve(directory, name);
        if !path.is_file() {
            return Err(RepositoryError::NotFound {
                directory: directory.to_string(),
                name: name.to_string(),
            });
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| RepositoryError::Io(e.to_string()))?;

        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
            _ => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|reason| RepositoryError::InvalidDefinition {
            name: name.to_string(),
            reason,
        })
    }
}

impl ArtifactRepository for FileRepository {
    fn id(&self) -> &str {
        FILE_REPOSITORY_ID
    }

    fn exists(&self, directory: &str, name: &str) -> bool {
        self.resolve(directory, name).is_file()
    }

    fn load_transformation(
        &self,
        directory: &str,
        name: &str,
    ) -> Result<Transformation, RepositoryError> {
        tracing::debug!(directory, name, "Loading transformation definition");
        self.load(directory, name)
    }

    fn load_job(&self, directory: &str, name: &str) -> Result<Job, RepositoryError> {
        tracing::debug!(directory, name, "Loading job definition");
        self.load(directory, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    const TRANS_YAML: &str = r"
name: pass-through
steps:
  - name: Injector
    type: injector
    columns: [A]
  - name: Output
    type: output
";

    #[test]
    fn test_exists_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(tmp.path(), "etl/pass.yaml", TRANS_YAML);

        let repo = FileRepository::new(tmp.path());
        assert!(repo.exists("etl", "pass.yaml"));
        assert!(!repo.exists("etl", "absent.yaml"));

        let trans = repo.load_transformation("etl", "pass.yaml").unwrap();
        assert_eq!(trans.name, "pass-through");
        assert_eq!(trans.step_count(), 2);
    }

    #[test]
    fn test_absolute_and_relative_paths_resolve_identically() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(tmp.path(), "etl/pass.yaml", TRANS_YAML);

        let repo = FileRepository::new(tmp.path());
        let relative = repo.load_transformation("etl", "pass.yaml").unwrap();
        let absolute = repo.load_transformation("/", "/etl/pass.yaml").unwrap();
        assert_eq!(relative, absolute);
    }

    #[test]
    fn test_missing_artifact_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(tmp.path());
        let err = repo.load_transformation("/", "missing.yaml").unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_unparseable_artifact_is_invalid_definition() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(tmp.path(), "broken.yaml", "steps: [not, a, definition");

        let repo = FileRepository::new(tmp.path());
        let err = repo.load_transformation("/", "broken.yaml").unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_json_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        write_fixture(
            tmp.path(),
            "pass.json",
            r#"{
              "name": "pass-through",
              "steps": [
                { "name": "Injector", "type": "injector", "columns": ["A"] },
                { "name": "Output", "type": "output" }
              ]
            }"#,
        );

        let repo = FileRepository::new(tmp.path());
        let trans = repo.load_transformation("/", "pass.json").unwrap();
        assert_eq!(trans.name, "pass-through");
    }
}
