//! The `validate` subcommand
//!
//! Runs the adapter's pre-flight check without executing anything.

use super::TargetArgs;
use anyhow::{Context, Result};
use rowline::action::PipelineAction;
use rowline::security::SessionContext;

/// Validates a transformation or job reference
pub fn validate_pipeline(target: &TargetArgs) -> Result<()> {
    let mut action = PipelineAction::for_directory(&target.base);
    action.set_directory(&target.directory);

    let name = match (&target.transformation, &target.job) {
        (Some(name), None) => {
            action.set_transformation(name);
            name
        }
        (None, Some(name)) => {
            action.set_job(name);
            name
        }
        _ => anyhow::bail!("exactly one of --transformation or --job must be given"),
    };

    action
        .validate(&SessionContext::system())
        .with_context(|| format!("'{name}' failed validation"))?;

    println!("OK: '{name}' resolves under '{}'", target.directory);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_existing_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("t.yaml"),
            "{ name: t, steps: [ { name: Output, type: output } ] }",
        )
        .unwrap();

        let target = TargetArgs {
            base: tmp.path().to_path_buf(),
            directory: "/".to_string(),
            transformation: Some("t.yaml".to_string()),
            job: None,
        };
        assert!(validate_pipeline(&target).is_ok());
    }

    #[test]
    fn test_validate_missing_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let target = TargetArgs {
            base: tmp.path().to_path_buf(),
            directory: "/".to_string(),
            transformation: Some("absent.yaml".to_string()),
            job: None,
        };
        assert!(validate_pipeline(&target).is_err());
    }

    #[test]
    fn test_validate_requires_exactly_one_target() {
        let target = TargetArgs {
            base: ".".into(),
            directory: "/".to_string(),
            transformation: None,
            job: None,
        };
        assert!(validate_pipeline(&target).is_err());
    }
}
