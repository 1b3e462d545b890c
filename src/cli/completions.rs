//! The `completions` subcommand
//!
//! Generates shell completion scripts for the rowline CLI.

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;
use std::path::Path;

/// Generates a completion script for the given shell
#[must_use]
pub fn generate_completions(shell: Shell) -> String {
    let mut command = super::Args::command();
    let mut buffer = Vec::new();
    clap_complete::generate(shell, &mut command, "rowline", &mut buffer);
    String::from_utf8_lossy(&buffer).to_string()
}

/// Writes a completion script to a file
pub fn save_completions(completions: &str, path: &Path) -> Result<()> {
    std::fs::write(path, completions)
        .with_context(|| format!("cannot write completions to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_bash_completions() {
        let completions = generate_completions(Shell::Bash);
        assert!(completions.contains("rowline"));
    }

    #[test]
    fn test_save_completions() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rowline.bash");
        save_completions("# completions", &path).unwrap();
        assert!(path.is_file());
    }
}
