//! The `run` subcommand
//!
//! Configures a [`PipelineAction`] from command-line options, executes it
//! and prints the outcome: status, result code, per-step counters and, when
//! a monitor step was given, the collected output rows.

use super::TargetArgs;
use anyhow::{Context, Result};
use rowline::action::PipelineAction;
use rowline::engine::context::cell_to_string;
use rowline::rows::RowSet;
use rowline::security::SessionContext;
use std::collections::HashMap;
use std::path::Path;

/// Options of the `run` subcommand
#[derive(Debug, Default)]
pub struct RunOptions {
    /// Parameter overrides as `name=value` pairs
    pub params: Vec<String>,
    /// Variables as `name=value` pairs
    pub vars: Vec<String>,
    /// Positional arguments as one quoted string
    pub args: Option<String>,
    /// Step whose output rows are printed after the run
    pub monitor: Option<String>,
    /// JSON file with rows to inject
    pub inject: Option<std::path::PathBuf>,
    /// Step that receives the injected rows
    pub injector_step: Option<String>,
    /// Print the full execution log
    pub show_log: bool,
}

/// Executes a transformation or job and prints the outcome
pub fn run_pipeline(target: &TargetArgs, options: &RunOptions) -> Result<()> {
    let mut action = PipelineAction::for_directory(&target.base);
    action.set_directory(&target.directory);

    match (&target.transformation, &target.job) {
        (Some(name), None) => action.set_transformation(name),
        (None, Some(name)) => action.set_job(name),
        _ => anyhow::bail!("exactly one of --transformation or --job must be given"),
    }

    action.set_parameters(parse_pairs(&options.params).context("invalid --param")?);
    action.set_variables(parse_pairs(&options.vars).context("invalid --var")?);

    if let Some(args) = &options.args {
        let arguments = shell_words::split(args).context("invalid --args")?;
        action.set_arguments(arguments);
    }

    if let Some(step) = &options.monitor {
        action.set_monitor_step(step);
    }
    if let Some(path) = &options.inject {
        let rows = read_rows(path)?;
        action.set_injector_rows(rows);
    }
    if let Some(step) = &options.injector_step {
        action.set_injector_step(step);
    }

    let outcome = action.execute(&SessionContext::system());

    if options.show_log || outcome.is_err() {
        print!("{}", action.log());
    }

    for metrics in action.step_metrics() {
        println!(
            "{}: R={} W={} E={}",
            metrics.step, metrics.rows_read, metrics.rows_written, metrics.errors
        );
    }

    if let Some(rows) = action.transformation_output_rows() {
        print_rows(rows);
    }

    println!(
        "Status: {} (result code {})",
        action.status_label(),
        action.result_code()
    );

    outcome.with_context(|| "execution failed".to_string())?;
    if action.is_prepare_execution_failed() {
        anyhow::bail!("prepare execution failed; see the log above");
    }
    if action.result_code() != 0 {
        anyhow::bail!("execution finished with result code {}", action.result_code());
    }
    Ok(())
}

/// Reads a row set from a JSON file
fn read_rows(path: &Path) -> Result<RowSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read rows file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("cannot parse rows file {}", path.display()))
}

/// Parses repeated `name=value` pairs into a map
fn parse_pairs(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("'{pair}' is not a name=value pair"))?;
        map.insert(name.to_string(), value.to_string());
    }
    Ok(map)
}

/// Prints a row set as pipe-separated lines
fn print_rows(rows: &RowSet) {
    println!("{}", rows.columns().join("|"));
    for row in rows.iter() {
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();
        println!("{}", cells.join("|"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let pairs = vec!["param2=12".to_string(), "name=John Doe".to_string()];
        let map = parse_pairs(&pairs).unwrap();
        assert_eq!(map.get("param2").unwrap(), "12");
        assert_eq!(map.get("name").unwrap(), "John Doe");
    }

    #[test]
    fn test_parse_pairs_rejects_bare_name() {
        assert!(parse_pairs(&["no-equals".to_string()]).is_err());
    }

    #[test]
    fn test_run_transformation_from_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("gen.yaml"),
            r"
name: generate-rows
parameters:
  - name: rowCount
    default: '2'
steps:
  - name: Generate rows
    type: generator
    rows: '${rowCount}'
    columns:
      - { name: label, value: 'hello' }
  - name: Output
    type: output
",
        )
        .unwrap();

        let target = TargetArgs {
            base: tmp.path().to_path_buf(),
            directory: "/".to_string(),
            transformation: Some("gen.yaml".to_string()),
            job: None,
        };
        let options = RunOptions {
            params: vec!["rowCount=3".to_string()],
            monitor: Some("Output".to_string()),
            ..RunOptions::default()
        };

        run_pipeline(&target, &options).unwrap();
    }

    #[test]
    fn test_run_missing_artifact_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let target = TargetArgs {
            base: tmp.path().to_path_buf(),
            directory: "/".to_string(),
            transformation: Some("absent.yaml".to_string()),
            job: None,
        };
        assert!(run_pipeline(&target, &RunOptions::default()).is_err());
    }
}
