//! rowline - command-line runner for repository-stored ETL pipelines
//!
//! A thin CLI over the rowline execution adapter.
//!
//! ## Commands
//!
//! - `rowline run` - Execute a transformation or job from a repository
//! - `rowline validate` - Pre-flight check of a transformation or job
//! - `rowline completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Validate a transformation reference
//! rowline validate --base ./repo --transformation etl/orders.yaml
//!
//! # Execute it with a parameter override and show the monitored rows
//! rowline run --base ./repo --transformation etl/orders.yaml \
//!     --param batchSize=500 --monitor Output
//!
//! # Execute a job
//! rowline run --base ./repo --job etl/nightly.yaml
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    // Initialize tracing for debugging
    if std::env::var("ROWLINE_DEBUG").is_ok() {
        rowline::init_logging("debug");
    }

    // Run the CLI
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if std::env::var("ROWLINE_VERBOSE").is_ok() {
                eprintln!("{:?}", e);
            }
            ExitCode::FAILURE
        }
    }
}
