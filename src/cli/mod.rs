//! CLI tools for rowline
//!
//! Provides command-line access to the execution adapter:
//! - `run`: execute a transformation or job from a repository
//! - `validate`: pre-flight check of a transformation or job reference
//! - `completions`: generate shell completions

pub mod completions;
pub mod run;
pub mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for rowline
#[derive(Parser, Debug)]
#[command(name = "rowline")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Shared options locating an artifact in a repository
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Base directory of the artifact repository
    #[arg(short, long, default_value = ".")]
    pub base: PathBuf,

    /// Repository directory the artifact lives in
    #[arg(short, long, default_value = "/")]
    pub directory: String,

    /// Transformation to execute
    #[arg(short, long, conflicts_with = "job")]
    pub transformation: Option<String>,

    /// Job to execute
    #[arg(short, long)]
    pub job: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a transformation or job from a repository
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Parameter override as name=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Variable as name=value (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,

        /// Positional arguments as a single quoted string
        #[arg(short, long)]
        args: Option<String>,

        /// Step whose output rows are printed after the run
        #[arg(short, long)]
        monitor: Option<String>,

        /// JSON file with rows to inject
        #[arg(long)]
        inject: Option<PathBuf>,

        /// Step that receives the injected rows
        #[arg(long)]
        injector_step: Option<String>,

        /// Print the full execution log
        #[arg(long)]
        show_log: bool,
    },

    /// Pre-flight check of a transformation or job reference
    Validate {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Run {
            target,
            params,
            vars,
            args,
            monitor,
            inject,
            injector_step,
            show_log,
        } => {
            let options = run::RunOptions {
                params,
                vars,
                args,
                monitor,
                inject,
                injector_step,
                show_log,
            };
            run::run_pipeline(&target, &options)?;
        }
        Command::Validate { target } => {
            validate::validate_pipeline(&target)?;
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum);

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{completions}");
            }
        }
    }

    Ok(())
}
