//! # Rowline - a synchronous ETL transformation and job runner
//!
//! Rowline executes row-pipeline **transformations** and orchestration
//! **jobs** stored in an artifact repository, synchronously and in-process.
//! The heart of the crate is [`action::PipelineAction`], an execution
//! adapter that resolves a definition from a repository, applies the
//! caller's overrides (positional arguments, named parameters, named
//! variables), optionally injects rows into a running step, drives the
//! engine lifecycle to completion and exposes the collected results: output
//! rows, error rows, row counts, execution log text, status and a numeric
//! result code.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use rowline::action::PipelineAction;
//! use rowline::engine::{EngineFactory, LocalEngine};
//! use rowline::pipeline::{GeneratedColumn, Parameters, Step, Transformation};
//! use rowline::repository::{ArtifactRepository, MemoryRepository};
//! use rowline::security::{AllowAll, SessionContext};
//!
//! let definition = Transformation::new(
//!     "generate-rows",
//!     vec![
//!         Step::generator(
//!             "Generate rows",
//!             "${rowCount}",
//!             vec![GeneratedColumn {
//!                 name: "label".to_string(),
//!                 value: "${label}".to_string(),
//!             }],
//!         ),
//!         Step::output("Output"),
//!     ],
//! )
//! .with_parameters(Parameters::new().with("rowCount", "2"));
//!
//! let repository: Arc<dyn ArtifactRepository> =
//!     Arc::new(MemoryRepository::new().with_transformation("etl", "gen.yaml", definition));
//! let engine: Arc<dyn EngineFactory> =
//!     Arc::new(LocalEngine::with_repository(Arc::clone(&repository)));
//!
//! let mut action = PipelineAction::new(repository, Arc::new(AllowAll), engine);
//! action.set_directory("etl");
//! action.set_transformation("gen.yaml");
//! action.set_parameters(HashMap::from([("rowCount".to_string(), "3".to_string())]));
//! action.set_variables(HashMap::from([("label".to_string(), "hello".to_string())]));
//! action.set_monitor_step("Output");
//!
//! action.execute(&SessionContext::system()).unwrap();
//! assert_eq!(action.transformation_output_rows_count(), 3);
//! ```
//!
//! ## Features
//!
//! - **Repository-backed**: definitions live in a filesystem or in-memory
//!   repository and are addressed by directory and name
//! - **Deterministic overrides**: arguments are attached verbatim,
//!   parameter overrides bind only against declared parameters, variables
//!   are always set
//! - **Row injection and monitoring**: feed rows into an injector step and
//!   read any step's output and error rows back
//! - **Structured results**: per-step row counters next to the raw
//!   execution log
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod action;
pub mod engine;
pub mod infrastructure;
pub mod pipeline;
pub mod repository;
pub mod rows;
pub mod security;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use action::{ExecutionResult, OverrideSet, PipelineAction};
pub use engine::{EngineFactory, JobRun, LocalEngine, RunContext, StepMetrics, TransformationRun};
pub use infrastructure::{Config, init_logging};
pub use pipeline::{
    ArtifactKind, Entry, EntryType, FilterCondition, GeneratedColumn, Job, MismatchAction,
    ParameterDef, Parameters, PipelineError, RunStatus, Step, StepType, Transformation, Validate,
    ValidationError,
};
pub use repository::{ArtifactRepository, FileRepository, MemoryRepository, RepositoryError};
pub use rows::{Row, RowSet};
pub use security::{AllowAll, AuthorizationPolicy, SessionContext};

/// Version of the rowline crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
