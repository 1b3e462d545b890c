//! Pipeline engine abstraction
//!
//! The execution adapter drives an engine through a fixed lifecycle:
//! `initialize` → (`inject_rows`) → `prepare_execution` → `start` →
//! `wait_until_finished`, then reads results back through accessors. The
//! traits in this module are that contract; [`local::LocalEngine`] is the
//! in-process reference implementation.

pub mod context;
pub mod local;

pub use context::{INTERNAL_DIRECTORY_VARIABLE, RunContext};
pub use local::LocalEngine;

use crate::pipeline::{Job, PipelineError, RunStatus, Transformation};
use crate::rows::RowSet;
use serde::{Deserialize, Serialize};

/// Row counters recorded for one step of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StepMetrics {
    /// Step name
    pub step: String,
    /// Rows read from the upstream step
    pub rows_read: u64,
    /// Rows written to the downstream step
    pub rows_written: u64,
    /// Rows routed to the step's error rows
    pub rows_rejected: u64,
    /// Hard errors raised by the step
    pub errors: u64,
}

/// A live transformation run owned by the adapter for one `execute()` call
#[allow(clippy::missing_errors_doc)]
pub trait TransformationRun: Send {
    /// Initializes the run from its definition and bound context
    fn initialize(&mut self, context: &RunContext) -> Result<(), PipelineError>;

    /// Registers host-supplied rows as the producer output of a step
    ///
    /// Must be called after `initialize` and before `prepare_execution`.
    fn inject_rows(&mut self, step: &str, rows: RowSet) -> Result<(), PipelineError>;

    /// Builds the execution plan (buffers, counters, row channels)
    fn prepare_execution(&mut self) -> Result<(), PipelineError>;

    /// Starts the run
    fn start(&mut self) -> Result<(), PipelineError>;

    /// Blocks until the run reaches a terminal state
    fn wait_until_finished(&mut self);

    /// Returns the current lifecycle status
    fn status(&self) -> RunStatus;

    /// Returns the numeric result code (0 = success)
    fn result_code(&self) -> i32;

    /// Returns the full execution log text
    fn log_text(&self) -> String;

    /// Returns the positional arguments attached to the run
    fn arguments(&self) -> &[String];

    /// Returns the output rows buffered by a step, if it exists
    fn step_output_rows(&self, step: &str) -> Option<RowSet>;

    /// Returns the error rows buffered by a step, if it exists
    fn step_error_rows(&self, step: &str) -> Option<RowSet>;

    /// Returns per-step row counters
    fn step_metrics(&self) -> Vec<StepMetrics>;
}

/// A live job run owned by the adapter for one `execute()` call
#[allow(clippy::missing_errors_doc)]
pub trait JobRun: Send {
    /// Initializes the run from its definition and bound context
    fn initialize(&mut self, context: &RunContext) -> Result<(), PipelineError>;

    /// Verifies the job's entries can be executed
    fn prepare_execution(&mut self) -> Result<(), PipelineError>;

    /// Starts the run
    fn start(&mut self) -> Result<(), PipelineError>;

    /// Blocks until the run reaches a terminal state
    fn wait_until_finished(&mut self);

    /// Returns the current lifecycle status
    fn status(&self) -> RunStatus;

    /// Returns the numeric result code (0 = success)
    fn result_code(&self) -> i32;

    /// Returns the full execution log text
    fn log_text(&self) -> String;

    /// Returns the positional arguments attached to the run
    fn arguments(&self) -> &[String];
}

/// Factory constructing engine runs from parsed definitions
pub trait EngineFactory: Send + Sync {
    /// Creates a run for a transformation definition
    fn transformation_run(&self, definition: &Transformation) -> Box<dyn TransformationRun>;

    /// Creates a run for a job definition
    fn job_run(&self, definition: &Job) -> Box<dyn JobRun>;
}
