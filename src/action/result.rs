//! Execution results
//!
//! One [`ExecutionResult`] is produced per `execute()` call. It is created
//! empty, filled by the executor and result collector, and read-only to
//! callers afterwards.

#![allow(clippy::must_use_candidate)]

use crate::engine::StepMetrics;
use crate::pipeline::RunStatus;
use crate::rows::RowSet;

/// Collected outcome of one execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Final lifecycle status
    pub status: RunStatus,

    /// Numeric result code (0 = success, non-zero = failure)
    pub result_code: i32,

    /// Positional arguments that were attached to the run, in order
    pub arguments: Vec<String>,

    /// Output rows of the monitored step, if one was configured
    pub output_rows: Option<RowSet>,

    /// Error rows of the monitored step, if one was configured
    pub error_rows: Option<RowSet>,

    /// Full execution log text
    pub log: String,

    /// Per-step row counters
    pub step_metrics: Vec<StepMetrics>,

    /// True if the engine failed to initialize from the definition
    pub init_failed: bool,

    /// True if the engine failed to prepare the execution plan
    pub prepare_failed: bool,

    /// Wall-clock duration of the run
    pub duration: chrono::Duration,
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self {
            status: RunStatus::NotStarted,
            result_code: 0,
            arguments: Vec::new(),
            output_rows: None,
            error_rows: None,
            log: String::new(),
            step_metrics: Vec::new(),
            init_failed: false,
            prepare_failed: false,
            duration: chrono::Duration::zero(),
        }
    }
}

impl ExecutionResult {
    /// Returns true if the run finished without errors
    pub fn is_success(&self) -> bool {
        self.status.is_success() && self.result_code == 0
    }

    /// Returns the number of output rows of the monitored step
    pub fn output_row_count(&self) -> usize {
        self.output_rows.as_ref().map_or(0, RowSet::row_count)
    }

    /// Returns the number of error rows of the monitored step
    pub fn error_row_count(&self) -> usize {
        self.error_rows.as_ref().map_or(0, RowSet::row_count)
    }

    /// Returns the counters recorded for a step, if present
    pub fn metrics_for(&self, step: &str) -> Option<&StepMetrics> {
        self.step_metrics.iter().find(|m| m.step == step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_result() {
        let result = ExecutionResult::default();
        assert_eq!(result.status, RunStatus::NotStarted);
        assert_eq!(result.result_code, 0);
        assert!(!result.is_success());
        assert_eq!(result.output_row_count(), 0);
        assert_eq!(result.error_row_count(), 0);
    }

    #[test]
    fn test_success_result() {
        let result = ExecutionResult {
            status: RunStatus::Finished,
            ..ExecutionResult::default()
        };
        assert!(result.is_success());
    }

    #[test]
    fn test_metrics_lookup() {
        let result = ExecutionResult {
            step_metrics: vec![StepMetrics {
                step: "Output".to_string(),
                rows_read: 1,
                rows_written: 1,
                ..StepMetrics::default()
            }],
            ..ExecutionResult::default()
        };
        assert_eq!(result.metrics_for("Output").unwrap().rows_written, 1);
        assert!(result.metrics_for("Absent").is_none());
    }
}
