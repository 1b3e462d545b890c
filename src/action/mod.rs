//! Repository-backed execution adapter
//!
//! [`PipelineAction`] is the surface a host application drives: it points at
//! a transformation or job stored in a repository, carries the caller's
//! overrides (arguments, parameters, variables) and optional row injection,
//! executes the artifact synchronously through an engine, and exposes the
//! collected results afterwards.
//!
//! One adapter instance performs one `execute()` call; each call owns a
//! fresh engine run that is dropped when the call returns. Collaborators
//! (repository, authorization policy, engine factory) are injected at
//! construction and shared read-only.
//!
//! ## Failure contract
//!
//! Configuration, resolution and authorization problems are returned as
//! errors from `validate()`/`execute()` before anything runs. Once the
//! engine lifecycle has begun, the two kinds diverge deliberately:
//!
//! - a **transformation** records initialization and prepare failures in
//!   flags (`is_init_failed`, `is_prepare_execution_failed`); prepare
//!   failures and runtime step failures leave `execute()` returning `Ok`
//!   with a failed status and non-zero result code for the caller to
//!   inspect,
//! - a **job** returns an error for prepare and entry failures as well,
//!   after collecting partial results.
//!
//! Initialization failures are returned as errors for both kinds.

pub mod binder;
pub mod result;

pub use binder::{OverrideSet, bind};
pub use result::ExecutionResult;

use crate::engine::{EngineFactory, StepMetrics, TransformationRun};
use crate::pipeline::{ArtifactKind, PipelineError, PipelineResult, RunStatus};
use crate::repository::ArtifactRepository;
use crate::rows::RowSet;
use crate::security::{AuthorizationPolicy, REPOSITORY_EXECUTE_ACTION, SessionContext};
use std::collections::HashMap;
use std::sync::Arc;

/// Execution adapter for repository-stored transformations and jobs
pub struct PipelineAction {
    repository: Arc<dyn ArtifactRepository>,
    policy: Arc<dyn AuthorizationPolicy>,
    engine: Arc<dyn EngineFactory>,

    repository_id: Option<String>,
    directory: String,
    transformation: Option<String>,
    job: Option<String>,
    overrides: OverrideSet,
    injector_rows: Option<RowSet>,
    injector_step: Option<String>,
    monitor_step: Option<String>,

    result: ExecutionResult,
}

impl PipelineAction {
    /// Creates an adapter with explicit collaborators
    #[must_use]
    pub fn new(
        repository: Arc<dyn ArtifactRepository>,
        policy: Arc<dyn AuthorizationPolicy>,
        engine: Arc<dyn EngineFactory>,
    ) -> Self {
        Self {
            repository,
            policy,
            engine,
            repository_id: None,
            directory: "/".to_string(),
            transformation: None,
            job: None,
            overrides: OverrideSet::new(),
            injector_rows: None,
            injector_step: None,
            monitor_step: None,
            result: ExecutionResult::default(),
        }
    }

    /// Creates an adapter over a filesystem repository rooted at `base_dir`
    ///
    /// Uses the permissive [`AllowAll`](crate::security::AllowAll) policy and
    /// the in-process [`LocalEngine`](crate::engine::LocalEngine).
    #[must_use]
    pub fn for_directory(base_dir: impl Into<std::path::PathBuf>) -> Self {
        let repository: Arc<dyn ArtifactRepository> =
            Arc::new(crate::repository::FileRepository::new(base_dir));
        let engine: Arc<dyn EngineFactory> = Arc::new(
            crate::engine::LocalEngine::with_repository(Arc::clone(&repository)),
        );
        Self::new(repository, Arc::new(crate::security::AllowAll), engine)
    }

    /// Sets the repository identifier the lookup is keyed by
    pub fn set_repository_id(&mut self, id: impl Into<String>) {
        self.repository_id = Some(id.into());
    }

    /// Sets the repository directory the artifact lives in
    pub fn set_directory(&mut self, directory: impl Into<String>) {
        self.directory = directory.into();
    }

    /// Sets the transformation to execute
    pub fn set_transformation(&mut self, name: impl Into<String>) {
        self.transformation = Some(name.into());
    }

    /// Sets the job to execute
    pub fn set_job(&mut self, name: impl Into<String>) {
        self.job = Some(name.into());
    }

    /// Sets the positional arguments, in order
    pub fn set_arguments(&mut self, arguments: Vec<String>) {
        self.overrides.arguments = arguments;
    }

    /// Sets the named parameter overrides
    pub fn set_parameters(&mut self, parameters: HashMap<String, String>) {
        self.overrides.parameters = parameters;
    }

    /// Sets the named variables
    pub fn set_variables(&mut self, variables: HashMap<String, String>) {
        self.overrides.variables = variables;
    }

    /// Sets the rows to inject into the injector step
    pub fn set_injector_rows(&mut self, rows: RowSet) {
        self.injector_rows = Some(rows);
    }

    /// Sets the step that receives injected rows
    pub fn set_injector_step(&mut self, step: impl Into<String>) {
        self.injector_step = Some(step.into());
    }

    /// Sets the step whose output and error rows are collected
    pub fn set_monitor_step(&mut self, step: impl Into<String>) {
        self.monitor_step = Some(step.into());
    }

    /// Returns the kind of artifact configured, if any
    #[must_use]
    pub fn kind(&self) -> Option<ArtifactKind> {
        match (&self.transformation, &self.job) {
            (Some(_), None) => Some(ArtifactKind::Transformation),
            (None, Some(_)) => Some(ArtifactKind::Job),
            _ => None,
        }
    }

    /// Pre-flight contract check
    ///
    /// Verifies that exactly one artifact is configured, that the configured
    /// repository id (if any) matches the injected repository, and that the
    /// artifact resolves. Read-only and idempotent; safe to call before or
    /// instead of [`execute`](Self::execute).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Authorization`] when the session lacks the
    /// execute capability and [`PipelineError::Configuration`] for every
    /// other violation.
    pub fn validate(&self, session: &SessionContext) -> PipelineResult {
        if !self.policy.is_allowed(REPOSITORY_EXECUTE_ACTION) {
            return Err(PipelineError::Authorization {
                action: REPOSITORY_EXECUTE_ACTION.to_string(),
                principal: session.principal.clone(),
            });
        }

        let (kind, name) = match (&self.transformation, &self.job) {
            (None, None) => {
                return Err(PipelineError::Configuration(
                    "neither a transformation nor a job is set".to_string(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(PipelineError::Configuration(
                    "both a transformation and a job are set".to_string(),
                ));
            }
            (Some(name), None) => (ArtifactKind::Transformation, name),
            (None, Some(name)) => (ArtifactKind::Job, name),
        };

        if let Some(id) = &self.repository_id
            && id != self.repository.id()
        {
            return Err(PipelineError::Configuration(format!(
                "unknown repository '{id}'"
            )));
        }

        if !self.repository.exists(&self.directory, name) {
            return Err(PipelineError::Configuration(format!(
                "{kind} '{name}' does not resolve under '{}'",
                self.directory
            )));
        }

        Ok(())
    }

    /// Executes the configured artifact to completion
    ///
    /// Blocks until the run reaches a terminal state, then makes the
    /// collected results available through the getters. See the module
    /// documentation for the failure contract.
    ///
    /// # Errors
    ///
    /// Configuration, resolution, authorization, step lookup and
    /// initialization problems are always returned as errors; prepare and
    /// runtime failures follow the transformation/job asymmetry described
    /// in the module documentation.
    pub fn execute(&mut self, session: &SessionContext) -> PipelineResult {
        self.validate(session)?;
        self.result = ExecutionResult::default();

        let started = std::time::Instant::now();
        let outcome = if let Some(name) = self.transformation.clone() {
            self.execute_transformation(&name)
        } else if let Some(name) = self.job.clone() {
            self.execute_job(&name)
        } else {
            // validate() rejects this configuration
            Err(PipelineError::Configuration(
                "neither a transformation nor a job is set".to_string(),
            ))
        };
        self.result.duration =
            chrono::Duration::milliseconds(i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX));
        outcome
    }

    fn execute_transformation(&mut self, name: &str) -> PipelineResult {
        let definition = self
            .repository
            .load_transformation(&self.directory, name)
            .map_err(PipelineError::from)?;

        for step in [&self.injector_step, &self.monitor_step].into_iter().flatten() {
            if !definition.has_step(step) {
                return Err(PipelineError::StepNotFound {
                    step: step.clone(),
                    definition: definition.name.clone(),
                });
            }
        }

        let context = binder::bind(&definition.parameters, &self.overrides, &self.directory);
        self.result.arguments = context.arguments.clone();

        tracing::info!(
            transformation = %definition.name,
            directory = %self.directory,
            run_id = %context.run_id,
            "Executing transformation"
        );

        let mut run = self.engine.transformation_run(&definition);

        if let Err(e) = run.initialize(&context) {
            self.result.init_failed = true;
            self.result.status = RunStatus::Failed;
            self.result.result_code = 1;
            self.result.log = run.log_text();
            return Err(e);
        }

        if let (Some(step), Some(rows)) = (&self.injector_step, &self.injector_rows) {
            run.inject_rows(step, rows.clone())?;
        }

        if let Err(e) = run.prepare_execution() {
            // Recorded, not thrown: the caller inspects the flag afterwards.
            tracing::warn!(transformation = %definition.name, error = %e, "Prepare execution failed");
            self.result.prepare_failed = true;
            self.result.status = RunStatus::Failed;
            self.result.result_code = 1;
            self.result.log = run.log_text();
            return Ok(());
        }

        run.start()?;
        run.wait_until_finished();
        self.collect_transformation(run.as_ref());
        Ok(())
    }

    fn collect_transformation(&mut self, run: &dyn TransformationRun) {
        self.result.status = run.status();
        self.result.result_code = run.result_code();
        self.result.log = run.log_text();
        self.result.step_metrics = run.step_metrics();
        if let Some(step) = &self.monitor_step {
            self.result.output_rows = run.step_output_rows(step);
            self.result.error_rows = run.step_error_rows(step);
        }
    }

    fn execute_job(&mut self, name: &str) -> PipelineResult {
        let definition = self
            .repository
            .load_job(&self.directory, name)
            .map_err(PipelineError::from)?;

        let context = binder::bind(&definition.parameters, &self.overrides, &self.directory);
        self.result.arguments = context.arguments.clone();

        tracing::info!(
            job = %definition.name,
            directory = %self.directory,
            run_id = %context.run_id,
            "Executing job"
        );

        let mut run = self.engine.job_run(&definition);

        if let Err(e) = run.initialize(&context) {
            self.result.init_failed = true;
            self.result.status = RunStatus::Failed;
            self.result.result_code = 1;
            self.result.log = run.log_text();
            return Err(e);
        }

        if let Err(e) = run.prepare_execution() {
            self.result.prepare_failed = true;
            self.result.status = RunStatus::Failed;
            self.result.result_code = 1;
            self.result.log = run.log_text();
            return Err(e);
        }

        run.start()?;
        run.wait_until_finished();

        self.result.status = run.status();
        self.result.result_code = run.result_code();
        self.result.log = run.log_text();

        if self.result.result_code != 0 {
            return Err(PipelineError::EntryFailed {
                job: definition.name.clone(),
                errors: self.result.result_code,
            });
        }
        Ok(())
    }

    /// Returns the collected result of the last execution
    #[must_use]
    pub fn execution_result(&self) -> &ExecutionResult {
        &self.result
    }

    /// Returns the output rows of the monitored step
    #[must_use]
    pub fn transformation_output_rows(&self) -> Option<&RowSet> {
        self.result.output_rows.as_ref()
    }

    /// Returns the number of output rows of the monitored step
    #[must_use]
    pub fn transformation_output_rows_count(&self) -> usize {
        self.result.output_row_count()
    }

    /// Returns the error rows of the monitored step
    #[must_use]
    pub fn transformation_output_error_rows(&self) -> Option<&RowSet> {
        self.result.error_rows.as_ref()
    }

    /// Returns the number of error rows of the monitored step
    #[must_use]
    pub fn transformation_output_error_rows_count(&self) -> usize {
        self.result.error_row_count()
    }

    /// Returns the full execution log text
    #[must_use]
    pub fn log(&self) -> &str {
        &self.result.log
    }

    /// Returns the numeric result code of the run (0 = success)
    #[must_use]
    pub fn result_code(&self) -> i32 {
        self.result.result_code
    }

    /// Returns the final lifecycle status
    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.result.status
    }

    /// Returns the final status as its display label
    #[must_use]
    pub fn status_label(&self) -> String {
        self.result.status.to_string()
    }

    /// Returns the arguments that were attached to the run, in order
    #[must_use]
    pub fn bound_arguments(&self) -> &[String] {
        &self.result.arguments
    }

    /// Returns per-step row counters of the last run
    #[must_use]
    pub fn step_metrics(&self) -> &[StepMetrics] {
        &self.result.step_metrics
    }

    /// Returns true if engine initialization failed
    #[must_use]
    pub fn is_init_failed(&self) -> bool {
        self.result.init_failed
    }

    /// Returns true if preparing the execution plan failed
    #[must_use]
    pub fn is_prepare_execution_failed(&self) -> bool {
        self.result.prepare_failed
    }
}
