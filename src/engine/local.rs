//! In-process reference engine
//!
//! Runs a transformation with one thread per step, rows flowing between
//! neighbouring steps over channels, the way a production row engine keeps
//! steps busy concurrently. Jobs run their entries sequentially on a worker
//! thread. Every run owns an append-only log buffer; each step writes a
//! `Finished processing (R=…, W=…, E=…)` summary line so the log doubles as
//! a human-readable account of row movement.

use super::context::{INTERNAL_DIRECTORY_VARIABLE, RunContext, cell_to_string};
use super::{EngineFactory, JobRun, StepMetrics, TransformationRun};
use crate::pipeline::{
    Entry, EntryType, Job, PipelineError, RunStatus, StepType, Transformation, Validate,
};
use crate::repository::ArtifactRepository;
use crate::rows::{Row, RowSet};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;

/// Append-only log buffer shared by the step threads of one run
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<String>>);

impl LogBuffer {
    fn new() -> Self {
        Self::default()
    }

    /// Appends a timestamped line
    fn append(&self, line: &str) {
        let stamp = chrono::Local::now().format("%Y/%m/%d %H:%M:%S%.3f");
        let mut guard = self.0.lock();
        guard.push_str(&format!("{stamp} - {line}\n"));
    }

    /// Appends already-formatted text verbatim
    fn append_raw(&self, text: &str) {
        self.0.lock().push_str(text);
    }

    fn text(&self) -> String {
        self.0.lock().clone()
    }
}

/// In-process engine factory
///
/// A repository may be attached so that job entries can resolve the
/// transformations they reference.
#[derive(Clone, Default)]
pub struct LocalEngine {
    repository: Option<Arc<dyn ArtifactRepository>>,
}

impl LocalEngine {
    /// Creates an engine without repository access
    #[must_use]
    pub fn new() -> Self {
        Self { repository: None }
    }

    /// Creates an engine resolving job entries through the given repository
    #[must_use]
    pub fn with_repository(repository: Arc<dyn ArtifactRepository>) -> Self {
        Self {
            repository: Some(repository),
        }
    }
}

impl EngineFactory for LocalEngine {
    fn transformation_run(&self, definition: &Transformation) -> Box<dyn TransformationRun> {
        Box::new(LocalTransformationRun::new(definition.clone()))
    }

    fn job_run(&self, definition: &Job) -> Box<dyn JobRun> {
        Box::new(LocalJobRun::new(definition.clone(), self.repository.clone()))
    }
}

/// Output and error row buffers of one step
#[derive(Clone)]
struct StepBuffers {
    output: Arc<Mutex<RowSet>>,
    errors: Arc<Mutex<RowSet>>,
}

/// Step behaviour resolved against the bound context during prepare
enum PreparedKind {
    /// Injector or generator rows, fully materialized
    Source { rows: Vec<Row> },
    /// Equality checks by column index
    Filter {
        checks: Vec<(usize, String)>,
        reject_to_error: bool,
    },
    /// Field template; `Some(idx)` replaces an existing cell, `None` appends
    Formula {
        template: String,
        field_index: Option<usize>,
    },
    /// Log line template
    Log { template: String },
    /// Abort on the first row
    Abort { message: String },
    /// Terminal buffer
    Output,
}

/// Everything one step thread needs, owned
struct PreparedStep {
    name: String,
    kind: PreparedKind,
    input: Option<mpsc::Receiver<Row>>,
    output: Option<mpsc::Sender<Row>>,
    input_columns: Vec<String>,
    out_buffer: Arc<Mutex<RowSet>>,
    err_buffer: Arc<Mutex<RowSet>>,
    metrics: Arc<Mutex<StepMetrics>>,
    log: LogBuffer,
    halt: Arc<AtomicBool>,
    context: RunContext,
}

/// A transformation run executed on local threads
pub struct LocalTransformationRun {
    definition: Transformation,
    context: RunContext,
    initialized: bool,
    injected: HashMap<String, Vec<Row>>,
    plan: Vec<PreparedStep>,
    prepared: bool,
    buffers: HashMap<String, StepBuffers>,
    metrics: Vec<Arc<Mutex<StepMetrics>>>,
    log: LogBuffer,
    halt: Arc<AtomicBool>,
    handles: Vec<thread::JoinHandle<()>>,
    status: RunStatus,
    errors: i32,
}

impl LocalTransformationRun {
    /// Creates a run for the given definition
    #[must_use]
    pub fn new(definition: Transformation) -> Self {
        Self {
            definition,
            context: RunContext::default(),
            initialized: false,
            injected: HashMap::new(),
            plan: Vec::new(),
            prepared: false,
            buffers: HashMap::new(),
            metrics: Vec::new(),
            log: LogBuffer::new(),
            halt: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
            status: RunStatus::NotStarted,
            errors: 0,
        }
    }

    fn prepare_error(&self, reason: String) -> PipelineError {
        PipelineError::PrepareExecution {
            definition: self.definition.name.clone(),
            reason,
        }
    }

    fn prepare_step(
        &mut self,
        index: usize,
        input_columns: &[String],
    ) -> Result<(PreparedKind, Vec<String>), PipelineError> {
        let step = &self.definition.steps[index];
        match &step.step_type {
            StepType::Injector { columns } => {
                let rows = self.injected.remove(&step.name).unwrap_or_default();
                Ok((PreparedKind::Source { rows }, columns.clone()))
            }
            StepType::Generator { rows, columns } => {
                let count_text = self.context.expand(rows);
                let count: usize = count_text.trim().parse().map_err(|_| {
                    self.prepare_error(format!(
                        "generator step '{}' row count '{}' is not a number",
                        step.name, count_text
                    ))
                })?;
                let row: Row = columns
                    .iter()
                    .map(|c| Value::String(self.context.expand(&c.value)))
                    .collect();
                let names = columns.iter().map(|c| c.name.clone()).collect();
                Ok((
                    PreparedKind::Source {
                        rows: vec![row; count],
                    },
                    names,
                ))
            }
            StepType::Filter {
                conditions,
                on_mismatch,
            } => {
                let mut checks = Vec::with_capacity(conditions.len());
                for condition in conditions {
                    let idx = input_columns
                        .iter()
                        .position(|c| c == &condition.column)
                        .ok_or_else(|| {
                            self.prepare_error(format!(
                                "filter step '{}' references unknown column '{}'",
                                step.name, condition.column
                            ))
                        })?;
                    checks.push((idx, condition.value.clone()));
                }
                Ok((
                    PreparedKind::Filter {
                        checks,
                        reject_to_error: *on_mismatch
                            == crate::pipeline::MismatchAction::Error,
                    },
                    input_columns.to_vec(),
                ))
            }
            StepType::Formula { field, value } => {
                let field_index = input_columns.iter().position(|c| c == field);
                let mut out = input_columns.to_vec();
                if field_index.is_none() {
                    out.push(field.clone());
                }
                Ok((
                    PreparedKind::Formula {
                        template: value.clone(),
                        field_index,
                    },
                    out,
                ))
            }
            StepType::Log { message } => Ok((
                PreparedKind::Log {
                    template: message.clone(),
                },
                input_columns.to_vec(),
            )),
            StepType::Abort { message } => Ok((
                PreparedKind::Abort {
                    message: message.clone(),
                },
                input_columns.to_vec(),
            )),
            StepType::Output => Ok((PreparedKind::Output, input_columns.to_vec())),
        }
    }
}

impl TransformationRun for LocalTransformationRun {
    fn initialize(&mut self, context: &RunContext) -> Result<(), PipelineError> {
        self.definition
            .validate()
            .map_err(|e| PipelineError::Initialization {
                definition: self.definition.name.clone(),
                reason: e.to_string(),
            })?;

        // Rows flow linearly, so only the head of the pipeline may produce them.
        for step in self.definition.steps.iter().skip(1) {
            if matches!(
                step.step_type,
                StepType::Injector { .. } | StepType::Generator { .. }
            ) {
                return Err(PipelineError::Initialization {
                    definition: self.definition.name.clone(),
                    reason: format!("step '{}' must be the first step", step.name),
                });
            }
        }

        self.context = context.clone();
        self.initialized = true;
        self.log.append(&format!(
            "Transformation '{}' - initialized from definition ({} steps)",
            self.definition.name,
            self.definition.step_count()
        ));
        tracing::info!(
            transformation = %self.definition.name,
            run_id = %self.context.run_id,
            steps = self.definition.step_count(),
            "Transformation initialized"
        );
        Ok(())
    }

    fn inject_rows(&mut self, step: &str, rows: RowSet) -> Result<(), PipelineError> {
        if !self.definition.has_step(step) {
            return Err(PipelineError::StepNotFound {
                step: step.to_string(),
                definition: self.definition.name.clone(),
            });
        }
        self.log.append(&format!(
            "{step} - Accepted {} injected rows",
            rows.row_count()
        ));
        self.injected.insert(step.to_string(), rows.into_rows());
        Ok(())
    }

    fn prepare_execution(&mut self) -> Result<(), PipelineError> {
        if !self.initialized {
            return Err(self.prepare_error("run is not initialized".to_string()));
        }

        let step_count = self.definition.steps.len();
        let mut columns: Vec<String> = Vec::new();
        let mut upstream: Option<mpsc::Receiver<Row>> = None;

        for index in 0..step_count {
            let (kind, out_columns) = self.prepare_step(index, &columns)?;
            let name = self.definition.steps[index].name.clone();

            let (sender, receiver) = if index + 1 < step_count {
                let (tx, rx) = mpsc::channel();
                (Some(tx), Some(rx))
            } else {
                (None, None)
            };

            let out_buffer = Arc::new(Mutex::new(RowSet::new(out_columns.clone())));
            let err_buffer = Arc::new(Mutex::new(RowSet::new(columns.clone())));
            let metrics = Arc::new(Mutex::new(StepMetrics {
                step: name.clone(),
                ..StepMetrics::default()
            }));

            self.buffers.insert(
                name.clone(),
                StepBuffers {
                    output: Arc::clone(&out_buffer),
                    errors: Arc::clone(&err_buffer),
                },
            );
            self.metrics.push(Arc::clone(&metrics));
            self.plan.push(PreparedStep {
                name,
                kind,
                input: upstream.take(),
                output: sender,
                input_columns: columns.clone(),
                out_buffer,
                err_buffer,
                metrics,
                log: self.log.clone(),
                halt: Arc::clone(&self.halt),
                context: self.context.clone(),
            });

            upstream = receiver;
            columns = out_columns;
        }

        self.prepared = true;
        self.log.append(&format!(
            "Transformation '{}' - prepared execution plan ({step_count} steps)",
            self.definition.name
        ));
        Ok(())
    }

    fn start(&mut self) -> Result<(), PipelineError> {
        if !self.prepared {
            return Err(self.prepare_error("run is not prepared".to_string()));
        }

        self.status = RunStatus::Running;
        self.log.append(&format!(
            "Transformation '{}' - dispatching {} steps",
            self.definition.name,
            self.plan.len()
        ));
        for prepared in self.plan.drain(..) {
            self.handles.push(thread::spawn(move || run_step(prepared)));
        }
        Ok(())
    }

    fn wait_until_finished(&mut self) {
        if self.status != RunStatus::Running {
            return;
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        let errors: u64 = self.metrics.iter().map(|m| m.lock().errors).sum();
        self.errors = i32::try_from(errors).unwrap_or(i32::MAX);
        self.status = if self.halt.load(Ordering::SeqCst) {
            RunStatus::Halted
        } else if errors > 0 {
            RunStatus::Failed
        } else {
            RunStatus::Finished
        };
        self.log.append(&format!(
            "Transformation '{}' - execution finished with status {} ({errors} errors)",
            self.definition.name, self.status
        ));
        tracing::info!(
            transformation = %self.definition.name,
            status = %self.status,
            errors,
            "Transformation finished"
        );
    }

    fn status(&self) -> RunStatus {
        self.status
    }

    fn result_code(&self) -> i32 {
        self.errors
    }

    fn log_text(&self) -> String {
        self.log.text()
    }

    fn arguments(&self) -> &[String] {
        &self.context.arguments
    }

    fn step_output_rows(&self, step: &str) -> Option<RowSet> {
        self.buffers.get(step).map(|b| b.output.lock().clone())
    }

    fn step_error_rows(&self, step: &str) -> Option<RowSet> {
        self.buffers.get(step).map(|b| b.errors.lock().clone())
    }

    fn step_metrics(&self) -> Vec<StepMetrics> {
        self.metrics.iter().map(|m| m.lock().clone()).collect()
    }
}

/// Body of one step thread
#[allow(clippy::too_many_lines)]
fn run_step(step: PreparedStep) {
    let PreparedStep {
        name,
        kind,
        input,
        output,
        input_columns,
        out_buffer,
        err_buffer,
        metrics,
        log,
        halt,
        context,
    } = step;

    let mut read = 0u64;
    let mut written = 0u64;
    let mut rejected = 0u64;
    let mut errors = 0u64;

    match kind {
        PreparedKind::Source { rows } => {
            for row in rows {
                if halt.load(Ordering::SeqCst) {
                    break;
                }
                read += 1;
                out_buffer.lock().add_row(row.clone());
                written += 1;
                if let Some(tx) = &output
                    && tx.send(row).is_err()
                {
                    break;
                }
            }
        }
        ref consuming => {
            if let Some(rx) = input {
                'rows: for row in rx {
                    if halt.load(Ordering::SeqCst) {
                        break;
                    }
                    read += 1;
                    match consuming {
                        PreparedKind::Filter {
                            checks,
                            reject_to_error,
                        } => {
                            let matches = checks.iter().all(|(idx, expected)| {
                                row.get(*idx)
                                    .map(|v| cell_to_string(v) == *expected)
                                    .unwrap_or(false)
                            });
                            if matches {
                                out_buffer.lock().add_row(row.clone());
                                written += 1;
                                if let Some(tx) = &output
                                    && tx.send(row).is_err()
                                {
                                    break 'rows;
                                }
                            } else if *reject_to_error {
                                err_buffer.lock().add_row(row);
                                rejected += 1;
                            }
                        }
                        PreparedKind::Formula {
                            template,
                            field_index,
                        } => {
                            let value =
                                context.expand_with_row(template, &input_columns, &row);
                            let mut row = row;
                            match field_index {
                                Some(idx) => row[*idx] = Value::String(value),
                                None => row.push(Value::String(value)),
                            }
                            out_buffer.lock().add_row(row.clone());
                            written += 1;
                            if let Some(tx) = &output
                                && tx.send(row).is_err()
                            {
                                break 'rows;
                            }
                        }
                        PreparedKind::Log { template } => {
                            log.append(&format!(
                                "{name} - {}",
                                context.expand_with_row(template, &input_columns, &row)
                            ));
                            out_buffer.lock().add_row(row.clone());
                            written += 1;
                            if let Some(tx) = &output
                                && tx.send(row).is_err()
                            {
                                break 'rows;
                            }
                        }
                        PreparedKind::Abort { message } => {
                            errors += 1;
                            halt.store(true, Ordering::SeqCst);
                            if message.is_empty() {
                                log.append(&format!("{name} - Row received, aborting"));
                            } else {
                                log.append(&format!("{name} - {}", context.expand(message)));
                            }
                            break 'rows;
                        }
                        PreparedKind::Output => {
                            out_buffer.lock().add_row(row.clone());
                            written += 1;
                            if let Some(tx) = &output
                                && tx.send(row).is_err()
                            {
                                break 'rows;
                            }
                        }
                        PreparedKind::Source { .. } => {}
                    }
                }
            }
        }
    }

    log.append(&format!(
        "{name} - Finished processing (R={read}, W={written}, E={errors})"
    ));
    tracing::debug!(step = %name, read, written, rejected, errors, "Step finished");

    let mut guard = metrics.lock();
    guard.rows_read = read;
    guard.rows_written = written;
    guard.rows_rejected = rejected;
    guard.errors = errors;
}

/// A job run executing its entries sequentially on a worker thread
pub struct LocalJobRun {
    definition: Job,
    repository: Option<Arc<dyn ArtifactRepository>>,
    context: RunContext,
    initialized: bool,
    prepared: bool,
    log: LogBuffer,
    errors: Arc<Mutex<i32>>,
    handle: Option<thread::JoinHandle<()>>,
    status: RunStatus,
}

impl LocalJobRun {
    /// Creates a run for the given definition
    #[must_use]
    pub fn new(definition: Job, repository: Option<Arc<dyn ArtifactRepository>>) -> Self {
        Self {
            definition,
            repository,
            context: RunContext::default(),
            initialized: false,
            prepared: false,
            log: LogBuffer::new(),
            errors: Arc::new(Mutex::new(0)),
            handle: None,
            status: RunStatus::NotStarted,
        }
    }

    fn directory(&self) -> String {
        self.context
            .variables
            .get(INTERNAL_DIRECTORY_VARIABLE)
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }
}

impl JobRun for LocalJobRun {
    fn initialize(&mut self, context: &RunContext) -> Result<(), PipelineError> {
        self.definition
            .validate()
            .map_err(|e| PipelineError::Initialization {
                definition: self.definition.name.clone(),
                reason: e.to_string(),
            })?;
        self.context = context.clone();
        self.initialized = true;
        self.log.append(&format!(
            "Job '{}' - initialized from definition ({} entries)",
            self.definition.name,
            self.definition.entry_count()
        ));
        tracing::info!(
            job = %self.definition.name,
            run_id = %self.context.run_id,
            entries = self.definition.entry_count(),
            "Job initialized"
        );
        Ok(())
    }

    fn prepare_execution(&mut self) -> Result<(), PipelineError> {
        if !self.initialized {
            return Err(PipelineError::PrepareExecution {
                definition: self.definition.name.clone(),
                reason: "run is not initialized".to_string(),
            });
        }
        let directory = self.directory();
        for entry in &self.definition.entries {
            if let EntryType::Transformation { path } = &entry.entry_type {
                let Some(repository) = &self.repository else {
                    return Err(PipelineError::PrepareExecution {
                        definition: self.definition.name.clone(),
                        reason: format!(
                            "entry '{}' needs a repository to resolve '{path}'",
                            entry.name
                        ),
                    });
                };
                if !repository.exists(&directory, path) {
                    return Err(PipelineError::PrepareExecution {
                        definition: self.definition.name.clone(),
                        reason: format!(
                            "entry '{}': transformation '{path}' not found under '{directory}'",
                            entry.name
                        ),
                    });
                }
            }
        }
        self.prepared = true;
        self.log.append(&format!(
            "Job '{}' - prepared {} entries",
            self.definition.name,
            self.definition.entry_count()
        ));
        Ok(())
    }

    fn start(&mut self) -> Result<(), PipelineError> {
        if !self.prepared {
            return Err(PipelineError::PrepareExecution {
                definition: self.definition.name.clone(),
                reason: "run is not prepared".to_string(),
            });
        }

        self.status = RunStatus::Running;
        self.log.append(&format!(
            "Job '{}' - starting {} entries",
            self.definition.name,
            self.definition.entry_count()
        ));

        let definition = self.definition.clone();
        let repository = self.repository.clone();
        let context = self.context.clone();
        let directory = self.directory();
        let log = self.log.clone();
        let errors = Arc::clone(&self.errors);

        self.handle = Some(thread::spawn(move || {
            let mut total = 0i32;
            for entry in &definition.entries {
                match run_entry(entry, &context, &directory, repository.as_ref(), &log) {
                    Ok(()) => {
                        log.append(&format!(
                            "Job '{}' - entry '{}' finished",
                            definition.name, entry.name
                        ));
                    }
                    Err((count, reason)) => {
                        total += count;
                        log.append(&format!(
                            "Job '{}' - entry '{}' failed: {reason}",
                            definition.name, entry.name
                        ));
                        break;
                    }
                }
            }
            *errors.lock() = total;
        }));
        Ok(())
    }

    fn wait_until_finished(&mut self) {
        if self.status != RunStatus::Running {
            return;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let errors = *self.errors.lock();
        self.status = if errors > 0 {
            RunStatus::Failed
        } else {
            RunStatus::Finished
        };
        self.log.append(&format!(
            "Job '{}' - execution finished with status {} ({errors} errors)",
            self.definition.name, self.status
        ));
        tracing::info!(
            job = %self.definition.name,
            status = %self.status,
            errors,
            "Job finished"
        );
    }

    fn status(&self) -> RunStatus {
        self.status
    }

    fn result_code(&self) -> i32 {
        *self.errors.lock()
    }

    fn log_text(&self) -> String {
        self.log.text()
    }

    fn arguments(&self) -> &[String] {
        &self.context.arguments
    }
}

/// Executes a single job entry; an error carries its weight in the result code
fn run_entry(
    entry: &Entry,
    context: &RunContext,
    directory: &str,
    repository: Option<&Arc<dyn ArtifactRepository>>,
    log: &LogBuffer,
) -> Result<(), (i32, String)> {
    match &entry.entry_type {
        EntryType::Log { message } => {
            log.append(&format!("{} - {}", entry.name, context.expand(message)));
            Ok(())
        }
        EntryType::Abort { message } => {
            let text = if message.is_empty() {
                "aborted".to_string()
            } else {
                context.expand(message)
            };
            Err((1, text))
        }
        EntryType::Transformation { path } => {
            let Some(repository) = repository else {
                return Err((1, format!("no repository to resolve '{path}'")));
            };
            let definition = repository
                .load_transformation(directory, path)
                .map_err(|e| (1, e.to_string()))?;

            let nested = context.for_nested(&definition.parameters);
            let mut run = LocalTransformationRun::new(definition);
            run.initialize(&nested).map_err(|e| (1, e.to_string()))?;
            run.prepare_execution().map_err(|e| (1, e.to_string()))?;
            run.start().map_err(|e| (1, e.to_string()))?;
            run.wait_until_finished();

            log.append_raw(&run.log_text());
            if run.status().is_success() {
                Ok(())
            } else {
                Err((
                    run.result_code().max(1),
                    format!("transformation '{path}' finished with status {}", run.status()),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{FilterCondition, GeneratedColumn, MismatchAction, Step};
    use crate::repository::MemoryRepository;
    use serde_json::json;

    fn run_to_completion(run: &mut LocalTransformationRun, context: &RunContext) {
        run.initialize(context).unwrap();
        run.prepare_execution().unwrap();
        run.start().unwrap();
        run.wait_until_finished();
    }

    fn injector_filter_output() -> Transformation {
        Transformation::new(
            "filter-regions",
            vec![
                Step::injector(
                    "Injector",
                    vec!["REGION".to_string(), "DEPARTMENT".to_string()],
                ),
                Step::filter(
                    "Filter rows",
                    vec![
                        FilterCondition {
                            column: "REGION".to_string(),
                            value: "Central".to_string(),
                        },
                        FilterCondition {
                            column: "DEPARTMENT".to_string(),
                            value: "Sales".to_string(),
                        },
                    ],
                    MismatchAction::Drop,
                ),
                Step::output("Output"),
            ],
        )
    }

    fn sample_rows() -> RowSet {
        let mut rows = RowSet::with_columns(&["REGION", "DEPARTMENT"]);
        rows.add_string_row(&["abc", "123"]);
        rows.add_string_row(&["region2", "Sales"]);
        rows.add_string_row(&["Central", "Sales"]);
        rows.add_string_row(&["Central", "xyz"]);
        rows
    }

    #[test]
    fn test_injector_filter_run() {
        let mut run = LocalTransformationRun::new(injector_filter_output());
        run.initialize(&RunContext::new()).unwrap();
        run.inject_rows("Injector", sample_rows()).unwrap();
        run.prepare_execution().unwrap();
        run.start().unwrap();
        run.wait_until_finished();

        assert_eq!(run.status(), RunStatus::Finished);
        assert_eq!(run.result_code(), 0);

        let output = run.step_output_rows("Output").unwrap();
        assert_eq!(output.row_count(), 1);
        assert_eq!(output.value_at(0, 0), Some(&json!("Central")));

        let log = run.log_text();
        assert!(log.contains("Injector"));
        assert!(log.contains("R=4"));
        assert!(log.contains("Filter rows"));
        assert!(log.contains("W=1"));
    }

    #[test]
    fn test_inject_rows_unknown_step() {
        let mut run = LocalTransformationRun::new(injector_filter_output());
        run.initialize(&RunContext::new()).unwrap();
        let err = run.inject_rows("Absent", sample_rows()).unwrap_err();
        assert!(matches!(err, PipelineError::StepNotFound { .. }));
    }

    #[test]
    fn test_filter_error_routing() {
        let mut definition = injector_filter_output();
        definition.steps[1] = Step::filter(
            "Filter rows",
            vec![FilterCondition {
                column: "DEPARTMENT".to_string(),
                value: "Sales".to_string(),
            }],
            MismatchAction::Error,
        );

        let mut run = LocalTransformationRun::new(definition);
        run.initialize(&RunContext::new()).unwrap();
        run.inject_rows("Injector", sample_rows()).unwrap();
        run.prepare_execution().unwrap();
        run.start().unwrap();
        run.wait_until_finished();

        assert_eq!(run.status(), RunStatus::Finished);
        let output = run.step_output_rows("Filter rows").unwrap();
        let errors = run.step_error_rows("Filter rows").unwrap();
        assert_eq!(output.row_count(), 2);
        assert_eq!(errors.row_count(), 2);

        let metrics = run.step_metrics();
        let filter = metrics.iter().find(|m| m.step == "Filter rows").unwrap();
        assert_eq!(filter.rows_read, 4);
        assert_eq!(filter.rows_written, 2);
        assert_eq!(filter.rows_rejected, 2);
        assert_eq!(filter.errors, 0);
    }

    #[test]
    fn test_generator_with_parameters() {
        let definition = Transformation::new(
            "generate-rows",
            vec![
                Step::generator(
                    "Generate rows",
                    "${rowCount}",
                    vec![GeneratedColumn {
                        name: "label".to_string(),
                        value: "${label}".to_string(),
                    }],
                ),
                Step::output("Output"),
            ],
        );

        let mut context = RunContext::new();
        context
            .parameters
            .insert("rowCount".to_string(), "3".to_string());
        context
            .variables
            .insert("label".to_string(), "hello".to_string());

        let mut run = LocalTransformationRun::new(definition);
        run_to_completion(&mut run, &context);

        let output = run.step_output_rows("Output").unwrap();
        assert_eq!(output.row_count(), 3);
        assert_eq!(output.value_at(2, 0), Some(&json!("hello")));
    }

    #[test]
    fn test_formula_appends_field() {
        let definition = Transformation::new(
            "greet",
            vec![
                Step::injector("Injector", vec!["TITLE".to_string()]),
                Step::formula("Say hello", "GREETING", "Hello, ${TITLE}"),
                Step::output("Output"),
            ],
        );

        let mut run = LocalTransformationRun::new(definition);
        run.initialize(&RunContext::new()).unwrap();
        let mut rows = RowSet::with_columns(&["TITLE"]);
        rows.add_string_row(&["test title"]);
        run.inject_rows("Injector", rows).unwrap();
        run.prepare_execution().unwrap();
        run.start().unwrap();
        run.wait_until_finished();

        let output = run.step_output_rows("Output").unwrap();
        assert_eq!(output.columns(), &["TITLE".to_string(), "GREETING".to_string()]);
        assert_eq!(output.value_at(0, 1), Some(&json!("Hello, test title")));
    }

    #[test]
    fn test_abort_halts_run() {
        let definition = Transformation::new(
            "abort-run",
            vec![
                Step::generator(
                    "Generate rows",
                    "5",
                    vec![GeneratedColumn {
                        name: "n".to_string(),
                        value: "1".to_string(),
                    }],
                ),
                Step::abort("Abort", "giving up"),
            ],
        );

        let mut run = LocalTransformationRun::new(definition);
        run_to_completion(&mut run, &RunContext::new());

        assert_eq!(run.status(), RunStatus::Halted);
        assert!(run.result_code() > 0);
        assert!(run.log_text().contains("giving up"));
    }

    #[test]
    fn test_prepare_fails_on_bad_row_count() {
        let definition = Transformation::new(
            "bad-count",
            vec![
                Step::generator("Generate rows", "${missing}", vec![]),
                Step::output("Output"),
            ],
        );

        let mut run = LocalTransformationRun::new(definition);
        run.initialize(&RunContext::new()).unwrap();
        let err = run.prepare_execution().unwrap_err();
        assert!(matches!(err, PipelineError::PrepareExecution { .. }));
    }

    #[test]
    fn test_initialize_fails_on_duplicate_steps() {
        let definition = Transformation::new(
            "dup",
            vec![Step::output("Output"), Step::output("Output")],
        );
        let mut run = LocalTransformationRun::new(definition);
        let err = run.initialize(&RunContext::new()).unwrap_err();
        assert!(matches!(err, PipelineError::Initialization { .. }));
    }

    #[test]
    fn test_initialize_fails_on_mid_chain_source() {
        let definition = Transformation::new(
            "late-source",
            vec![
                Step::output("Output"),
                Step::generator("Generate rows", "1", vec![]),
            ],
        );
        let mut run = LocalTransformationRun::new(definition);
        let err = run.initialize(&RunContext::new()).unwrap_err();
        assert!(matches!(err, PipelineError::Initialization { .. }));
    }

    fn names_transformation() -> Transformation {
        Transformation::new(
            "concat-names",
            vec![
                Step::generator(
                    "Generate rows",
                    "1",
                    vec![GeneratedColumn {
                        name: "marker".to_string(),
                        value: "x".to_string(),
                    }],
                ),
                Step::formula("Concatenate", "fullName", "${firstName}${lastName}"),
                Step::log("Write names", "fullName = ${fullName}"),
                Step::output("Output"),
            ],
        )
        .with_parameters(
            crate::pipeline::Parameters::new()
                .with("firstName", "nobody")
                .with("lastName", "nobody"),
        )
    }

    #[test]
    fn test_job_runs_nested_transformation() {
        let repository: Arc<dyn ArtifactRepository> = Arc::new(
            MemoryRepository::new().with_transformation("etl", "names.yaml", names_transformation()),
        );

        let job = Job::new(
            "run-names",
            vec![
                Entry::log("start", "starting"),
                Entry::transformation("run names", "/etl/names.yaml"),
            ],
        );

        let mut context = RunContext::new();
        context
            .parameters
            .insert("firstName".to_string(), "John".to_string());
        context
            .parameters
            .insert("lastName".to_string(), "Doe".to_string());
        context.variables.insert(
            INTERNAL_DIRECTORY_VARIABLE.to_string(),
            "/".to_string(),
        );

        let mut run = LocalJobRun::new(job, Some(repository));
        run.initialize(&context).unwrap();
        run.prepare_execution().unwrap();
        run.start().unwrap();
        run.wait_until_finished();

        assert_eq!(run.status(), RunStatus::Finished);
        assert_eq!(run.result_code(), 0);
        assert!(run.log_text().contains("fullName = JohnDoe"));
    }

    #[test]
    fn test_job_prepare_fails_on_missing_transformation() {
        let repository: Arc<dyn ArtifactRepository> = Arc::new(MemoryRepository::new());
        let job = Job::new(
            "broken",
            vec![Entry::transformation("run names", "/etl/names.yaml")],
        );

        let mut run = LocalJobRun::new(job, Some(repository));
        run.initialize(&RunContext::new()).unwrap();
        let err = run.prepare_execution().unwrap_err();
        assert!(matches!(err, PipelineError::PrepareExecution { .. }));
    }

    #[test]
    fn test_job_abort_entry_fails_run() {
        let job = Job::new(
            "failing",
            vec![
                Entry::log("start", "starting"),
                Entry::abort("stop", "on purpose"),
                Entry::log("never", "unreachable"),
            ],
        );

        let mut run = LocalJobRun::new(job, None);
        run.initialize(&RunContext::new()).unwrap();
        run.prepare_execution().unwrap();
        run.start().unwrap();
        run.wait_until_finished();

        assert_eq!(run.status(), RunStatus::Failed);
        assert!(run.result_code() > 0);
        let log = run.log_text();
        assert!(log.contains("on purpose"));
        assert!(!log.contains("unreachable"));
    }
}
