//! Convenience re-exports for host applications
//!
//! ```rust
//! use rowline::prelude::*;
//! ```

pub use crate::action::{ExecutionResult, OverrideSet, PipelineAction};
pub use crate::engine::{EngineFactory, LocalEngine, RunContext, StepMetrics};
pub use crate::pipeline::{
    ArtifactKind, Entry, EntryType, FilterCondition, GeneratedColumn, Job, MismatchAction,
    Parameters, PipelineError, RunStatus, Step, StepType, Transformation, Validate,
};
pub use crate::repository::{ArtifactRepository, FileRepository, MemoryRepository};
pub use crate::rows::{Row, RowSet};
pub use crate::security::{AllowAll, AuthorizationPolicy, SessionContext};
