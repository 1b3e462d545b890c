//! Override binding
//!
//! Merges the three caller-supplied override sources into the runtime
//! context of one execution. The sources target disjoint namespaces, so the
//! binding order is unobservable; it is fixed anyway (arguments, then
//! parameters, then variables) for determinism.

use crate::engine::context::{INTERNAL_DIRECTORY_VARIABLE, RunContext};
use crate::pipeline::Parameters;
use std::collections::HashMap;

/// Caller-supplied overrides for one execution
///
/// Immutable once execution starts; the adapter clones it into the bound
/// [`RunContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    /// Positional arguments, verbatim and ordered
    pub arguments: Vec<String>,

    /// Named parameter overrides; applied only where the definition
    /// declares the name
    pub parameters: HashMap<String, String>,

    /// Named variables; always set, created when absent
    pub variables: HashMap<String, String>,
}

impl OverrideSet {
    /// Creates an empty override set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Binds the overrides against a definition's declared parameters
///
/// Rules, in order:
/// 1. Arguments are attached verbatim, in caller order.
/// 2. Every declared parameter resolves to its override value when the
///    override map names it, otherwise to its declared default. Override
///    names the definition does not declare are ignored; no parameter is
///    ever invented.
/// 3. Variables are set unconditionally, creating new names as needed. The
///    artifact's repository directory is published as the built-in
///    [`INTERNAL_DIRECTORY_VARIABLE`].
#[must_use]
pub fn bind(declared: &Parameters, overrides: &OverrideSet, directory: &str) -> RunContext {
    let mut context = RunContext::new();

    context.arguments = overrides.arguments.clone();

    for param in declared.iter() {
        let value = overrides
            .parameters
            .get(&param.name)
            .cloned()
            .or_else(|| param.default_value.clone())
            .unwrap_or_default();
        context.parameters.insert(param.name.clone(), value);
    }

    for (name, value) in &overrides.variables {
        context.variables.insert(name.clone(), value.clone());
    }
    context.variables.insert(
        INTERNAL_DIRECTORY_VARIABLE.to_string(),
        directory.to_string(),
    );

    tracing::debug!(
        run_id = %context.run_id,
        arguments = context.arguments.len(),
        parameters = context.parameters.len(),
        variables = context.variables.len(),
        "Bound execution context"
    );
    context
}
