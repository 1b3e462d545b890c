//! Session and authorization collaborators
//!
//! The adapter never implements authorization logic; it consults an
//! [`AuthorizationPolicy`] once per call, before any repository resolution,
//! and treats a denial as fatal. The acting principal travels in an explicit
//! [`SessionContext`] value threaded through `validate()` and `execute()`,
//! never in ambient thread-local state.

#![allow(clippy::must_use_candidate)]

/// Capability required to execute repository artifacts
pub const REPOSITORY_EXECUTE_ACTION: &str = "repository.execute";

/// Capability required to read repository artifacts
pub const REPOSITORY_READ_ACTION: &str = "repository.read";

/// Identity of the principal on whose behalf a call runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Name of the acting principal
    pub principal: String,
}

impl SessionContext {
    /// Creates a session for the given principal
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
        }
    }

    /// Creates a session for the local system principal
    #[must_use]
    pub fn system() -> Self {
        Self::new("system")
    }
}

/// Decides whether the current session may perform named actions
pub trait AuthorizationPolicy: Send + Sync {
    /// Returns true if the named action is permitted
    fn is_allowed(&self, action: &str) -> bool;

    /// Returns the actions permitted in the given namespace
    fn allowed_actions(&self, namespace: &str) -> Vec<String>;
}

/// Policy that permits every action
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationPolicy for AllowAll {
    fn is_allowed(&self, _action: &str) -> bool {
        true
    }

    fn allowed_actions(&self, _namespace: &str) -> Vec<String> {
        vec![
            REPOSITORY_READ_ACTION.to_string(),
            REPOSITORY_EXECUTE_ACTION.to_string(),
        ]
    }
}
