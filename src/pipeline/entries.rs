//! Entry types for job definitions
//!
//! Entries are the units of work inside a job. They execute sequentially;
//! a failing entry stops the remaining ones.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of entries available in jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryType {
    /// Runs a transformation stored in the same repository
    Transformation {
        /// Repository path of the transformation to run
        path: String,
    },

    /// Writes a message to the execution log
    Log {
        /// Message template; may reference `${name}` values
        message: String,
    },

    /// Fails the job unconditionally
    Abort {
        /// Message recorded in the log when aborting
        #[serde(default)]
        message: String,
    },
}

/// A single named entry in a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry name, unique within its job
    pub name: String,

    /// Type of entry
    #[serde(flatten)]
    pub entry_type: EntryType,
}

impl Entry {
    /// Creates a new entry
    pub fn new(name: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            name: name.into(),
            entry_type,
        }
    }

    /// Creates an entry running a transformation by repository path
    pub fn transformation(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, EntryType::Transformation { path: path.into() })
    }

    /// Creates a log entry
    pub fn log(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            name,
            EntryType::Log {
                message: message.into(),
            },
        )
    }

    /// Creates an abort entry
    pub fn abort(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            name,
            EntryType::Abort {
                message: message.into(),
            },
        )
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry_type {
            EntryType::Transformation { path } => {
                write!(f, "Entry({}): transformation({path})", self.name)
            }
            EntryType::Log { message } => write!(f, "Entry({}): log({message})", self.name),
            EntryType::Abort { .. } => write!(f, "Entry({}): abort", self.name),
        }
    }
}
