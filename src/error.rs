//! Fatal errors of a governance run
//!
//! Per-file read failures and branch lookup failures are recovered where
//! they happen (see `collect::CollectError` and `git::VcsLookupError`).
//! Everything here aborts the run.

use thiserror::Error;

/// Exit code for a run that completed but failed governance.
pub const EXIT_GOVERNANCE_FAILURE: i32 = 1;
/// Exit code for fatal configuration, structure or invariant errors.
pub const EXIT_FATAL: i32 = 2;

#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Project structure error: {message}")]
    ProjectStructure {
        message: String,
        files_processed: usize,
    },

    #[error("Invariant violated: {message}")]
    Invariant {
        message: String,
        files_processed: usize,
    },
}

impl GovernanceError {
    pub fn structure(message: impl Into<String>, files_processed: usize) -> Self {
        GovernanceError::ProjectStructure {
            message: message.into(),
            files_processed,
        }
    }

    pub fn invariant(message: impl Into<String>, files_processed: usize) -> Self {
        GovernanceError::Invariant {
            message: message.into(),
            files_processed,
        }
    }

    /// Files successfully processed before the failure.
    pub fn files_processed(&self) -> usize {
        match self {
            GovernanceError::Config(_) => 0,
            GovernanceError::ProjectStructure {
                files_processed, ..
            }
            | GovernanceError::Invariant {
                files_processed, ..
            } => *files_processed,
        }
    }

    pub fn exit_code(&self) -> i32 {
        EXIT_FATAL
    }
}
