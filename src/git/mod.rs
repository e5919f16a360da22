//! Version control queries
//!
//! The engine only ever asks git one question: which branch is checked out.
//! The query is read-only and bounded by a timeout; any failure is
//! recoverable and resolves to the `"unknown"` branch upstream.
//!
//! # Example
//!
//! ```no_run
//! use archgate::git::{BranchLookup, GitBranchLookup};
//! use std::path::Path;
//!
//! let branch = GitBranchLookup::default()
//!     .current_branch(Path::new("."))
//!     .unwrap_or_else(|_| "unknown".to_string());
//! ```

pub mod branch;

pub use branch::{
    read_branch, BranchLookup, GitBranchLookup, VcsLookupError, DEFAULT_LOOKUP_TIMEOUT,
};
