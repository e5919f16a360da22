//! archgate - architectural governance gate
//!
//! Scans a source tree, assigns every component directory a composite cost
//! approximating structural complexity and coupling, compares costs against
//! environment- and branch-aware thresholds, and decides whether a build
//! should pass.
//!
//! ```text
//! GovernanceRunner (pipeline)
//!   INIT      config + environment ──▶ threshold
//!   COLLECT   collect (metrics, cost) ──▶ components
//!   EVALUATE  detectors ──▶ violations + summary
//!   REPORT    reporters ──▶ console / json / markdown
//!   DECIDE    pass / fail
//! ```

pub mod cli;
pub mod collect;
pub mod config;
pub mod detectors;
pub mod environment;
pub mod error;
pub mod git;
pub mod models;
pub mod pipeline;
pub mod reporters;

pub use error::GovernanceError;
pub use pipeline::{GovernanceRunner, RunOptions, RunOutcome};
