//! Governance run orchestration
//!
//! A run is a linear state machine with no backward transitions:
//!
//! ```text
//! INIT ──▶ COLLECT ──▶ EVALUATE ──▶ REPORT ──▶ DECIDE ──▶ DONE
//! ```
//!
//! - INIT validates the configuration and resolves environment, branch and
//!   threshold once
//! - COLLECT measures files; per-file failures are absorbed, a missing root
//!   or an empty component set is fatal
//! - EVALUATE classifies components and builds the summary
//! - REPORT assembles the single report value all formats render from
//! - DECIDE applies the failure policy

use crate::collect::{collect_project, CollectOptions};
use crate::config::GovernanceConfig;
use crate::detectors::ViolationDetector;
use crate::environment::{
    EnvSource, Environment, EnvironmentContext, GovernanceThreshold, ProcessEnv,
    ThresholdResolver,
};
use crate::error::GovernanceError;
use crate::git::{BranchLookup, GitBranchLookup};
use crate::models::{GovernanceReport, ViolationSummary};
use crate::reporters::{build_report, report_metadata};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Phase of a governance run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Init,
    Collect,
    Evaluate,
    Report,
    Decide,
    Done,
}

impl RunPhase {
    /// The only phase reachable from this one.
    pub fn next(self) -> Option<RunPhase> {
        match self {
            RunPhase::Init => Some(RunPhase::Collect),
            RunPhase::Collect => Some(RunPhase::Evaluate),
            RunPhase::Evaluate => Some(RunPhase::Report),
            RunPhase::Report => Some(RunPhase::Decide),
            RunPhase::Decide => Some(RunPhase::Done),
            RunPhase::Done => None,
        }
    }
}

/// Caller-supplied overrides for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub environment: Option<Environment>,
    /// Skips the version control lookup when set
    pub branch: Option<String>,
    /// `Some(true)` fails on any violation, `Some(false)` never does;
    /// `None` follows the environment policy
    pub fail_on_violations: Option<bool>,
    pub collect: CollectOptions,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub context: EnvironmentContext,
    pub threshold: GovernanceThreshold,
    pub report: GovernanceReport,
    pub should_fail: bool,
    pub files_processed: usize,
    pub files_failed: usize,
}

/// Failure decision.
///
/// Violations fail the run when the override says so, or, without an
/// override, when the environment is strict (ci, production). Emergency
/// action always fails the run.
pub fn decide(
    environment: Environment,
    fail_override: Option<bool>,
    summary: &ViolationSummary,
) -> bool {
    if summary.emergency_action_required {
        return true;
    }
    let policy_fails = fail_override.unwrap_or_else(|| environment.is_strict());
    policy_fails && summary.total_violations > 0
}

/// Drives one governance run over a project root.
pub struct GovernanceRunner {
    project_root: PathBuf,
    config: GovernanceConfig,
    env: Box<dyn EnvSource>,
    branch_lookup: Box<dyn BranchLookup>,
    phase: RunPhase,
}

impl GovernanceRunner {
    /// Runner reading the process environment and the git repository.
    pub fn new(project_root: impl Into<PathBuf>, config: GovernanceConfig) -> Self {
        Self {
            project_root: project_root.into(),
            config,
            env: Box::new(ProcessEnv),
            branch_lookup: Box::new(GitBranchLookup::default()),
            phase: RunPhase::Init,
        }
    }

    /// Replace the environment variable source.
    pub fn with_env(mut self, env: Box<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    /// Replace the version control branch lookup.
    pub fn with_branch_lookup(mut self, lookup: Box<dyn BranchLookup>) -> Self {
        self.branch_lookup = lookup;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    fn advance(&mut self, files_processed: usize) -> Result<(), GovernanceError> {
        let next = self.phase.next().ok_or_else(|| {
            GovernanceError::invariant("run already finished", files_processed)
        })?;
        debug!("Run phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Execute the run to completion. The runner cannot be reused.
    pub fn run(mut self, options: &RunOptions) -> Result<RunOutcome, GovernanceError> {
        // INIT
        self.config.validate()?;
        let resolver = ThresholdResolver::new(&self.config)?;
        let context = EnvironmentContext::resolve(
            &self.project_root,
            options.environment,
            options.branch.as_deref(),
            self.env.as_ref(),
            self.branch_lookup.as_ref(),
        );
        let threshold = resolver.resolve(&context)?;
        info!(
            "Governance threshold {} ({} x {}) for {} on '{}'",
            threshold.value,
            threshold.base,
            threshold.branch_multiplier,
            context.environment,
            context.branch
        );

        self.advance(0)?;
        let collection = collect_project(&self.project_root, &self.config, &options.collect)?;
        let files_processed = collection.files_processed;

        self.advance(files_processed)?;
        // Unreadable files were still scanned, as zero-cost substitutes
        let evaluation = ViolationDetector::new(&self.config.limits).evaluate(
            &collection.components,
            threshold.value,
            collection.files.len(),
        )?;

        self.advance(files_processed)?;
        let metadata = report_metadata(
            &context,
            threshold.value,
            self.config.limits.autonomous,
            Utc::now(),
        );
        let report = build_report(evaluation, metadata);

        self.advance(files_processed)?;
        let should_fail = decide(
            context.environment,
            options.fail_on_violations,
            &report.summary,
        );
        info!(
            "Decision: {} ({} violations, emergency action required: {})",
            if should_fail { "fail" } else { "pass" },
            report.summary.total_violations,
            report.summary.emergency_action_required
        );

        self.advance(files_processed)?;

        Ok(RunOutcome {
            context,
            threshold,
            report,
            should_fail,
            files_processed,
            files_failed: collection.files_failed,
        })
    }
}
