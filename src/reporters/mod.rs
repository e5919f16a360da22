//! Governance report assembly and rendering
//!
//! Supports three output formats:
//! - `console` - Compact terminal summary with the top-N violations
//! - `json` - Machine-readable JSON with stable key order
//! - `markdown` - Table-based audit artifact
//!
//! Every format renders from the same [`GovernanceReport`] value. Rendering
//! is a pure transform; writing the result anywhere is the caller's job.

mod json;
mod markdown;
mod text;

use crate::detectors::Evaluation;
use crate::environment::EnvironmentContext;
use crate::models::{ComplianceStatus, GovernanceReport, ReportMetadata, ViolationSummary};
use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::str::FromStr;

/// Name written into report metadata
pub const GENERATOR: &str = "archgate";
/// Version of the report schema
pub const FORMAT_VERSION: &str = "1.0";

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
    Markdown,
}

impl OutputFormat {
    /// Machine formats keep stdout free of anything but the report.
    pub fn is_machine_readable(&self) -> bool {
        !matches!(self, OutputFormat::Console)
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "text" | "txt" | "terminal" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: console, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Console => write!(f, "console"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Console rendering knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleOptions {
    /// Violations shown in detail
    pub top: usize,
    pub color: bool,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            top: 10,
            color: true,
        }
    }
}

/// Report header for a run.
pub fn report_metadata(
    context: &EnvironmentContext,
    threshold: f64,
    autonomous_limit: f64,
    generated_at: DateTime<Utc>,
) -> ReportMetadata {
    ReportMetadata {
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        generator: GENERATOR.to_string(),
        format_version: FORMAT_VERSION.to_string(),
        environment: context.environment.to_string(),
        branch: context.branch.clone(),
        threshold,
        autonomous_limit,
    }
}

/// Overall standing of the project: `emergency`, `governance`, `warning`
/// or `autonomous`.
pub fn governance_level(summary: &ViolationSummary) -> &'static str {
    if summary.emergency_action_required {
        "emergency"
    } else if summary.total_violations > 0 {
        "governance"
    } else if summary.warning_zone_components > 0 {
        "warning"
    } else {
        "autonomous"
    }
}

/// Assemble the single report value every format renders from.
pub fn build_report(evaluation: Evaluation, metadata: ReportMetadata) -> GovernanceReport {
    let compliance_status = ComplianceStatus {
        compliant: evaluation.summary.total_violations == 0,
        emergency_action_required: evaluation.summary.emergency_action_required,
        governance_level: governance_level(&evaluation.summary).to_string(),
    };

    GovernanceReport {
        metadata,
        summary: evaluation.summary,
        violations: evaluation.violations,
        compliance_status,
        isolation_candidates: evaluation.isolation,
        components: evaluation.assessments,
    }
}

/// Render a report in the specified format
pub fn render(
    report: &GovernanceReport,
    format: OutputFormat,
    console: ConsoleOptions,
) -> Result<String> {
    match format {
        OutputFormat::Console => text::render(report, console),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report),
    }
}
