//! Console reporter: compact summary plus the top-N violations

use super::ConsoleOptions;
use crate::models::{GovernanceReport, Severity};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Severity colors
fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Emergency => "\x1b[31m", // Red
        Severity::Critical => "\x1b[91m",  // Light red
        Severity::Warning => "\x1b[33m",   // Yellow
        Severity::Autonomous => "\x1b[32m", // Green
    }
}

/// Severity tag
fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Emergency => "[E]",
        Severity::Critical => "[C]",
        Severity::Warning => "[W]",
        Severity::Autonomous => "[A]",
    }
}

fn level_color(level: &str) -> &'static str {
    match level {
        "emergency" => "\x1b[31m",
        "governance" => "\x1b[91m",
        "warning" => "\x1b[33m",
        _ => "\x1b[32m",
    }
}

/// ANSI codes, or nothing when color is off
struct Palette {
    color: bool,
}

impl Palette {
    fn paint(&self, code: &'static str) -> &'static str {
        if self.color {
            code
        } else {
            ""
        }
    }
}

/// Render report as formatted terminal output
pub fn render(report: &GovernanceReport, options: ConsoleOptions) -> Result<String> {
    let p = Palette {
        color: options.color,
    };
    let (reset, bold, dim) = (p.paint(RESET), p.paint(BOLD), p.paint(DIM));
    let meta = &report.metadata;
    let s = &report.summary;
    let mut out = String::new();

    // Header
    out.push_str(&format!("\n{bold}Architecture Governance{reset}\n"));
    out.push_str(&format!(
        "{dim}──────────────────────────────────────{reset}\n"
    ));
    out.push_str(&format!(
        "Environment: {}  Branch: {}  Threshold: {:.3}  Autonomous: {:.3}\n",
        meta.environment, meta.branch, meta.threshold, meta.autonomous_limit
    ));
    out.push_str(&format!(
        "Components: {}  Files: {}\n\n",
        s.total_files, s.files_scanned
    ));

    // Summary
    out.push_str(&format!("{bold}SUMMARY{reset}\n"));
    out.push_str(&format!(
        "  Autonomous: {}  Warning zone: {}  Violations: {} ({:.2}%)\n",
        s.autonomous_components, s.warning_zone_components, s.total_violations, s.violation_percentage
    ));
    if s.total_violations > 0 {
        let warnings = s.total_violations - s.critical_violations - s.emergency_violations;
        out.push_str(&format!(
            "  {}{} emergency{reset} | {}{} critical{reset} | {}{} warning{reset}\n",
            p.paint(severity_color(Severity::Emergency)),
            s.emergency_violations,
            p.paint(severity_color(Severity::Critical)),
            s.critical_violations,
            p.paint(severity_color(Severity::Warning)),
            warnings,
        ));
    }
    out.push('\n');

    // Top violations as table
    if !report.violations.is_empty() {
        out.push_str(&format!(
            "{dim}  #   SEV   RATIO    COST      COMPONENT{reset}\n"
        ));
        out.push_str(&format!(
            "{dim}  ─────────────────────────────────────────────────────────{reset}\n"
        ));

        for (i, v) in report.violations.iter().take(options.top).enumerate() {
            out.push_str(&format!(
                "  {dim}{:>3}{reset}  {}{}{reset}  {:>6.4}  {:>8.4}  {}\n",
                i + 1,
                p.paint(severity_color(v.severity)),
                severity_tag(v.severity),
                v.violation_ratio,
                v.cost,
                v.file_path
            ));
        }

        let remaining = report.violations.len().saturating_sub(options.top);
        if remaining > 0 {
            out.push_str(&format!(
                "\n  {dim}...and {} more (use --top or --format markdown){reset}\n",
                remaining
            ));
        }
        out.push('\n');
    }

    let isolation = &report.isolation_candidates;
    if !isolation.must_isolate.is_empty() {
        let paths: Vec<&str> = isolation
            .must_isolate
            .iter()
            .map(|v| v.file_path.as_str())
            .collect();
        out.push_str(&format!("{bold}MUST ISOLATE{reset}  {}\n", paths.join(", ")));
    }
    if !isolation.should_review.is_empty() {
        out.push_str(&format!(
            "{bold}SHOULD REVIEW{reset} {} component(s)\n",
            isolation.should_review.len()
        ));
    }

    // Verdict
    let status = &report.compliance_status;
    let level = status.governance_level.as_str();
    out.push_str(&format!(
        "\nStatus: {}{bold}{}{reset}  Compliant: {}\n",
        p.paint(level_color(level)),
        level.to_uppercase(),
        if status.compliant { "yes" } else { "no" }
    ));
    if status.emergency_action_required {
        out.push_str(&format!(
            "{dim}Emergency action required: isolate the components above before merging.{reset}\n"
        ));
    }

    Ok(out)
}
