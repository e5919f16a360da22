//! Markdown reporter for governance audit artifacts
//!
//! Generates GitHub-flavored Markdown suitable for:
//! - Pull request comments
//! - CI job summaries
//! - Archived audit records

use crate::models::{GovernanceReport, Severity, Violation, Zone};
use anyhow::Result;

/// Render report as GitHub-flavored Markdown
pub fn render(report: &GovernanceReport) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');

    md.push_str(&render_summary(report));
    md.push('\n');

    md.push_str(&render_violations(&report.violations));
    md.push('\n');

    md.push_str(&render_isolation(report));
    md.push('\n');

    md.push_str(&render_components(report));
    md.push('\n');

    md.push_str(&render_footer(report));

    Ok(md)
}

fn level_emoji(level: &str) -> &'static str {
    match level {
        "emergency" => "🚨",
        "governance" => "❌",
        "warning" => "⚠️",
        _ => "✅",
    }
}

fn severity_badge(severity: Severity) -> &'static str {
    match severity {
        Severity::Emergency => "🚨 Emergency",
        Severity::Critical => "🔴 Critical",
        Severity::Warning => "🟡 Warning",
        Severity::Autonomous => "🟢 Autonomous",
    }
}

fn render_header(report: &GovernanceReport) -> String {
    let status = &report.compliance_status;
    let meta = &report.metadata;

    format!(
        r#"# {} Architecture Governance Report

**Level: {}** | **Compliant: {}**

| Environment | Branch | Threshold | Autonomous limit |
|-------------|--------|-----------|------------------|
| {} | `{}` | {:.3} | {:.3} |

Generated: {}
"#,
        level_emoji(&status.governance_level),
        status.governance_level,
        if status.compliant { "yes" } else { "no" },
        meta.environment,
        meta.branch,
        meta.threshold,
        meta.autonomous_limit,
        meta.generated_at
    )
}

fn render_summary(report: &GovernanceReport) -> String {
    let s = &report.summary;

    format!(
        r#"## Summary

| Metric | Value |
|--------|-------|
| **Components evaluated** | {} |
| **Files scanned** | {} |
| **Autonomous** | {} |
| **Warning zone** | {} |
| **Violations** | {} ({:.2}%) |
| **Critical** | {} |
| **Emergency** | {} |
| **Emergency action required** | {} |
"#,
        s.total_files,
        s.files_scanned,
        s.autonomous_components,
        s.warning_zone_components,
        s.total_violations,
        s.violation_percentage,
        s.critical_violations,
        s.emergency_violations,
        if s.emergency_action_required { "**yes**" } else { "no" }
    )
}

fn render_violations(violations: &[Violation]) -> String {
    let mut md = String::from("## Violations\n\n");

    if violations.is_empty() {
        md.push_str("No component exceeds the governance threshold.\n");
        return md;
    }

    md.push_str("| # | Component | Severity | Cost | Threshold | Ratio |\n");
    md.push_str("|---|-----------|----------|------|-----------|-------|\n");
    for (i, v) in violations.iter().enumerate() {
        md.push_str(&format!(
            "| {} | `{}` | {} | {:.4} | {:.3} | {:.4} |\n",
            i + 1,
            v.file_path,
            severity_badge(v.severity),
            v.cost,
            v.threshold,
            v.violation_ratio
        ));
    }

    md
}

fn render_isolation(report: &GovernanceReport) -> String {
    let isolation = &report.isolation_candidates;
    let mut md = String::from("## Isolation Candidates\n\n");

    if isolation.must_isolate.is_empty() && isolation.should_review.is_empty() {
        md.push_str("None.\n");
        return md;
    }

    for (title, tier) in [
        ("Tier 1: must isolate", &isolation.must_isolate),
        ("Tier 2: should review", &isolation.should_review),
    ] {
        if tier.is_empty() {
            continue;
        }
        md.push_str(&format!("### {}\n\n", title));
        for v in tier {
            md.push_str(&format!(
                "- `{}` (ratio {:.4}, {})\n",
                v.file_path, v.violation_ratio, v.severity
            ));
        }
        md.push('\n');
    }

    md
}

fn render_components(report: &GovernanceReport) -> String {
    let mut md = String::from("## Component Audit\n\n");

    if report.components.is_empty() {
        md.push_str("No components evaluated.\n");
        return md;
    }

    md.push_str("| Component | Cost | Zone | Severity |\n");
    md.push_str("|-----------|------|------|----------|\n");
    for c in &report.components {
        let zone = match c.zone {
            Zone::Governance => format!("**{}**", c.zone),
            _ => c.zone.to_string(),
        };
        md.push_str(&format!(
            "| `{}` | {:.4} | {} | {} |\n",
            c.path, c.cost, zone, c.severity
        ));
    }

    md
}

fn render_footer(report: &GovernanceReport) -> String {
    format!(
        "---\n\n*Generated by {} (report format {})*\n",
        report.metadata.generator, report.metadata.format_version
    )
}
