//! JSON reporter
//!
//! Outputs the GovernanceReport as pretty-printed JSON. Key order follows
//! struct field order: `metadata`, `summary`, `violations`,
//! `compliance_status`, `isolation_candidates`.

use crate::models::GovernanceReport;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &GovernanceReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
