//! Core data models for archgate
//!
//! These models flow through the whole engine: raw per-file metrics,
//! aggregated component costs, violations and the run-level summary that
//! reporters render.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Raw heuristic metrics for one source file.
///
/// A pure function of the file's bytes; computed fresh every run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FileMetrics {
    pub lines_of_code: usize,
    pub complexity_factor: f64,
    pub dependency_count: usize,
    pub include_complexity: f64,
    pub function_count: usize,
    pub base_cost: f64,
    pub final_cost: f64,
}

impl FileMetrics {
    /// Accumulate another file's metrics into this one.
    pub fn absorb(&mut self, other: &FileMetrics) {
        self.lines_of_code += other.lines_of_code;
        self.complexity_factor += other.complexity_factor;
        self.dependency_count += other.dependency_count;
        self.include_complexity += other.include_complexity;
        self.function_count += other.function_count;
        self.base_cost += other.base_cost;
        self.final_cost += other.final_cost;
    }
}

/// What kind of source file a path is, for the file type multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Implementation,
    Test,
    Header,
}

/// Development phase a file belongs to, inferred from its path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Design,
    #[default]
    Implementation,
    Validation,
    Deployment,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Design,
        Phase::Implementation,
        Phase::Validation,
        Phase::Deployment,
    ];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Design => write!(f, "design"),
            Phase::Implementation => write!(f, "implementation"),
            Phase::Validation => write!(f, "validation"),
            Phase::Deployment => write!(f, "deployment"),
        }
    }
}

/// Aggregated cost of one component (directory subtree).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCost {
    pub name: String,
    pub path: PathBuf,
    /// Sum of final file costs in the subtree, rounded to 4 decimals
    pub cost: f64,
    pub file_count: usize,
    pub metrics: FileMetrics,
    pub dominant_phase: Phase,
}

/// Where a cost sits relative to the autonomous limit and the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Autonomous,
    Warning,
    Governance,
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Autonomous => write!(f, "autonomous"),
            Zone::Warning => write!(f, "warning"),
            Zone::Governance => write!(f, "governance"),
        }
    }
}

/// Severity of a component. Only `Warning` and above ever appear on a
/// [`Violation`]; `Autonomous` is the severity of anything not in the
/// governance zone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Autonomous,
    Warning,
    Critical,
    Emergency,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Autonomous => write!(f, "autonomous"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
            Severity::Emergency => write!(f, "emergency"),
        }
    }
}

/// A component whose cost exceeds the governance threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub file_path: String,
    pub cost: f64,
    pub threshold: f64,
    pub severity: Severity,
    /// cost / threshold, rounded to 4 decimals
    pub violation_ratio: f64,
}

/// Zone and severity of a single evaluated component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentAssessment {
    pub path: String,
    pub cost: f64,
    pub zone: Zone,
    pub severity: Severity,
}

/// Run-level violation summary, built once from the full violation set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViolationSummary {
    /// Units evaluated (components)
    pub total_files: usize,
    pub total_violations: usize,
    pub critical_violations: usize,
    pub emergency_violations: usize,
    pub autonomous_components: usize,
    pub warning_zone_components: usize,
    /// In [0, 100]; 0 when nothing was evaluated
    pub violation_percentage: f64,
    pub emergency_action_required: bool,
    /// Source files read during collection
    pub files_scanned: usize,
}

/// Components flagged for extraction or review, by tier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IsolationCandidates {
    /// Tier 1: emergency or critical
    pub must_isolate: Vec<Violation>,
    /// Tier 2: any remaining governance-zone violation
    pub should_review: Vec<Violation>,
}

/// Report header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub generator: String,
    pub format_version: String,
    pub environment: String,
    pub branch: String,
    pub threshold: f64,
    pub autonomous_limit: f64,
}

/// Compliance verdict block of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceStatus {
    pub compliant: bool,
    pub emergency_action_required: bool,
    pub governance_level: String,
}

/// Everything a reporter needs; every format renders from this one value.
///
/// Field order is the JSON key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceReport {
    pub metadata: ReportMetadata,
    pub summary: ViolationSummary,
    pub violations: Vec<Violation>,
    pub compliance_status: ComplianceStatus,
    pub isolation_candidates: IsolationCandidates,
    /// Per-component detail, rendered by the Markdown audit table
    #[serde(skip)]
    pub components: Vec<ComponentAssessment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.9 / 0.6, 4), 1.5);
        assert_eq!(round_to(1.3 / 0.6, 4), 2.1667);
        assert_eq!(round_to(0.6 * 1.7, 3), 1.02);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Autonomous < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert!(Severity::Critical < Severity::Emergency);
    }

    #[test]
    fn test_absorb_sums_fields() {
        let mut total = FileMetrics::default();
        let file = FileMetrics {
            lines_of_code: 10,
            complexity_factor: 2.5,
            dependency_count: 1,
            include_complexity: 0.5,
            function_count: 3,
            base_cost: 0.1,
            final_cost: 0.05,
        };
        total.absorb(&file);
        total.absorb(&file);
        assert_eq!(total.lines_of_code, 20);
        assert_eq!(total.function_count, 6);
        assert!((total.complexity_factor - 5.0).abs() < 1e-9);
        assert!((total.final_cost - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Emergency).expect("serialize");
        assert_eq!(json, "\"emergency\"");
    }
}
