//! Violation detection
//!
//! Classifies component costs against the governance threshold:
//!
//! ```text
//!   0 ─────── autonomous ─────── threshold ──────────────────────▶ cost
//!   AUTONOMOUS            WARNING          GOVERNANCE (violation)
//!
//!   ratio = cost / threshold
//!   ratio ≥ emergency_multiplier → EMERGENCY
//!   ratio ≥ critical_multiplier  → CRITICAL
//!   otherwise                    → WARNING
//! ```
//!
//! The governance zone is checked first, so a threshold at or below the
//! autonomous limit still flags costs above it.
//!
//! The run-level summary is built once from the full violation set.
//! Emergency action is required when the critical/emergency count reaches
//! `emergency_count` OR the violation percentage reaches
//! `emergency_percentage`.

use crate::config::GovernanceLimits;
use crate::error::GovernanceError;
use crate::models::{
    round_to, ComponentAssessment, ComponentCost, IsolationCandidates, Severity, Violation,
    ViolationSummary, Zone,
};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Result of the EVALUATE phase
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Violations, highest ratio first
    pub violations: Vec<Violation>,
    /// Every evaluated component, in input order
    pub assessments: Vec<ComponentAssessment>,
    pub summary: ViolationSummary,
    pub isolation: IsolationCandidates,
}

/// Zone and severity classifier
#[derive(Debug, Clone)]
pub struct ViolationDetector {
    limits: GovernanceLimits,
}

impl ViolationDetector {
    pub fn new(limits: &GovernanceLimits) -> Self {
        Self {
            limits: limits.clone(),
        }
    }

    pub fn zone(&self, cost: f64, threshold: f64) -> Zone {
        if cost > threshold {
            Zone::Governance
        } else if cost <= self.limits.autonomous {
            Zone::Autonomous
        } else {
            Zone::Warning
        }
    }

    /// Severity of a governance-zone ratio. Monotonic in `ratio`.
    pub fn severity_for_ratio(&self, ratio: f64) -> Severity {
        if ratio >= self.limits.emergency_multiplier {
            Severity::Emergency
        } else if ratio >= self.limits.critical_multiplier {
            Severity::Critical
        } else {
            Severity::Warning
        }
    }

    /// Zone and severity of one component.
    pub fn assess(&self, path: &str, cost: f64, threshold: f64) -> ComponentAssessment {
        let zone = self.zone(cost, threshold);
        let severity = match zone {
            Zone::Autonomous => Severity::Autonomous,
            Zone::Warning => Severity::Warning,
            Zone::Governance => self.severity_for_ratio(violation_ratio(cost, threshold)),
        };
        ComponentAssessment {
            path: path.to_string(),
            cost,
            zone,
            severity,
        }
    }

    /// Classify every component and build the summary.
    ///
    /// `files_scanned` is carried into the summary as-is.
    pub fn evaluate(
        &self,
        components: &[ComponentCost],
        threshold: f64,
        files_scanned: usize,
    ) -> Result<Evaluation, GovernanceError> {
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(GovernanceError::invariant(
                format!("threshold must be positive, got {}", threshold),
                files_scanned,
            ));
        }

        let mut assessments = Vec::with_capacity(components.len());
        let mut violations = Vec::new();

        for component in components {
            if component.cost.is_nan() || component.cost < 0.0 {
                return Err(GovernanceError::invariant(
                    format!("component {} has negative cost {}", component.name, component.cost),
                    files_scanned,
                ));
            }

            let assessment = self.assess(&component.name, component.cost, threshold);
            if assessment.zone == Zone::Governance {
                let violation = Violation {
                    file_path: component.name.clone(),
                    cost: component.cost,
                    threshold,
                    severity: assessment.severity,
                    violation_ratio: violation_ratio(component.cost, threshold),
                };
                debug!(
                    "Violation: {} cost {:.4} ratio {:.4} ({})",
                    violation.file_path,
                    violation.cost,
                    violation.violation_ratio,
                    violation.severity
                );
                violations.push(violation);
            }
            assessments.push(assessment);
        }

        violations.sort_by(by_ratio_then_path);

        let summary = self.summarize(&assessments, &violations, files_scanned);
        let isolation = self.isolation_candidates(&violations);
        info!(
            "Evaluated {} components: {} violations ({:.2}%)",
            summary.total_files, summary.total_violations, summary.violation_percentage
        );

        Ok(Evaluation {
            violations,
            assessments,
            summary,
            isolation,
        })
    }

    /// Run-level summary over all evaluated components.
    pub fn summarize(
        &self,
        assessments: &[ComponentAssessment],
        violations: &[Violation],
        files_scanned: usize,
    ) -> ViolationSummary {
        let total_files = assessments.len();
        let total_violations = violations.len();
        let critical_violations = violations
            .iter()
            .filter(|v| v.severity == Severity::Critical)
            .count();
        let emergency_violations = violations
            .iter()
            .filter(|v| v.severity == Severity::Emergency)
            .count();

        let exact_percentage = if total_files == 0 {
            0.0
        } else {
            total_violations as f64 / total_files as f64 * 100.0
        };

        // Compared unrounded; rounding is for the report only
        let emergency_action_required = critical_violations + emergency_violations
            >= self.limits.emergency_count
            || exact_percentage >= self.limits.emergency_percentage;
        let violation_percentage = round_to(exact_percentage, 2);

        ViolationSummary {
            total_files,
            total_violations,
            critical_violations,
            emergency_violations,
            autonomous_components: assessments
                .iter()
                .filter(|a| a.zone == Zone::Autonomous)
                .count(),
            warning_zone_components: assessments
                .iter()
                .filter(|a| a.zone == Zone::Warning)
                .count(),
            violation_percentage,
            emergency_action_required,
            files_scanned,
        }
    }

    /// Split violations into isolation tiers, each highest ratio first.
    pub fn isolation_candidates(&self, violations: &[Violation]) -> IsolationCandidates {
        let (mut must_isolate, mut should_review): (Vec<Violation>, Vec<Violation>) =
            violations.iter().cloned().partition(|v| {
                v.severity >= Severity::Critical
                    || v.violation_ratio >= self.limits.critical_multiplier
            });

        must_isolate.sort_by(by_ratio_then_path);
        should_review.sort_by(by_ratio_then_path);

        IsolationCandidates {
            must_isolate,
            should_review,
        }
    }
}

/// `cost / threshold` rounded to 4 decimals.
pub fn violation_ratio(cost: f64, threshold: f64) -> f64 {
    round_to(cost / threshold, 4)
}

fn by_ratio_then_path(a: &Violation, b: &Violation) -> Ordering {
    b.violation_ratio
        .partial_cmp(&a.violation_ratio)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.file_path.cmp(&b.file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileMetrics, Phase};
    use std::path::PathBuf;

    fn detector() -> ViolationDetector {
        ViolationDetector::new(&GovernanceLimits::default())
    }

    fn component(name: &str, cost: f64) -> ComponentCost {
        ComponentCost {
            name: name.to_string(),
            path: PathBuf::from(name),
            cost,
            file_count: 1,
            metrics: FileMetrics::default(),
            dominant_phase: Phase::Implementation,
        }
    }

    #[test]
    fn test_zones() {
        let d = detector();
        assert_eq!(d.zone(0.14, 0.6), Zone::Autonomous);
        assert_eq!(d.zone(0.5, 0.6), Zone::Autonomous);
        assert_eq!(d.zone(0.55, 0.6), Zone::Warning);
        assert_eq!(d.zone(0.6, 0.6), Zone::Warning);
        assert_eq!(d.zone(0.61, 0.6), Zone::Governance);
        // threshold below the autonomous limit still governs
        assert_eq!(d.zone(0.45, 0.4), Zone::Governance);
    }

    #[test]
    fn test_autonomous_component_has_no_violation() {
        let eval = detector()
            .evaluate(&[component("core", 0.14)], 0.6, 1)
            .expect("evaluate");
        assert!(eval.violations.is_empty());
        assert_eq!(eval.assessments[0].zone, Zone::Autonomous);
        assert_eq!(eval.summary.autonomous_components, 1);
    }

    #[test]
    fn test_critical_boundary_is_inclusive() {
        let eval = detector()
            .evaluate(&[component("core", 0.9)], 0.6, 1)
            .expect("evaluate");
        let v = &eval.violations[0];
        assert_eq!(v.violation_ratio, 1.5);
        assert_eq!(v.severity, Severity::Critical);
        assert_eq!(eval.isolation.must_isolate.len(), 1);
    }

    #[test]
    fn test_emergency_is_tier_one() {
        let eval = detector()
            .evaluate(&[component("core", 1.3), component("net", 0.7)], 0.6, 2)
            .expect("evaluate");
        assert_eq!(eval.violations[0].file_path, "core");
        assert_eq!(eval.violations[0].violation_ratio, 2.1667);
        assert_eq!(eval.violations[0].severity, Severity::Emergency);
        assert_eq!(eval.summary.emergency_violations, 1);

        let tier1: Vec<&str> = eval
            .isolation
            .must_isolate
            .iter()
            .map(|v| v.file_path.as_str())
            .collect();
        let tier2: Vec<&str> = eval
            .isolation
            .should_review
            .iter()
            .map(|v| v.file_path.as_str())
            .collect();
        assert_eq!(tier1, vec!["core"]);
        assert_eq!(tier2, vec!["net"]);
    }

    #[test]
    fn test_percentage_alone_requires_emergency_action() {
        let mut components: Vec<ComponentCost> = (0..16)
            .map(|i| component(&format!("ok{:02}", i), 0.2))
            .collect();
        components.extend((0..4).map(|i| component(&format!("hot{}", i), 0.7)));

        let eval = detector().evaluate(&components, 0.6, 40).expect("evaluate");
        let s = &eval.summary;
        assert_eq!(s.total_files, 20);
        assert_eq!(s.total_violations, 4);
        assert_eq!(s.critical_violations + s.emergency_violations, 0);
        assert!(eval.violations.iter().all(|v| v.severity == Severity::Warning));
        assert_eq!(s.violation_percentage, 20.0);
        assert!(s.emergency_action_required);
        assert_eq!(s.files_scanned, 40);
    }

    #[test]
    fn test_percentage_just_below_limit_is_not_emergency() {
        // 1000 / 6667 = 14.99925%, reported as 15.0
        let mut components: Vec<ComponentCost> = (0..5667)
            .map(|i| component(&format!("ok{:04}", i), 0.1))
            .collect();
        components.extend((0..1000).map(|i| component(&format!("hot{:04}", i), 0.7)));

        let eval = detector()
            .evaluate(&components, 0.6, 6667)
            .expect("evaluate");
        assert_eq!(eval.summary.total_violations, 1000);
        assert_eq!(eval.summary.violation_percentage, 15.0);
        assert!(!eval.summary.emergency_action_required);
    }

    #[test]
    fn test_count_alone_requires_emergency_action() {
        let mut components: Vec<ComponentCost> = (0..95)
            .map(|i| component(&format!("ok{:03}", i), 0.1))
            .collect();
        components.extend((0..5).map(|i| component(&format!("hot{}", i), 1.0)));

        let s = detector().evaluate(&components, 0.6, 100).expect("evaluate").summary;
        assert_eq!(s.violation_percentage, 5.0);
        assert_eq!(s.critical_violations, 5);
        assert!(s.emergency_action_required);
    }

    #[test]
    fn test_below_both_limits_no_emergency() {
        let mut components: Vec<ComponentCost> = (0..96)
            .map(|i| component(&format!("ok{:03}", i), 0.1))
            .collect();
        components.extend((0..4).map(|i| component(&format!("hot{}", i), 1.0)));

        let s = detector().evaluate(&components, 0.6, 100).expect("evaluate").summary;
        assert_eq!(s.critical_violations, 4);
        assert_eq!(s.violation_percentage, 4.0);
        assert!(!s.emergency_action_required);
    }

    #[test]
    fn test_empty_evaluation_is_zero_percent() {
        let eval = detector().evaluate(&[], 0.6, 0).expect("evaluate");
        assert_eq!(eval.summary.total_files, 0);
        assert_eq!(eval.summary.violation_percentage, 0.0);
        assert!(!eval.summary.emergency_action_required);
    }

    #[test]
    fn test_severity_is_monotonic_in_ratio() {
        let d = detector();
        let mut previous = Severity::Warning;
        for step in 0..=400 {
            let ratio = 1.0 + step as f64 * 0.005;
            let severity = d.severity_for_ratio(ratio);
            assert!(severity >= previous, "ratio {} dropped severity", ratio);
            previous = severity;
        }
        assert_eq!(previous, Severity::Emergency);
    }

    #[test]
    fn test_custom_limits() {
        let limits = GovernanceLimits {
            critical_multiplier: 1.2,
            emergency_multiplier: 1.4,
            ..GovernanceLimits::default()
        };
        let d = ViolationDetector::new(&limits);
        assert_eq!(d.severity_for_ratio(1.1), Severity::Warning);
        assert_eq!(d.severity_for_ratio(1.2), Severity::Critical);
        assert_eq!(d.severity_for_ratio(1.4), Severity::Emergency);
    }

    #[test]
    fn test_warning_zone_counted() {
        let eval = detector()
            .evaluate(&[component("a", 0.55), component("b", 0.1)], 0.6, 2)
            .expect("evaluate");
        assert_eq!(eval.summary.warning_zone_components, 1);
        assert_eq!(eval.summary.autonomous_components, 1);
        assert_eq!(eval.assessments[0].severity, Severity::Warning);
        assert!(eval.violations.is_empty());
    }

    #[test]
    fn test_violations_sorted_by_ratio_then_path() {
        let eval = detector()
            .evaluate(
                &[
                    component("b", 0.7),
                    component("a", 0.7),
                    component("c", 1.0),
                ],
                0.6,
                3,
            )
            .expect("evaluate");
        let order: Vec<&str> = eval.violations.iter().map(|v| v.file_path.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_non_positive_threshold_is_invariant_error() {
        let err = detector()
            .evaluate(&[component("core", 0.1)], 0.0, 3)
            .expect_err("zero threshold");
        assert!(matches!(err, GovernanceError::Invariant { .. }));
        assert_eq!(err.files_processed(), 3);
    }

    #[test]
    fn test_negative_cost_is_invariant_error() {
        let err = detector()
            .evaluate(&[component("core", -0.1)], 0.6, 1)
            .expect_err("negative cost");
        assert!(matches!(err, GovernanceError::Invariant { .. }));
    }
}
