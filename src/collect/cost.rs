//! File classification and cost pricing
//!
//! ```text
//! base  = w_lines * loc + w_complexity * complexity + w_dependency * deps
//!       + w_function * functions + w_include * include_complexity
//! final = base * file_type_multiplier * phase_multiplier
//! ```

use crate::config::{CostWeights, FileTypeMultipliers, GovernanceConfig, PhaseMultipliers};
use crate::models::{FileKind, FileMetrics, Phase};
use std::path::{Path, PathBuf};

const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "pyi"];

const TEST_WORDS: &[&str] = &["test", "tests", "spec", "specs"];

/// Phase keywords, checked in this order against the path's words.
const PHASE_KEYWORDS: &[(Phase, &[&str])] = &[
    (
        Phase::Validation,
        &["test", "tests", "spec", "specs", "validation", "validate", "verify", "qa", "bench"],
    ),
    (
        Phase::Deployment,
        &[
            "deploy",
            "deployment",
            "release",
            "docker",
            "k8s",
            "kubernetes",
            "helm",
            "infra",
            "packaging",
        ],
    ),
    (
        Phase::Design,
        &[
            "design",
            "interface",
            "interfaces",
            "api",
            "proto",
            "protocol",
            "schema",
            "idl",
            "contract",
            "contracts",
        ],
    ),
];

/// A source file with its metrics fully priced.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedFile {
    /// Absolute (or root-joined) path
    pub path: PathBuf,
    /// Path relative to the project root, `/`-separated
    pub relative_path: String,
    pub kind: FileKind,
    pub phase: Phase,
    pub metrics: FileMetrics,
}

/// Split a path into lowercase words on non-alphanumerics and camelCase
/// boundaries: `src/UserSpec_helpers.ts` -> `src user spec helpers ts`.
pub fn path_words(path: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in path.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current).to_lowercase());
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current).to_lowercase());
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}

/// Header, test or implementation, by extension and path words.
pub fn file_kind(relative_path: &str) -> FileKind {
    let lower = relative_path.to_lowercase();
    let ext = Path::new(&lower)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    if HEADER_EXTENSIONS.contains(&ext) || lower.ends_with(".d.ts") {
        return FileKind::Header;
    }
    if path_words(relative_path)
        .iter()
        .any(|w| TEST_WORDS.contains(&w.as_str()))
    {
        return FileKind::Test;
    }
    FileKind::Implementation
}

/// Development phase by path keywords; implementation when nothing matches.
pub fn phase(relative_path: &str) -> Phase {
    let words = path_words(relative_path);
    PHASE_KEYWORDS
        .iter()
        .find(|(_, keywords)| words.iter().any(|w| keywords.contains(&w.as_str())))
        .map(|(phase, _)| *phase)
        .unwrap_or_default()
}

/// Prices raw file metrics into base and final costs.
#[derive(Debug, Clone)]
pub struct CostCalculator {
    weights: CostWeights,
    file_types: FileTypeMultipliers,
    phases: PhaseMultipliers,
}

impl CostCalculator {
    pub fn new(config: &GovernanceConfig) -> Self {
        Self {
            weights: config.weights.clone(),
            file_types: config.file_types.clone(),
            phases: config.phases.clone(),
        }
    }

    pub fn base_cost(&self, metrics: &FileMetrics) -> f64 {
        let w = &self.weights;
        w.lines * metrics.lines_of_code as f64
            + w.complexity * metrics.complexity_factor
            + w.dependency * metrics.dependency_count as f64
            + w.function * metrics.function_count as f64
            + w.include * metrics.include_complexity
    }

    pub fn file_type_multiplier(&self, kind: FileKind) -> f64 {
        match kind {
            FileKind::Implementation => self.file_types.implementation,
            FileKind::Test => self.file_types.test,
            FileKind::Header => self.file_types.header,
        }
    }

    pub fn phase_multiplier(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Design => self.phases.design,
            Phase::Implementation => self.phases.implementation,
            Phase::Validation => self.phases.validation,
            Phase::Deployment => self.phases.deployment,
        }
    }

    /// Fill in `base_cost` and `final_cost` for a file.
    pub fn price(
        &self,
        path: PathBuf,
        relative_path: String,
        mut metrics: FileMetrics,
    ) -> PricedFile {
        let kind = file_kind(&relative_path);
        let phase = phase(&relative_path);

        metrics.base_cost = self.base_cost(&metrics);
        metrics.final_cost =
            metrics.base_cost * self.file_type_multiplier(kind) * self.phase_multiplier(phase);

        PricedFile {
            path,
            relative_path,
            kind,
            phase,
            metrics,
        }
    }
}

/// Phase carrying the largest share of final cost. Ties resolve to the
/// earlier phase in [`Phase::ALL`]; an empty or zero-cost set is
/// implementation.
pub fn dominant_phase<'a>(files: impl IntoIterator<Item = &'a PricedFile>) -> Phase {
    let mut totals = [0.0f64; 4];
    for file in files {
        if let Some(slot) = Phase::ALL.iter().position(|p| *p == file.phase) {
            totals[slot] += file.metrics.final_cost;
        }
    }

    if totals.iter().sum::<f64>() <= 0.0 {
        return Phase::Implementation;
    }

    let mut best = 0;
    for (i, total) in totals.iter().enumerate() {
        if *total > totals[best] {
            best = i;
        }
    }
    Phase::ALL[best]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> CostCalculator {
        CostCalculator::new(&GovernanceConfig::default())
    }

    #[test]
    fn test_path_words() {
        assert_eq!(
            path_words("src/UserSpec_helpers.ts"),
            vec!["src", "user", "spec", "helpers", "ts"]
        );
        assert_eq!(path_words("k8s/deploy-prod.yaml"), vec!["k8s", "deploy", "prod", "yaml"]);
        assert_eq!(path_words("HTTPServer.cpp"), vec!["httpserver", "cpp"]);
    }

    #[test]
    fn test_file_kind() {
        assert_eq!(file_kind("core/engine.h"), FileKind::Header);
        assert_eq!(file_kind("core/engine.HPP"), FileKind::Header);
        assert_eq!(file_kind("web/types.d.ts"), FileKind::Header);
        assert_eq!(file_kind("stubs/mod.pyi"), FileKind::Header);
        assert_eq!(file_kind("core/engine_test.cpp"), FileKind::Test);
        assert_eq!(file_kind("tests/engine.py"), FileKind::Test);
        assert_eq!(file_kind("web/LoginSpec.ts"), FileKind::Test);
        assert_eq!(file_kind("core/engine.cpp"), FileKind::Implementation);
        // "contest" is one word, not a test marker
        assert_eq!(file_kind("contest/score.rs"), FileKind::Implementation);
    }

    #[test]
    fn test_phase_detection() {
        assert_eq!(phase("core/engine.cpp"), Phase::Implementation);
        assert_eq!(phase("api/user.ts"), Phase::Design);
        assert_eq!(phase("proto/messages.rs"), Phase::Design);
        assert_eq!(phase("deploy/rollout.py"), Phase::Deployment);
        assert_eq!(phase("core/engine_test.cpp"), Phase::Validation);
        // validation is checked before design
        assert_eq!(phase("api/tests/user.ts"), Phase::Validation);
        // deployment is checked before design
        assert_eq!(phase("release/api/notes.rs"), Phase::Deployment);
    }

    #[test]
    fn test_base_cost_scenario() {
        // 100 effective lines, no complexity tokens, 2 flat includes
        let metrics = FileMetrics {
            lines_of_code: 100,
            dependency_count: 2,
            ..FileMetrics::default()
        };
        let base = calculator().base_cost(&metrics);
        assert!((base - 0.14).abs() < 1e-9);
        assert!(base < GovernanceConfig::default().limits.autonomous);
    }

    #[test]
    fn test_price_applies_multipliers() {
        let metrics = FileMetrics {
            lines_of_code: 200,
            complexity_factor: 10.0,
            ..FileMetrics::default()
        };
        let calc = calculator();

        let implementation = calc.price(
            PathBuf::from("/p/core/engine.cpp"),
            "core/engine.cpp".into(),
            metrics,
        );
        assert!((implementation.metrics.base_cost - 0.3).abs() < 1e-9);
        assert!((implementation.metrics.final_cost - 0.3).abs() < 1e-9);

        // test kind (0.6) and validation phase (0.7)
        let test = calc.price(
            PathBuf::from("/p/core/engine_test.cpp"),
            "core/engine_test.cpp".into(),
            metrics,
        );
        assert_eq!(test.kind, FileKind::Test);
        assert_eq!(test.phase, Phase::Validation);
        assert!((test.metrics.final_cost - 0.3 * 0.6 * 0.7).abs() < 1e-9);

        // header kind (0.4) in design phase (0.8)
        let header = calc.price(PathBuf::from("/p/api/user.h"), "api/user.h".into(), metrics);
        assert!((header.metrics.final_cost - 0.3 * 0.4 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_include_weight_defaults_to_zero() {
        let metrics = FileMetrics {
            include_complexity: 3.0,
            ..FileMetrics::default()
        };
        assert_eq!(calculator().base_cost(&metrics), 0.0);

        let mut config = GovernanceConfig::default();
        config.weights.include = 0.1;
        let base = CostCalculator::new(&config).base_cost(&metrics);
        assert!((base - 0.3).abs() < 1e-9);
    }

    fn priced(relative: &str, final_cost: f64) -> PricedFile {
        PricedFile {
            path: PathBuf::from(relative),
            relative_path: relative.to_string(),
            kind: file_kind(relative),
            phase: phase(relative),
            metrics: FileMetrics {
                final_cost,
                ..FileMetrics::default()
            },
        }
    }

    #[test]
    fn test_dominant_phase() {
        let files = vec![
            priced("core/a.cpp", 0.2),
            priced("core/a_test.cpp", 0.3),
            priced("core/b.cpp", 0.2),
        ];
        assert_eq!(dominant_phase(&files), Phase::Implementation);

        let files = vec![priced("core/a.cpp", 0.1), priced("core/a_test.cpp", 0.3)];
        assert_eq!(dominant_phase(&files), Phase::Validation);
    }

    #[test]
    fn test_dominant_phase_ties_and_empty() {
        // equal cost: design comes first in Phase::ALL
        let files = vec![priced("api/a.h", 0.2), priced("core/a.cpp", 0.2)];
        assert_eq!(dominant_phase(&files), Phase::Design);

        assert_eq!(dominant_phase(&Vec::<PricedFile>::new()), Phase::Implementation);
        assert_eq!(
            dominant_phase(&vec![priced("api/a.h", 0.0)]),
            Phase::Implementation
        );
    }
}
