//! Project-level governance configuration
//!
//! Loads per-project configuration from `archgate.toml` or
//! `.archgaterc.json` in the project root. Every field has a default, so an
//! empty file (or no file) yields the canonical configuration.
//!
//! # Configuration Format
//!
//! ```toml
//! # archgate.toml
//!
//! [weights]
//! lines = 0.001
//! complexity = 0.01
//! dependency = 0.02
//! function = 0.005
//!
//! [thresholds]
//! development = 0.8
//! ci = 0.6
//!
//! [limits]
//! autonomous = 0.5
//! emergency_count = 5
//!
//! [[branches]]
//! pattern = "^(main|master)$"
//! multiplier = 1.0
//!
//! [exclude]
//! paths = ["generated/"]
//! ```

use crate::environment::Environment;
use crate::error::GovernanceError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Preferred configuration file name.
pub const CONFIG_FILE_NAME: &str = "archgate.toml";
/// Alternative JSON configuration file name.
pub const JSON_CONFIG_FILE_NAME: &str = ".archgaterc.json";

/// Built-in exclusion patterns for vendored, generated and build output.
/// Applied unless `skip_defaults = true`.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/vendor/**",
    "**/node_modules/**",
    "**/third_party/**",
    "**/third-party/**",
    "**/build/**",
    "**/dist/**",
    "**/target/**",
    "**/*.min.js",
];

/// The single configuration value threaded through a governance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default)]
    pub weights: CostWeights,

    #[serde(default)]
    pub includes: IncludeWeights,

    #[serde(default)]
    pub file_types: FileTypeMultipliers,

    #[serde(default)]
    pub phases: PhaseMultipliers,

    #[serde(default)]
    pub thresholds: BaseThresholds,

    #[serde(default)]
    pub limits: GovernanceLimits,

    /// Ordered branch rules, first match wins
    #[serde(default = "default_branch_rules")]
    pub branches: Vec<BranchRule>,

    /// Multiplier for branches no rule matches (including "unknown")
    #[serde(default = "default_branch_multiplier")]
    pub default_branch_multiplier: f64,

    #[serde(default)]
    pub exclude: ExcludeConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            weights: CostWeights::default(),
            includes: IncludeWeights::default(),
            file_types: FileTypeMultipliers::default(),
            phases: PhaseMultipliers::default(),
            thresholds: BaseThresholds::default(),
            limits: GovernanceLimits::default(),
            branches: default_branch_rules(),
            default_branch_multiplier: default_branch_multiplier(),
            exclude: ExcludeConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

/// Weights of the base cost formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    #[serde(default = "default_lines_weight")]
    pub lines: f64,
    #[serde(default = "default_complexity_weight")]
    pub complexity: f64,
    #[serde(default = "default_dependency_weight")]
    pub dependency: f64,
    #[serde(default = "default_function_weight")]
    pub function: f64,
    /// Weight of include complexity (off by default)
    #[serde(default)]
    pub include: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            lines: default_lines_weight(),
            complexity: default_complexity_weight(),
            dependency: default_dependency_weight(),
            function: default_function_weight(),
            include: 0.0,
        }
    }
}

fn default_lines_weight() -> f64 {
    0.001
}
fn default_complexity_weight() -> f64 {
    0.01
}
fn default_dependency_weight() -> f64 {
    0.02
}
fn default_function_weight() -> f64 {
    0.005
}

/// Include complexity added per include/import directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludeWeights {
    /// Target climbs out of its directory (`../`)
    #[serde(default = "default_relative_include")]
    pub relative: f64,
    /// Target has more than three path segments
    #[serde(default = "default_deep_include")]
    pub deep: f64,
    /// Target is qualified by a package or namespace
    #[serde(default = "default_namespaced_include")]
    pub namespaced: f64,
}

impl Default for IncludeWeights {
    fn default() -> Self {
        Self {
            relative: default_relative_include(),
            deep: default_deep_include(),
            namespaced: default_namespaced_include(),
        }
    }
}

fn default_relative_include() -> f64 {
    1.0
}
fn default_deep_include() -> f64 {
    0.5
}
fn default_namespaced_include() -> f64 {
    0.25
}

/// Cost multipliers by file kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTypeMultipliers {
    #[serde(default = "default_implementation_multiplier")]
    pub implementation: f64,
    #[serde(default = "default_test_multiplier")]
    pub test: f64,
    #[serde(default = "default_header_multiplier")]
    pub header: f64,
}

impl Default for FileTypeMultipliers {
    fn default() -> Self {
        Self {
            implementation: default_implementation_multiplier(),
            test: default_test_multiplier(),
            header: default_header_multiplier(),
        }
    }
}

fn default_implementation_multiplier() -> f64 {
    1.0
}
fn default_test_multiplier() -> f64 {
    0.6
}
fn default_header_multiplier() -> f64 {
    0.4
}

/// Cost multipliers by development phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseMultipliers {
    #[serde(default = "default_design_multiplier")]
    pub design: f64,
    #[serde(default = "default_implementation_multiplier")]
    pub implementation: f64,
    #[serde(default = "default_validation_multiplier")]
    pub validation: f64,
    #[serde(default = "default_deployment_multiplier")]
    pub deployment: f64,
}

impl Default for PhaseMultipliers {
    fn default() -> Self {
        Self {
            design: default_design_multiplier(),
            implementation: default_implementation_multiplier(),
            validation: default_validation_multiplier(),
            deployment: default_deployment_multiplier(),
        }
    }
}

fn default_design_multiplier() -> f64 {
    0.8
}
fn default_validation_multiplier() -> f64 {
    0.7
}
fn default_deployment_multiplier() -> f64 {
    0.9
}

/// Base governance threshold per environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseThresholds {
    #[serde(default = "default_development_threshold")]
    pub development: f64,
    #[serde(default = "default_test_threshold")]
    pub test: f64,
    #[serde(default = "default_ci_threshold")]
    pub ci: f64,
    #[serde(default = "default_production_threshold")]
    pub production: f64,
}

impl Default for BaseThresholds {
    fn default() -> Self {
        Self {
            development: default_development_threshold(),
            test: default_test_threshold(),
            ci: default_ci_threshold(),
            production: default_production_threshold(),
        }
    }
}

impl BaseThresholds {
    pub fn for_environment(&self, environment: Environment) -> f64 {
        match environment {
            Environment::Development => self.development,
            Environment::Test => self.test,
            Environment::Ci => self.ci,
            Environment::Production => self.production,
        }
    }
}

fn default_development_threshold() -> f64 {
    0.8
}
fn default_test_threshold() -> f64 {
    0.7
}
fn default_ci_threshold() -> f64 {
    0.6
}
fn default_production_threshold() -> f64 {
    0.5
}

/// Zone boundaries and emergency triggers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceLimits {
    /// Costs at or below this are autonomous
    #[serde(default = "default_autonomous_limit")]
    pub autonomous: f64,
    /// Ratio at which a violation becomes critical
    #[serde(default = "default_critical_multiplier")]
    pub critical_multiplier: f64,
    /// Ratio at which a violation becomes an emergency
    #[serde(default = "default_emergency_multiplier")]
    pub emergency_multiplier: f64,
    /// Critical + emergency violations that force emergency action
    #[serde(default = "default_emergency_count")]
    pub emergency_count: usize,
    /// Violation percentage that forces emergency action
    #[serde(default = "default_emergency_percentage")]
    pub emergency_percentage: f64,
}

impl Default for GovernanceLimits {
    fn default() -> Self {
        Self {
            autonomous: default_autonomous_limit(),
            critical_multiplier: default_critical_multiplier(),
            emergency_multiplier: default_emergency_multiplier(),
            emergency_count: default_emergency_count(),
            emergency_percentage: default_emergency_percentage(),
        }
    }
}

fn default_autonomous_limit() -> f64 {
    0.5
}
fn default_critical_multiplier() -> f64 {
    1.5
}
fn default_emergency_multiplier() -> f64 {
    2.0
}
fn default_emergency_count() -> usize {
    5
}
fn default_emergency_percentage() -> f64 {
    15.0
}

/// One row of the branch multiplier table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRule {
    /// Regular expression matched against the whole branch name
    pub pattern: String,
    pub multiplier: f64,
}

impl BranchRule {
    pub fn new(pattern: &str, multiplier: f64) -> Self {
        Self {
            pattern: pattern.to_string(),
            multiplier,
        }
    }
}

fn default_branch_rules() -> Vec<BranchRule> {
    vec![
        BranchRule::new("^(main|master)$", 1.0),
        BranchRule::new("^(release|hotfix)([/-].*)?$", 1.0),
        BranchRule::new("^(develop|development|dev)$", 1.2),
        BranchRule::new("^(staging|stage)$", 1.1),
        BranchRule::new("^(feature|feat|bugfix|fix)[/-].+", 1.7),
    ]
}

fn default_branch_multiplier() -> f64 {
    1.3
}

/// Path exclusion configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExcludeConfig {
    /// Paths/patterns to exclude, relative to the project root
    #[serde(default)]
    pub paths: Vec<String>,

    /// If true, disable built-in default exclusion patterns
    #[serde(default)]
    pub skip_defaults: bool,
}

impl ExcludeConfig {
    /// Effective exclusion patterns (defaults + user patterns).
    pub fn effective_patterns(&self) -> Vec<String> {
        let mut patterns = Vec::new();

        if !self.skip_defaults {
            patterns.extend(DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()));
        }

        for p in &self.paths {
            if !patterns.contains(p) {
                patterns.push(p.clone());
            }
        }

        patterns
    }

    /// Check a project-relative path (forward slashes) against the patterns
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.effective_patterns()
            .iter()
            .any(|pattern| glob_match(pattern, relative_path))
    }
}

/// Report rendering defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Violations detailed in the console report
    #[serde(default = "default_report_top")]
    pub top: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top: default_report_top(),
        }
    }
}

fn default_report_top() -> usize {
    10
}

impl GovernanceConfig {
    /// Reject configurations that would break cost or threshold invariants.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        let w = &self.weights;
        for (name, value) in [
            ("weights.lines", w.lines),
            ("weights.complexity", w.complexity),
            ("weights.dependency", w.dependency),
            ("weights.function", w.function),
            ("weights.include", w.include),
            ("includes.relative", self.includes.relative),
            ("includes.deep", self.includes.deep),
            ("includes.namespaced", self.includes.namespaced),
            ("file_types.implementation", self.file_types.implementation),
            ("file_types.test", self.file_types.test),
            ("file_types.header", self.file_types.header),
            ("phases.design", self.phases.design),
            ("phases.implementation", self.phases.implementation),
            ("phases.validation", self.phases.validation),
            ("phases.deployment", self.phases.deployment),
            ("limits.autonomous", self.limits.autonomous),
        ] {
            require_non_negative(name, value)?;
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("thresholds.development", t.development),
            ("thresholds.test", t.test),
            ("thresholds.ci", t.ci),
            ("thresholds.production", t.production),
            ("default_branch_multiplier", self.default_branch_multiplier),
        ] {
            require_positive(name, value)?;
        }

        let limits = &self.limits;
        if !limits.critical_multiplier.is_finite() || limits.critical_multiplier < 1.0 {
            return Err(GovernanceError::Config(format!(
                "limits.critical_multiplier must be at least 1.0, got {}",
                limits.critical_multiplier
            )));
        }
        if !limits.emergency_multiplier.is_finite()
            || limits.emergency_multiplier < limits.critical_multiplier
        {
            return Err(GovernanceError::Config(format!(
                "limits.emergency_multiplier ({}) must not be below limits.critical_multiplier ({})",
                limits.emergency_multiplier, limits.critical_multiplier
            )));
        }
        if limits.emergency_count == 0 {
            return Err(GovernanceError::Config(
                "limits.emergency_count must be at least 1".to_string(),
            ));
        }
        if !(limits.emergency_percentage > 0.0 && limits.emergency_percentage <= 100.0) {
            return Err(GovernanceError::Config(format!(
                "limits.emergency_percentage must be in (0, 100], got {}",
                limits.emergency_percentage
            )));
        }

        for (index, rule) in self.branches.iter().enumerate() {
            require_positive(&format!("branches[{index}].multiplier"), rule.multiplier)?;
            Regex::new(&rule.pattern).map_err(|e| {
                GovernanceError::Config(format!(
                    "branches[{index}].pattern '{}' is not a valid regex: {e}",
                    rule.pattern
                ))
            })?;
        }

        Ok(())
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), GovernanceError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GovernanceError::Config(format!(
            "{name} must be a non-negative number, got {value}"
        )))
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), GovernanceError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GovernanceError::Config(format!(
            "{name} must be greater than zero, got {value}"
        )))
    }
}

/// Load governance configuration for a project.
///
/// Looks in this order:
/// 1. `explicit` (must exist when given)
/// 2. `archgate.toml` in the project root
/// 3. `.archgaterc.json` in the project root
///
/// Falls back to defaults when no file exists. A file that exists but
/// cannot be read or parsed is a configuration error.
pub fn load_governance_config(
    project_root: &Path,
    explicit: Option<&Path>,
) -> Result<GovernanceConfig, GovernanceError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(GovernanceError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return load_config_file(path);
    }

    for name in [CONFIG_FILE_NAME, JSON_CONFIG_FILE_NAME] {
        let path = project_root.join(name);
        if path.is_file() {
            return load_config_file(&path);
        }
    }

    debug!("No governance config found, using defaults");
    Ok(GovernanceConfig::default())
}

fn load_config_file(path: &Path) -> Result<GovernanceConfig, GovernanceError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GovernanceError::Config(format!("failed to read {}: {e}", path.display()))
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let config = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str(&content).map_err(|e| e.to_string())
    }
    .map_err(|e| GovernanceError::Config(format!("failed to parse {}: {e}", path.display())))?;

    debug!("Loaded governance config from {}", path.display());
    Ok(config)
}

/// Simple glob pattern matching on forward-slash relative paths
pub fn glob_match(pattern: &str, path: &str) -> bool {
    // **/X/** matches X as any directory segment
    if pattern.starts_with("**/") && pattern.ends_with("/**") {
        let middle = pattern.trim_start_matches("**/").trim_end_matches("/**");
        return path.contains(&format!("/{}/", middle))
            || path.starts_with(&format!("{}/", middle));
    }

    if pattern.contains("**") {
        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if !prefix.is_empty() && !path.starts_with(prefix) {
                return false;
            }

            if let Some((before, after)) = suffix.split_once('*') {
                return path.ends_with(after) && (before.is_empty() || path.contains(before));
            }
            return suffix.is_empty() || path.ends_with(suffix);
        }
    }

    // Single * within a segment
    if let Some((prefix, suffix)) = pattern.split_once('*') {
        if !suffix.contains('*') {
            return path.starts_with(prefix) && path.ends_with(suffix);
        }
    }

    // "generated/" matches "generated/x.c", not "src/generated/x.c"
    path.starts_with(pattern) || path == pattern
}
