//! Effective governance threshold
//!
//! ```text
//! threshold = round3(base[environment] × branch_multiplier(branch))
//! ```
//!
//! The branch multiplier comes from an ordered table of regex rules; the
//! first rule whose pattern matches wins, and unmatched branches get the
//! configured default.

use super::EnvironmentContext;
use crate::config::{BaseThresholds, GovernanceConfig};
use crate::error::GovernanceError;
use crate::models::round_to;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resolved threshold with the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceThreshold {
    pub base: f64,
    pub branch_multiplier: f64,
    /// Pattern of the rule that matched, `None` for the default multiplier
    pub matched_rule: Option<String>,
    /// Always > 0
    pub value: f64,
}

/// Compiled, ordered branch multiplier table
#[derive(Debug, Clone)]
pub struct BranchTable {
    rules: Vec<(Regex, f64)>,
    default_multiplier: f64,
}

impl BranchTable {
    pub fn compile(config: &GovernanceConfig) -> Result<Self, GovernanceError> {
        let rules = config
            .branches
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.multiplier))
                    .map_err(|e| {
                        GovernanceError::Config(format!(
                            "invalid branch pattern '{}': {e}",
                            rule.pattern
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            default_multiplier: config.default_branch_multiplier,
        })
    }

    /// First matching rule's multiplier, with the rule's pattern.
    pub fn lookup(&self, branch: &str) -> (f64, Option<&str>) {
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(branch))
            .map(|(re, multiplier)| (*multiplier, Some(re.as_str())))
            .unwrap_or((self.default_multiplier, None))
    }

    pub fn multiplier(&self, branch: &str) -> f64 {
        self.lookup(branch).0
    }
}

/// Turns an environment context into the effective threshold
#[derive(Debug, Clone)]
pub struct ThresholdResolver {
    bases: BaseThresholds,
    branches: BranchTable,
}

impl ThresholdResolver {
    pub fn new(config: &GovernanceConfig) -> Result<Self, GovernanceError> {
        Ok(Self {
            bases: config.thresholds.clone(),
            branches: BranchTable::compile(config)?,
        })
    }

    pub fn resolve(
        &self,
        context: &EnvironmentContext,
    ) -> Result<GovernanceThreshold, GovernanceError> {
        let base = self.bases.for_environment(context.environment);
        let (branch_multiplier, matched) = self.branches.lookup(&context.branch);
        let value = round_to(base * branch_multiplier, 3);

        if !(value.is_finite() && value > 0.0) {
            return Err(GovernanceError::Config(format!(
                "threshold for {} on '{}' resolved to {} (must be > 0)",
                context.environment, context.branch, value
            )));
        }

        debug!(
            "Threshold {} = {} x {} (rule: {})",
            value,
            base,
            branch_multiplier,
            matched.unwrap_or("default")
        );

        Ok(GovernanceThreshold {
            base,
            branch_multiplier,
            matched_rule: matched.map(str::to_string),
            value,
        })
    }
}
