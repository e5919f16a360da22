//! Execution environment and branch resolution
//!
//! The environment context is resolved exactly once at the start of a run
//! and then passed by reference; nothing here is cached globally.

mod threshold;

pub use threshold::{BranchTable, GovernanceThreshold, ThresholdResolver};

use crate::git::BranchLookup;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Explicit environment variable naming the environment.
pub const ENVIRONMENT_VAR: &str = "ARCHGATE_ENVIRONMENT";

/// Branch name used when it cannot be determined.
pub const UNKNOWN_BRANCH: &str = "unknown";

/// Variables whose presence marks a CI run.
const CI_SIGNALS: &[&str] = &[
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "JENKINS_URL",
    "BUILDKITE",
    "CIRCLECI",
    "TF_BUILD",
];

/// Variables CI systems use to publish the branch being built.
const CI_BRANCH_VARS: &[&str] = &[
    "GITHUB_HEAD_REF",
    "GITHUB_REF_NAME",
    "CI_COMMIT_REF_NAME",
    "BRANCH_NAME",
];

/// Where a run executes; selects the base threshold and the failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Ci,
    Test,
    Production,
}

impl Environment {
    /// Strict environments fail the run on any violation.
    pub fn is_strict(&self) -> bool {
        matches!(self, Environment::Ci | Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "ci" => Ok(Environment::Ci),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "Unknown environment '{}'. Valid environments: development, ci, test, production",
                other
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Ci => write!(f, "ci"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Source of environment variables
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Environment and branch of the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentContext {
    pub environment: Environment,
    pub branch: String,
}

impl EnvironmentContext {
    pub fn new(environment: Environment, branch: impl Into<String>) -> Self {
        Self {
            environment,
            branch: branch.into(),
        }
    }

    /// Resolve environment and branch.
    ///
    /// Environment: `environment_override` > `ARCHGATE_ENVIRONMENT` > CI
    /// signal > development. Branch: `branch_override` > version control
    /// query > CI branch variables > `"unknown"`. Never fails.
    pub fn resolve(
        project_root: &Path,
        environment_override: Option<Environment>,
        branch_override: Option<&str>,
        env: &dyn EnvSource,
        lookup: &dyn BranchLookup,
    ) -> Self {
        let environment = resolve_environment(environment_override, env);
        let branch = match branch_override {
            Some(branch) if !branch.trim().is_empty() => branch.trim().to_string(),
            _ => resolve_branch(project_root, env, lookup),
        };

        info!("Environment: {}, branch: {}", environment, branch);
        Self {
            environment,
            branch,
        }
    }
}

fn resolve_environment(explicit: Option<Environment>, env: &dyn EnvSource) -> Environment {
    if let Some(environment) = explicit {
        return environment;
    }

    if let Some(value) = env.var(ENVIRONMENT_VAR) {
        match value.parse() {
            Ok(environment) => return environment,
            Err(e) => warn!("Ignoring {}: {}", ENVIRONMENT_VAR, e),
        }
    }

    let ci_flag = env
        .var("CI")
        .is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"));
    if ci_flag || CI_SIGNALS.iter().any(|key| env.var(key).is_some()) {
        debug!("CI signal detected");
        return Environment::Ci;
    }

    Environment::Development
}

fn resolve_branch(project_root: &Path, env: &dyn EnvSource, lookup: &dyn BranchLookup) -> String {
    match lookup.current_branch(project_root) {
        Ok(branch) => return branch,
        Err(e) => warn!("Branch lookup failed, falling back: {}", e),
    }

    CI_BRANCH_VARS
        .iter()
        .filter_map(|key| env.var(key))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN_BRANCH.to_string())
}
