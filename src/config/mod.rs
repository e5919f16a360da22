//! Configuration module for archgate
//!
//! This module handles:
//! - Project-level configuration (archgate.toml / .archgaterc.json)
//! - Cost weights and file type / phase multipliers
//! - Per-environment base thresholds and the ordered branch table
//! - Zone and emergency limits
//! - Path exclusions

mod project_config;

pub use project_config::{
    glob_match, load_governance_config, BaseThresholds, BranchRule, CostWeights, ExcludeConfig,
    FileTypeMultipliers, GovernanceConfig, GovernanceLimits, IncludeWeights, PhaseMultipliers,
    ReportConfig, CONFIG_FILE_NAME, DEFAULT_EXCLUDE_PATTERNS, JSON_CONFIG_FILE_NAME,
};
