//! JSON inputs: rules, blocks and the watch set.
//!
//! All three are plain JSON arrays. Rules are validated only as far as ids
//! go; out-of-range numbers are clamped where they are used.

use std::collections::HashSet;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::block::Block;
use crate::pattern::{WatchSet, WatchedPattern};
use crate::rule::Rule;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("rule id must not be empty (rule #{0})")]
    EmptyRuleId(usize),
    #[error("duplicate rule id '{0}'")]
    DuplicateRuleId(String),
    #[error("rule id '{0}' must not contain '|' or ';'")]
    InvalidRuleId(String),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

/// Check rule ids are present, unique and free of key delimiters.
pub fn validate_rules(rules: &[Rule]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (i, rule) in rules.iter().enumerate() {
        if rule.id.trim().is_empty() {
            return Err(ConfigError::EmptyRuleId(i));
        }
        // both characters delimit record keys and fingerprints
        if rule.id.contains(['|', ';']) {
            return Err(ConfigError::InvalidRuleId(rule.id.clone()));
        }
        if !seen.insert(rule.id.as_str()) {
            return Err(ConfigError::DuplicateRuleId(rule.id.clone()));
        }
        if rule.interval == 0 || rule.row_count == 0 || rule.streak_threshold == 0 {
            log::warn!("Rule '{}' has zero-valued settings, treating them as 1", rule.id);
        }
    }
    Ok(())
}

/// Load and validate a rules file.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, ConfigError> {
    let rules: Vec<Rule> = read_json(path)?;
    validate_rules(&rules)?;
    Ok(rules)
}

/// Load a blocks file. Order does not matter.
pub fn load_blocks(path: &Path) -> Result<Vec<Block>, ConfigError> {
    read_json(path)
}

/// Load a watch-set file.
pub fn load_watched(path: &Path) -> Result<WatchSet, ConfigError> {
    let patterns: Vec<WatchedPattern> = read_json(path)?;
    Ok(patterns.into_iter().collect())
}
