//! Sampling rules.
//!
//! A rule defines one sampling lattice over the block sequence: every
//! `interval`-th block starting at `start_offset`, split into `row_count`
//! periodic rows. Rules are authored externally and are read-only here.

use serde::{Deserialize, Serialize};

fn default_one() -> u64 {
    1
}

fn default_one_usize() -> usize {
    1
}

/// One independently configured sampling rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_one")]
    pub interval: u64,
    /// 0 means absolute alignment (`height mod interval == 0`).
    #[serde(default)]
    pub start_offset: u64,
    #[serde(default = "default_one_usize")]
    pub row_count: usize,
    #[serde(default = "default_one_usize")]
    pub streak_threshold: usize,
}

impl Rule {
    pub fn new(id: impl Into<String>, interval: u64) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            interval,
            start_offset: 0,
            row_count: 1,
            streak_threshold: 1,
        }
    }

    pub fn with_offset(mut self, start_offset: u64) -> Self {
        self.start_offset = start_offset;
        self
    }

    pub fn with_rows(mut self, row_count: usize) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn with_threshold(mut self, streak_threshold: usize) -> Self {
        self.streak_threshold = streak_threshold;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Interval clamped to at least 1. A zero interval samples every block.
    pub fn step(&self) -> u64 {
        self.interval.max(1)
    }

    /// Row count clamped to at least 1.
    pub fn rows(&self) -> usize {
        self.row_count.max(1)
    }

    /// Streak threshold clamped to at least 1.
    pub fn threshold(&self) -> usize {
        self.streak_threshold.max(1)
    }

    /// Display label, falling back to the id.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    /// Whether a block at `height` lies on this rule's lattice.
    pub fn matches(&self, height: u64) -> bool {
        if self.interval <= 1 {
            return true;
        }
        if self.start_offset > 0 {
            height >= self.start_offset && (height - self.start_offset) % self.interval == 0
        } else {
            height % self.interval == 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_zero_and_one_match_everything() {
        for interval in [0, 1] {
            let rule = Rule::new("r", interval).with_offset(50);
            assert!(rule.matches(0));
            assert!(rule.matches(7));
            assert!(rule.matches(49));
        }
    }

    #[test]
    fn test_absolute_alignment() {
        for k in 2..12u64 {
            let rule = Rule::new("r", k);
            assert!(rule.matches(3 * k), "3k must match for k={k}");
            assert!(!rule.matches(3 * k + 1), "3k+1 must not match for k={k}");
        }
    }

    #[test]
    fn test_offset_alignment() {
        let rule = Rule::new("r", 5).with_offset(3);
        assert!(!rule.matches(0));
        assert!(rule.matches(3));
        assert!(rule.matches(8));
        assert!(rule.matches(103));
        assert!(!rule.matches(5));
        assert!(!rule.matches(10));
    }

    #[test]
    fn test_heights_below_offset_excluded() {
        let rule = Rule::new("r", 2).with_offset(10);
        assert!(!rule.matches(2));
        assert!(!rule.matches(8));
        assert!(rule.matches(10));
    }

    #[test]
    fn test_clamped_accessors() {
        let rule = Rule {
            id: "broken".to_string(),
            label: String::new(),
            interval: 0,
            start_offset: 0,
            row_count: 0,
            streak_threshold: 0,
        };
        assert_eq!(rule.step(), 1);
        assert_eq!(rule.rows(), 1);
        assert_eq!(rule.threshold(), 1);
        assert_eq!(rule.display_label(), "broken");
    }

    #[test]
    fn test_rule_deserialize_defaults() {
        let rule: Rule = serde_json::from_str(r#"{"id": "every-3", "interval": 3}"#).unwrap();
        assert_eq!(rule.start_offset, 0);
        assert_eq!(rule.row_count, 1);
        assert_eq!(rule.streak_threshold, 1);
    }
}
