//! Summaries over the streak record list.
//!
//! Always a full recomputation; [`summarize`] returns `None` for an empty
//! list so callers can tell "no data" apart from a zero-filled summary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::block::OutcomeClass;
use crate::pattern::DetectionMode;
use crate::record::StreakRecord;

/// Max lengths at or above this fall into the `10+` bucket.
pub const OPEN_BUCKET_START: usize = 10;

/// Streak-length bucket: exact below 10, `10+` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LengthBucket {
    Exact(usize),
    TenPlus,
}

impl LengthBucket {
    pub fn of(length: usize) -> Self {
        if length < OPEN_BUCKET_START {
            LengthBucket::Exact(length)
        } else {
            LengthBucket::TenPlus
        }
    }
}

impl fmt::Display for LengthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthBucket::Exact(n) => write!(f, "{n}"),
            LengthBucket::TenPlus => write!(f, "{OPEN_BUCKET_START}+"),
        }
    }
}

impl Serialize for LengthBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Record counts per raw class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub odd: usize,
    pub even: usize,
    pub big: usize,
    pub small: usize,
}

impl ClassCounts {
    fn add(&mut self, class: OutcomeClass) {
        match class {
            OutcomeClass::Odd => self.odd += 1,
            OutcomeClass::Even => self.even += 1,
            OutcomeClass::Big => self.big += 1,
            OutcomeClass::Small => self.small += 1,
        }
    }

    pub fn get(&self, class: OutcomeClass) -> usize {
        match class {
            OutcomeClass::Odd => self.odd,
            OutcomeClass::Even => self.even,
            OutcomeClass::Big => self.big,
            OutcomeClass::Small => self.small,
        }
    }
}

/// Record counts per detection mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModeCounts {
    pub sequence: usize,
    pub row: usize,
}

impl ModeCounts {
    fn add(&mut self, mode: DetectionMode) {
        match mode {
            DetectionMode::Sequence => self.sequence += 1,
            DetectionMode::Row => self.row += 1,
        }
    }
}

/// Per-rule breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleStats {
    pub rule_label: String,
    pub total: usize,
    pub by_mode: ModeCounts,
    pub by_class: ClassCounts,
    pub by_length: BTreeMap<LengthBucket, usize>,
}

/// All four aggregates over a non-empty record list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreakStats {
    pub total: usize,
    pub by_class: ClassCounts,
    pub by_mode: ModeCounts,
    pub by_length: BTreeMap<LengthBucket, usize>,
    /// Keyed by rule id.
    pub by_rule: BTreeMap<String, RuleStats>,
}

/// Reduce `records` into [`StreakStats`], or `None` when there are none.
pub fn summarize<'a>(records: impl IntoIterator<Item = &'a StreakRecord>) -> Option<StreakStats> {
    let mut stats = StreakStats::default();

    for record in records {
        let bucket = LengthBucket::of(record.max_streak_length);

        stats.total += 1;
        stats.by_class.add(record.class);
        stats.by_mode.add(record.mode);
        *stats.by_length.entry(bucket).or_insert(0) += 1;

        let rule = stats
            .by_rule
            .entry(record.rule_id.clone())
            .or_insert_with(|| RuleStats {
                rule_label: record.rule_label.clone(),
                ..Default::default()
            });
        rule.total += 1;
        rule.by_mode.add(record.mode);
        rule.by_class.add(record.class);
        *rule.by_length.entry(bucket).or_insert(0) += 1;
    }

    (stats.total > 0).then_some(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::StreakObservation;

    fn record(rule: &str, mode: DetectionMode, class: OutcomeClass, max: usize) -> StreakRecord {
        let obs = StreakObservation {
            rule_id: rule.to_string(),
            rule_label: format!("Rule {rule}"),
            dimension: class.dimension(),
            mode,
            row_index: (mode == DetectionMode::Row).then_some(0),
            class,
            length: max,
            predicted_next_height: 0,
        };
        StreakRecord::from_observation(&obs, 0)
    }

    #[test]
    fn test_empty_is_no_data() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn test_all_four_aggregates() {
        use DetectionMode::*;
        use OutcomeClass::*;
        let records = vec![
            record("a", Sequence, Odd, 3),
            record("a", Row, Odd, 12),
            record("a", Sequence, Big, 9),
            record("b", Sequence, Small, 10),
            record("b", Row, Even, 3),
        ];
        let stats = summarize(&records).unwrap();

        assert_eq!(stats.total, 5);
        assert_eq!(
            stats.by_class,
            ClassCounts {
                odd: 2,
                even: 1,
                big: 1,
                small: 1
            }
        );
        assert_eq!(stats.by_mode, ModeCounts { sequence: 3, row: 2 });
        assert_eq!(stats.by_length.get(&LengthBucket::Exact(3)), Some(&2));
        assert_eq!(stats.by_length.get(&LengthBucket::Exact(9)), Some(&1));
        assert_eq!(stats.by_length.get(&LengthBucket::TenPlus), Some(&2));

        let a = &stats.by_rule["a"];
        assert_eq!(a.rule_label, "Rule a");
        assert_eq!(a.total, 3);
        assert_eq!(a.by_mode, ModeCounts { sequence: 2, row: 1 });
        assert_eq!(a.by_class.get(Odd), 2);
        assert_eq!(a.by_length.get(&LengthBucket::TenPlus), Some(&1));

        let b = &stats.by_rule["b"];
        assert_eq!(b.total, 2);
        assert_eq!(b.by_class.get(Small), 1);
        assert_eq!(b.by_length.get(&LengthBucket::Exact(3)), Some(&1));
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(LengthBucket::of(1), LengthBucket::Exact(1));
        assert_eq!(LengthBucket::of(9), LengthBucket::Exact(9));
        assert_eq!(LengthBucket::of(10), LengthBucket::TenPlus);
        assert_eq!(LengthBucket::of(250), LengthBucket::TenPlus);
        assert!(LengthBucket::Exact(9) < LengthBucket::TenPlus);
    }

    #[test]
    fn test_serializes_bucket_keys_as_strings() {
        let records = vec![record("a", DetectionMode::Sequence, OutcomeClass::Odd, 11)];
        let json = serde_json::to_value(summarize(&records).unwrap()).unwrap();
        assert_eq!(json["by_length"]["10+"], 1);
        assert_eq!(json["by_rule"]["a"]["by_mode"]["sequence"], 1);
    }
}
