//! Persistent streak records.
//!
//! One [`StreakRecord`] exists per identity key
//! (`rule|dimension|mode|row|class`). The [`RecordBook`] indexes records by
//! that key and keeps first-sighting order as a secondary view for display
//! and serialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::{Dimension, OutcomeClass};
use crate::pattern::{DetectionMode, StreakObservation};

/// Longest streak ever seen for one signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub id: String,
    /// Milliseconds since the Unix epoch; bumped when the max length grows.
    pub created_at: u64,
    pub rule_id: String,
    pub rule_label: String,
    pub dimension: Dimension,
    pub mode: DetectionMode,
    pub class: OutcomeClass,
    pub max_streak_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
}

impl StreakRecord {
    /// New record for a first sighting.
    pub fn from_observation(obs: &StreakObservation, now_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now_ms,
            rule_id: obs.rule_id.clone(),
            rule_label: obs.rule_label.clone(),
            dimension: obs.dimension,
            mode: obs.mode,
            class: obs.class,
            max_streak_length: obs.length,
            row_index: obs.row_index,
        }
    }

    /// Same format as [`StreakObservation::identity_key`].
    pub fn identity_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.rule_id,
            self.dimension,
            self.mode,
            self.row_index.map(|r| r.to_string()).unwrap_or_default(),
            self.class
        )
    }
}

/// Effect of folding one observation into a [`RecordBook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    Created,
    Extended,
    Unchanged,
}

/// Records indexed by identity key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBook {
    by_key: HashMap<String, StreakRecord>,
    order: Vec<String>,
}

impl RecordBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from a persisted list.
    ///
    /// Duplicate identity keys collapse into one record carrying the larger
    /// max length.
    pub fn from_records(records: impl IntoIterator<Item = StreakRecord>) -> Self {
        let mut book = Self::new();
        for record in records {
            let key = record.identity_key();
            match book.by_key.get_mut(&key) {
                Some(existing) => {
                    if record.max_streak_length > existing.max_streak_length {
                        *existing = record;
                    }
                }
                None => {
                    book.order.push(key.clone());
                    book.by_key.insert(key, record);
                }
            }
        }
        book
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, identity_key: &str) -> Option<&StreakRecord> {
        self.by_key.get(identity_key)
    }

    /// Records in first-sighting order.
    pub fn iter(&self) -> impl Iterator<Item = &StreakRecord> {
        self.order.iter().filter_map(|key| self.by_key.get(key))
    }

    pub fn to_vec(&self) -> Vec<StreakRecord> {
        self.iter().cloned().collect()
    }

    /// Fold one observation in: create on first sighting, raise the max on a
    /// longer one. The max length never decreases.
    pub fn observe(&mut self, obs: &StreakObservation, now_ms: u64) -> RecordChange {
        let key = obs.identity_key();
        match self.by_key.get_mut(&key) {
            Some(record) if obs.length > record.max_streak_length => {
                record.max_streak_length = obs.length;
                record.created_at = now_ms;
                RecordChange::Extended
            }
            Some(_) => RecordChange::Unchanged,
            None => {
                self.by_key
                    .insert(key.clone(), StreakRecord::from_observation(obs, now_ms));
                self.order.push(key);
                RecordChange::Created
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(rule: &str, row: Option<usize>, class: OutcomeClass, length: usize) -> StreakObservation {
        StreakObservation {
            rule_id: rule.to_string(),
            rule_label: rule.to_uppercase(),
            dimension: class.dimension(),
            mode: if row.is_some() {
                DetectionMode::Row
            } else {
                DetectionMode::Sequence
            },
            row_index: row,
            class,
            length,
            predicted_next_height: 0,
        }
    }

    #[test]
    fn test_observe_creates_then_extends() {
        let mut book = RecordBook::new();
        let first = obs("r1", None, OutcomeClass::Odd, 3);
        assert_eq!(book.observe(&first, 100), RecordChange::Created);

        let longer = obs("r1", None, OutcomeClass::Odd, 5);
        assert_eq!(book.observe(&longer, 200), RecordChange::Extended);

        let record = book.get(&first.identity_key()).unwrap();
        assert_eq!(record.max_streak_length, 5);
        assert_eq!(record.created_at, 200);
        assert_eq!(record.rule_label, "R1");
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_max_length_never_decreases() {
        let mut book = RecordBook::new();
        let key = obs("r1", Some(1), OutcomeClass::Big, 1).identity_key();
        let mut best = 0;
        for (t, length) in [4, 2, 7, 1, 7, 3, 9, 2].into_iter().enumerate() {
            book.observe(&obs("r1", Some(1), OutcomeClass::Big, length), t as u64);
            let current = book.get(&key).unwrap().max_streak_length;
            assert!(current >= best);
            best = current;
        }
        assert_eq!(best, 9);
    }

    #[test]
    fn test_shorter_sighting_keeps_timestamp() {
        let mut book = RecordBook::new();
        book.observe(&obs("r1", None, OutcomeClass::Even, 6), 10);
        assert_eq!(
            book.observe(&obs("r1", None, OutcomeClass::Even, 2), 20),
            RecordChange::Unchanged
        );
        let record = book.iter().next().unwrap();
        assert_eq!(record.created_at, 10);
    }

    #[test]
    fn test_distinct_signatures_get_distinct_records() {
        let mut book = RecordBook::new();
        book.observe(&obs("r1", None, OutcomeClass::Odd, 3), 0);
        book.observe(&obs("r1", None, OutcomeClass::Even, 3), 0);
        book.observe(&obs("r1", Some(0), OutcomeClass::Odd, 3), 0);
        book.observe(&obs("r2", None, OutcomeClass::Odd, 3), 0);
        assert_eq!(book.len(), 4);

        let ids: std::collections::HashSet<_> = book.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_iteration_keeps_first_sighting_order() {
        let mut book = RecordBook::new();
        book.observe(&obs("b", None, OutcomeClass::Odd, 3), 0);
        book.observe(&obs("a", None, OutcomeClass::Odd, 3), 0);
        book.observe(&obs("b", None, OutcomeClass::Odd, 8), 0);
        let rules: Vec<_> = book.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(rules, vec!["b", "a"]);
    }

    #[test]
    fn test_from_records_collapses_duplicates() {
        let a = StreakRecord::from_observation(&obs("r1", None, OutcomeClass::Odd, 3), 1);
        let b = StreakRecord::from_observation(&obs("r1", None, OutcomeClass::Odd, 7), 2);
        let c = StreakRecord::from_observation(&obs("r2", None, OutcomeClass::Odd, 1), 3);
        let book = RecordBook::from_records(vec![a, b.clone(), c]);
        assert_eq!(book.len(), 2);
        assert_eq!(book.get(&b.identity_key()).unwrap().max_streak_length, 7);
    }

    #[test]
    fn test_record_key_matches_observation_key() {
        let o = obs("r9", Some(3), OutcomeClass::Small, 2);
        let record = StreakRecord::from_observation(&o, 0);
        assert_eq!(record.identity_key(), o.identity_key());
    }
}
