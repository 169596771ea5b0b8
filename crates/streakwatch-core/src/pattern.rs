//! Pattern scan: every rule × every dimension × (sequence + rows).
//!
//! [`scan_patterns`] is the single entry point the rest of the system drives.
//! It is recomputed from scratch on every block, rule or filter change and
//! has no side effects.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::block::{Block, Dimension, OutcomeClass};
use crate::rule::Rule;
use crate::streak::{align_blocks, block_streak, partition_rows};

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// Whether a streak was measured over the whole aligned sequence or one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    Sequence,
    Row,
}

impl DetectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionMode::Sequence => "sequence",
            DetectionMode::Row => "row",
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pattern the user asked to keep visible regardless of threshold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchedPattern {
    pub rule_id: String,
    pub dimension: Dimension,
    pub mode: DetectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
}

/// The set of watched patterns. Read-only to the engine.
pub type WatchSet = HashSet<WatchedPattern>;

/// Where a navigation callback should jump to for a selected streak.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JumpTarget {
    pub rule_id: String,
    pub dimension: Dimension,
    pub mode: DetectionMode,
}

/// One streak measured during a scan. Recomputed every evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakObservation {
    pub rule_id: String,
    pub rule_label: String,
    pub dimension: Dimension,
    pub mode: DetectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    pub class: OutcomeClass,
    pub length: usize,
    pub predicted_next_height: u64,
}

fn row_key(row_index: Option<usize>) -> String {
    row_index.map(|r| r.to_string()).unwrap_or_default()
}

impl StreakObservation {
    /// Identity of the streak kind, excluding its length:
    /// `rule|dimension|mode|row|class`.
    pub fn identity_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.rule_id,
            self.dimension,
            self.mode,
            row_key(self.row_index),
            self.class
        )
    }

    /// Identity key plus the current length; the unit of change detection.
    pub fn fingerprint_entry(&self) -> String {
        format!("{}|{}", self.identity_key(), self.length)
    }

    /// Key to toggle in the watch set for this observation.
    pub fn watch_key(&self) -> WatchedPattern {
        WatchedPattern {
            rule_id: self.rule_id.clone(),
            dimension: self.dimension,
            mode: self.mode,
            row_index: self.row_index,
        }
    }

    pub fn jump_target(&self) -> JumpTarget {
        JumpTarget {
            rule_id: self.rule_id.clone(),
            dimension: self.dimension,
            mode: self.mode,
        }
    }
}

// ---------------------------------------------------------------------------
// Display filter
// ---------------------------------------------------------------------------

/// Narrows the displayed streaks to one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayFilter {
    #[default]
    All,
    Only(OutcomeClass),
}

impl DisplayFilter {
    pub fn admits(self, class: OutcomeClass) -> bool {
        match self {
            DisplayFilter::All => true,
            DisplayFilter::Only(wanted) => wanted == class,
        }
    }
}

impl FromStr for DisplayFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(DisplayFilter::All);
        }
        s.parse::<OutcomeClass>().map(DisplayFilter::Only)
    }
}

impl fmt::Display for DisplayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFilter::All => f.write_str("all"),
            DisplayFilter::Only(class) => write!(f, "{class}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Which observations the tracker records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackingScope {
    /// Every observation at or above its rule's threshold, ignoring the
    /// display filter.
    #[default]
    AboveThreshold,
    /// Only what is currently displayed (threshold and display filter).
    DisplayFiltered,
}

impl FromStr for TrackingScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "above-threshold" | "above_threshold" | "all" => Ok(TrackingScope::AboveThreshold),
            "display-filtered" | "display_filtered" | "filtered" => {
                Ok(TrackingScope::DisplayFiltered)
            }
            other => Err(format!("unknown tracking scope '{other}'")),
        }
    }
}

/// Output of one scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternReport {
    /// Sequence-mode streaks passing threshold and filter, longest first.
    pub sequence: Vec<StreakObservation>,
    /// Row-mode streaks passing threshold and filter, longest first.
    pub rows: Vec<StreakObservation>,
    /// Watched streaks passing the filter, any length, longest first.
    pub watched: Vec<StreakObservation>,
    /// Sequence and row streaks passing threshold, filter not applied.
    #[serde(skip)]
    above_threshold: Vec<StreakObservation>,
}

impl PatternReport {
    /// Observations the tracker should see under `scope`.
    pub fn tracked(&self, scope: TrackingScope) -> Vec<&StreakObservation> {
        match scope {
            TrackingScope::AboveThreshold => self.above_threshold.iter().collect(),
            TrackingScope::DisplayFiltered => self.sequence.iter().chain(&self.rows).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty() && self.rows.is_empty() && self.watched.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Compute every current streak for every rule.
pub fn scan_patterns(
    blocks: &[Block],
    rules: &[Rule],
    filter: DisplayFilter,
    watched: &WatchSet,
) -> PatternReport {
    let mut report = PatternReport::default();

    for rule in rules {
        let aligned = align_blocks(blocks, rule);
        let Some(newest) = aligned.first() else {
            continue;
        };
        let rows = partition_rows(&aligned, rule);

        for dimension in Dimension::ALL {
            if let Some((class, length)) = block_streak(&aligned, dimension) {
                let obs = StreakObservation {
                    rule_id: rule.id.clone(),
                    rule_label: rule.display_label().to_string(),
                    dimension,
                    mode: DetectionMode::Sequence,
                    row_index: None,
                    class,
                    length,
                    predicted_next_height: newest.height.saturating_add(rule.step()),
                };
                admit(&mut report, obs, rule, filter, watched);
            }

            for row in &rows {
                let Some((class, length)) = block_streak(&row.blocks, dimension) else {
                    continue;
                };
                let Some(predicted_next_height) = row.predicted_next_height(rule) else {
                    continue;
                };
                let obs = StreakObservation {
                    rule_id: rule.id.clone(),
                    rule_label: rule.display_label().to_string(),
                    dimension,
                    mode: DetectionMode::Row,
                    row_index: Some(row.index),
                    class,
                    length,
                    predicted_next_height,
                };
                admit(&mut report, obs, rule, filter, watched);
            }
        }
    }

    // sort_by is stable: equal lengths keep rule/dimension/row scan order
    let by_length = |a: &StreakObservation, b: &StreakObservation| b.length.cmp(&a.length);
    report.sequence.sort_by(by_length);
    report.rows.sort_by(by_length);
    report.watched.sort_by(by_length);
    report
}

fn admit(
    report: &mut PatternReport,
    obs: StreakObservation,
    rule: &Rule,
    filter: DisplayFilter,
    watched: &WatchSet,
) {
    let shown = filter.admits(obs.class);
    if shown && watched.contains(&obs.watch_key()) {
        report.watched.push(obs.clone());
    }
    if obs.length < rule.threshold() {
        return;
    }
    report.above_threshold.push(obs.clone());
    if shown {
        match obs.mode {
            DetectionMode::Sequence => report.sequence.push(obs),
            DetectionMode::Row => report.rows.push(obs),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
