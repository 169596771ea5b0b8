//! # streakwatch-core
//!
//! **Streak detection over aligned outcome-block sequences.**
//!
//! Every block carries a parity class (odd/even) and a size class
//! (big/small). Sampling [`Rule`]s pick a lattice of blocks (every
//! `interval`-th block from an offset) and split it into periodic rows. For
//! each rule the engine reports the current leading run ("streak") of the
//! whole aligned sequence and of every row, and a change-detecting tracker
//! keeps the longest run ever seen per streak kind.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use streakwatch_core::{
//!     DisplayFilter, FileStore, Rule, StreakTracker, TrackerConfig, WatchSet, scan_patterns,
//!     summarize,
//! };
//!
//! # async fn run(blocks: Vec<streakwatch_core::Block>) {
//! let rules = vec![Rule::new("every-block", 1).with_rows(2).with_threshold(4)];
//! let report = scan_patterns(&blocks, &rules, DisplayFilter::All, &WatchSet::new());
//!
//! let store = Arc::new(FileStore::new("streaks.json"));
//! let mut tracker = StreakTracker::new(store, TrackerConfig::default());
//! tracker.initialize().await;
//! tracker.evaluate(&report);
//!
//! if let Some(stats) = summarize(tracker.records().iter()) {
//!     println!("{} streak kinds recorded", stats.total);
//! }
//! # }
//! ```
//!
//! ## Architecture
//!
//! Blocks + Rules → align → streak / rows → pattern scan → tracker → store
//!
//! - [`streak`]: alignment filter, leading-run calculator, row partitioner
//! - [`pattern`]: per-rule, per-dimension scan with threshold, filter and watch admission
//! - [`tracker`]: fingerprinted change detection over the scan output
//! - [`saver`] / [`store`]: debounced, fire-and-forget snapshot persistence
//! - [`stats`]: four-way summaries of the record list

pub mod block;
pub mod config;
pub mod pattern;
pub mod record;
pub mod rule;
pub mod saver;
pub mod stats;
pub mod store;
pub mod streak;
pub mod time;
pub mod tracker;

pub use block::{Block, Dimension, OutcomeClass, ParityClass, SizeClass};
pub use config::{ConfigError, load_blocks, load_rules, load_watched, validate_rules};
pub use pattern::{
    DetectionMode, DisplayFilter, JumpTarget, PatternReport, StreakObservation, TrackingScope,
    WatchSet, WatchedPattern, scan_patterns,
};
pub use record::{RecordBook, RecordChange, StreakRecord};
pub use rule::Rule;
pub use saver::{DEFAULT_SAVE_DELAY, DebouncedSaver};
pub use stats::{ClassCounts, LengthBucket, ModeCounts, RuleStats, StreakStats, summarize};
pub use store::{FileStore, MemoryStore, RecordStore, SNAPSHOT_VERSION, StoreError, TrackerSnapshot};
pub use streak::{align_blocks, block_streak, leading_streak, partition_rows, row_of};
pub use tracker::{Evaluation, StreakTracker, TrackerConfig, fingerprint};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
