pub mod clear;
pub mod scan;
pub mod server;
pub mod stats;
pub mod track;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use streakwatch_core::{
    Block, FileStore, RecordStore, Rule, StreakObservation, WatchSet, load_blocks, load_rules,
    load_watched,
};

use crate::http_store::HttpStore;

/// Default snapshot file when neither `--store` nor `--remote` is given.
pub const DEFAULT_STORE_PATH: &str = "streaks.json";

/// Where tracker snapshots live.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Snapshot file (default: ./streaks.json)
    #[arg(long, conflicts_with = "remote")]
    pub store: Option<PathBuf>,

    /// Base URL of a `streakwatch server` (e.g. http://127.0.0.1:8088)
    #[arg(long)]
    pub remote: Option<String>,
}

impl StoreArgs {
    pub fn open(&self) -> anyhow::Result<Arc<dyn RecordStore>> {
        if let Some(url) = &self.remote {
            let store = HttpStore::new(url).context("could not build HTTP client")?;
            log::debug!("Using remote store at {}", store.url());
            return Ok(Arc::new(store));
        }
        Ok(Arc::new(FileStore::new(self.file_path())))
    }

    fn file_path(&self) -> PathBuf {
        self.store
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH))
    }

    /// Human-readable location for status lines.
    pub fn describe(&self) -> String {
        match &self.remote {
            Some(url) => url.clone(),
            None => self.file_path().display().to_string(),
        }
    }
}

/// Load rules, blocks and the optional watch set.
pub fn load_inputs(
    blocks: &Path,
    rules: &Path,
    watch: Option<&Path>,
) -> anyhow::Result<(Vec<Block>, Vec<Rule>, WatchSet)> {
    let rules = load_rules(rules)?;
    let blocks = load_blocks(blocks)?;
    let watched = match watch {
        Some(path) => load_watched(path)?,
        None => WatchSet::new(),
    };
    Ok((blocks, rules, watched))
}

/// Row column text: `-` for sequence streaks.
pub fn row_label(obs: &StreakObservation) -> String {
    obs.row_index
        .map_or_else(|| "-".to_string(), |r| r.to_string())
}

/// Print one observation table.
pub fn print_observations(title: &str, observations: &[StreakObservation]) {
    println!("{title} ({}):", observations.len());
    if observations.is_empty() {
        println!("  (none)");
        return;
    }
    println!(
        "  {:<20} {:<7} {:<9} {:>4} {:<6} {:>6} {:>10}",
        "Rule", "Dim", "Mode", "Row", "Class", "Length", "Next"
    );
    println!("  {}", "-".repeat(68));
    for obs in observations {
        println!(
            "  {:<20} {:<7} {:<9} {:>4} {:<6} {:>6} {:>10}",
            truncate(&obs.rule_label, 20),
            obs.dimension,
            obs.mode,
            row_label(obs),
            obs.class,
            obs.length,
            obs.predicted_next_height
        );
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}~")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streakwatch_core::{DetectionMode, OutcomeClass};

    fn observation(row_index: Option<usize>) -> StreakObservation {
        StreakObservation {
            rule_id: "r".to_string(),
            rule_label: "R".to_string(),
            dimension: OutcomeClass::Odd.dimension(),
            mode: if row_index.is_some() {
                DetectionMode::Row
            } else {
                DetectionMode::Sequence
            },
            row_index,
            class: OutcomeClass::Odd,
            length: 3,
            predicted_next_height: 10,
        }
    }

    // -----------------------------------------------------------------------
    // StoreArgs
    // -----------------------------------------------------------------------

    #[test]
    fn test_default_store_is_local_file() {
        let args = StoreArgs::default();
        assert_eq!(args.describe(), DEFAULT_STORE_PATH);
        assert!(args.open().is_ok());
    }

    #[test]
    fn test_remote_store_described_by_url() {
        let args = StoreArgs {
            store: None,
            remote: Some("http://127.0.0.1:8088".to_string()),
        };
        assert_eq!(args.describe(), "http://127.0.0.1:8088");
        assert!(args.open().is_ok());
    }

    // -----------------------------------------------------------------------
    // Formatting helpers
    // -----------------------------------------------------------------------

    #[test]
    fn test_row_label() {
        assert_eq!(row_label(&observation(None)), "-");
        assert_eq!(row_label(&observation(Some(2))), "2");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd~");
    }

    // -----------------------------------------------------------------------
    // load_inputs
    // -----------------------------------------------------------------------

    #[test]
    fn test_load_inputs_without_watch_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocks = dir.path().join("blocks.json");
        let rules = dir.path().join("rules.json");
        std::fs::write(
            &blocks,
            r#"[{"height": 1, "parity": "odd", "size": "big"}]"#,
        )
        .unwrap();
        std::fs::write(&rules, r#"[{"id": "every", "interval": 1}]"#).unwrap();

        let (blocks, rules, watched) = load_inputs(&blocks, &rules, None).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(rules[0].id, "every");
        assert!(watched.is_empty());
    }

    #[test]
    fn test_load_inputs_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(load_inputs(&missing, &missing, None).is_err());
    }
}
