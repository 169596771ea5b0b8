//! `streakwatch track`: replay a blocks file through the tracker.
//!
//! Blocks are fed one at a time in height order and every arrival triggers a
//! pattern scan plus a tracker evaluation, the way a live feed would. With
//! `--follow` the file is re-read on an interval and new heights are fed as
//! they appear, until Ctrl+C. Only the newest `--window` blocks are kept, so
//! a streak can never be reported longer than the window allows.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;

use streakwatch_core::{
    Block, DisplayFilter, Evaluation, Rule, StreakTracker, TrackerConfig, TrackingScope, WatchSet,
    load_blocks, scan_patterns, summarize,
};

use super::{StoreArgs, load_inputs};

/// Options for the track command.
pub struct TrackCommandConfig<'a> {
    pub blocks_path: &'a Path,
    pub rules_path: &'a Path,
    pub watch_path: Option<&'a Path>,
    pub store: &'a StoreArgs,
    pub filter: DisplayFilter,
    pub scope: TrackingScope,
    pub save_delay: Duration,
    pub start: bool,
    pub follow: bool,
    pub poll: Duration,
    pub window: usize,
}

/// Default number of blocks kept by a [`BlockFeed`].
pub const DEFAULT_WINDOW: usize = 1000;

/// Sliding window over the newest blocks seen so far.
#[derive(Debug)]
pub struct BlockFeed {
    window: Vec<Block>,
    capacity: usize,
    newest: Option<u64>,
}

impl Default for BlockFeed {
    fn default() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }
}

impl BlockFeed {
    /// Feed keeping at most `capacity` blocks (at least one).
    pub fn with_window(capacity: usize) -> Self {
        Self {
            window: Vec::new(),
            capacity: capacity.max(1),
            newest: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Blocks in `incoming` above the newest height fed so far, lowest first.
    pub fn fresh(&self, incoming: Vec<Block>) -> Vec<Block> {
        let mut fresh: Vec<Block> = incoming
            .into_iter()
            .filter(|b| self.newest.is_none_or(|n| b.height > n))
            .collect();
        fresh.sort_by_key(|b| b.height);
        fresh.dedup_by_key(|b| b.height);
        fresh
    }

    pub fn push(&mut self, block: Block) {
        self.newest = Some(self.newest.map_or(block.height, |n| n.max(block.height)));
        self.window.push(block);
        // pushes arrive in height order, so the front is the oldest
        if self.window.len() > self.capacity {
            let excess = self.window.len() - self.capacity;
            self.window.drain(..excess);
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.window
    }

    pub fn newest(&self) -> Option<u64> {
        self.newest
    }
}

/// Counters over one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub blocks: usize,
    pub updates: usize,
    pub created: usize,
    pub extended: usize,
}

impl ReplaySummary {
    fn add(&mut self, evaluation: Evaluation) {
        self.blocks += 1;
        if let Evaluation::Updated { created, extended } = evaluation {
            self.updates += 1;
            self.created += created;
            self.extended += extended;
        }
    }
}

/// Feed `blocks` one by one, evaluating after each arrival.
pub fn replay(
    tracker: &mut StreakTracker,
    feed: &mut BlockFeed,
    blocks: Vec<Block>,
    rules: &[Rule],
    filter: DisplayFilter,
    watched: &WatchSet,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for block in feed.fresh(blocks) {
        feed.push(block);
        let report = scan_patterns(feed.blocks(), rules, filter, watched);
        summary.add(tracker.evaluate(&report));
    }
    summary
}

pub fn run(cfg: TrackCommandConfig<'_>) -> anyhow::Result<()> {
    let (blocks, rules, watched) = load_inputs(cfg.blocks_path, cfg.rules_path, cfg.watch_path)?;
    let store = cfg.store.open()?;

    let running = Arc::new(AtomicBool::new(true));
    if cfg.follow {
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })
        .context("error setting Ctrl+C handler")?;
    }

    let config = TrackerConfig {
        save_delay: cfg.save_delay,
        scope: cfg.scope,
        ..Default::default()
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut tracker = StreakTracker::new(store, config);
        tracker.initialize().await;
        let loaded = tracker.records().len();

        if !tracker.is_tracking() {
            if cfg.start {
                tracker.start();
            } else {
                println!("Tracking is off in {}; pass --start to resume.", cfg.store.describe());
            }
        }

        println!("Tracking streaks");
        println!("  Store:   {} ({loaded} records loaded)", cfg.store.describe());
        println!("  Rules:   {}", rules.len());
        println!("  Filter:  {}", cfg.filter);
        println!("  Blocks:  {} (window {})", cfg.blocks_path.display(), cfg.window);
        if cfg.follow {
            println!("  Follow:  every {}ms until Ctrl+C", cfg.poll.as_millis());
        }
        println!();

        let mut feed = BlockFeed::with_window(cfg.window);
        let mut total = replay(&mut tracker, &mut feed, blocks, &rules, cfg.filter, &watched);

        while cfg.follow && running.load(Ordering::SeqCst) {
            tokio::time::sleep(cfg.poll).await;
            let incoming = match load_blocks(cfg.blocks_path) {
                Ok(b) => b,
                Err(e) => {
                    log::warn!("Skipping poll: {e}");
                    continue;
                }
            };
            let step = replay(&mut tracker, &mut feed, incoming, &rules, cfg.filter, &watched);
            if step.blocks > 0 {
                println!(
                    "  +{} blocks (newest {}), {} new streak kinds, {} extended",
                    step.blocks,
                    feed.newest().unwrap_or_default(),
                    step.created,
                    step.extended
                );
            }
            total.blocks += step.blocks;
            total.updates += step.updates;
            total.created += step.created;
            total.extended += step.extended;
        }

        // records are already in memory; a failed write only costs persistence
        match tracker.flush().await {
            Ok(true) => log::debug!("Flushed pending snapshot"),
            Ok(false) => {}
            Err(e) => log::warn!(
                "Could not write streak records to {}: {e}",
                cfg.store.describe()
            ),
        }

        println!(
            "Fed {} blocks: {} changed scans, {} new streak kinds, {} extended",
            total.blocks, total.updates, total.created, total.extended
        );
        println!();
        match summarize(tracker.records().iter()) {
            Some(stats) => super::stats::print_stats(&stats),
            None => println!("No streak records yet."),
        }
        Ok::<(), anyhow::Error>(())
    })
}
