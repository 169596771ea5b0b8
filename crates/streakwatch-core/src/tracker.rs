//! Change-detecting streak tracker.
//!
//! Lifecycle:
//! 1. [`StreakTracker::initialize`] loads the last snapshot (once, async)
//! 2. [`StreakTracker::evaluate`] runs after every pattern scan
//! 3. [`StreakTracker::start`] / [`StreakTracker::stop`] toggle tracking
//! 4. [`StreakTracker::clear`] wipes all records
//!
//! Evaluation is synchronous. It fingerprints the tracked observations and
//! does nothing when the fingerprint matches the previous one. Otherwise it
//! folds every observation into a copy of the record book, swaps the copy in
//! and hands a snapshot to the debounced saver.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::pattern::{PatternReport, StreakObservation, TrackingScope};
use crate::record::{RecordBook, RecordChange};
use crate::saver::{DEFAULT_SAVE_DELAY, DebouncedSaver};
use crate::store::{RecordStore, StoreError, TrackerSnapshot};
use crate::time::now_ms;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Tracker settings.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Quiet period after the last change before a snapshot is written.
    pub save_delay: Duration,
    /// Which observations count for tracking.
    pub scope: TrackingScope,
    /// Tracking flag used when the store has no snapshot yet.
    pub track_by_default: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            save_delay: DEFAULT_SAVE_DELAY,
            scope: TrackingScope::AboveThreshold,
            track_by_default: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Order-independent serialization of an observation set.
pub fn fingerprint<'a>(observations: impl IntoIterator<Item = &'a StreakObservation>) -> String {
    let mut entries: Vec<String> = observations
        .into_iter()
        .map(StreakObservation::fingerprint_entry)
        .collect();
    entries.sort();
    entries.join(";")
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Result of one [`StreakTracker::evaluate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// The initial load has not resolved yet.
    NotInitialized,
    /// Tracking is switched off.
    Stopped,
    /// Same observations as last time.
    Unchanged,
    Updated { created: usize, extended: usize },
}

pub struct StreakTracker {
    config: TrackerConfig,
    store: Arc<dyn RecordStore>,
    saver: DebouncedSaver,
    records: Arc<RecordBook>,
    tracking: bool,
    initialized: bool,
    last_fingerprint: Option<String>,
}

impl StreakTracker {
    pub fn new(store: Arc<dyn RecordStore>, config: TrackerConfig) -> Self {
        let saver = DebouncedSaver::new(Arc::clone(&store), config.save_delay);
        Self {
            tracking: config.track_by_default,
            config,
            store,
            saver,
            records: Arc::new(RecordBook::new()),
            initialized: false,
            last_fingerprint: None,
        }
    }

    /// Load the last snapshot from the store.
    ///
    /// The tracker counts as initialized once the load resolves, whether it
    /// found data, found nothing, or failed. A failed load starts empty.
    pub async fn initialize(&mut self) {
        match self.store.load().await {
            Ok(Some(snapshot)) => {
                let book = RecordBook::from_records(snapshot.records);
                log::info!(
                    "Loaded {} streak records (tracking {})",
                    book.len(),
                    if snapshot.tracking { "on" } else { "off" }
                );
                self.records = Arc::new(book);
                self.tracking = snapshot.tracking;
            }
            Ok(None) => log::info!("No saved streak records, starting empty"),
            Err(e) => log::warn!("Failed to load streak records (starting empty): {e}"),
        }
        self.initialized = true;
        self.last_fingerprint = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Current record book. The returned handle is never mutated; updates
    /// replace the tracker's handle instead.
    pub fn records(&self) -> Arc<RecordBook> {
        Arc::clone(&self.records)
    }

    /// Fold a scan into the record book, stamping changes with the current time.
    pub fn evaluate(&mut self, report: &PatternReport) -> Evaluation {
        self.evaluate_at(report, now_ms())
    }

    /// [`StreakTracker::evaluate`] with an explicit timestamp.
    pub fn evaluate_at(&mut self, report: &PatternReport, now: u64) -> Evaluation {
        if !self.initialized {
            return Evaluation::NotInitialized;
        }
        if !self.tracking {
            return Evaluation::Stopped;
        }

        let observed = report.tracked(self.config.scope);
        let print = fingerprint(observed.iter().copied());
        if self.last_fingerprint.as_deref() == Some(print.as_str()) {
            return Evaluation::Unchanged;
        }

        let mut book = RecordBook::clone(&self.records);
        let (mut created, mut extended) = (0, 0);
        for obs in observed {
            match book.observe(obs, now) {
                RecordChange::Created => {
                    log::info!(
                        "New streak: {} {} {} {} x{}",
                        obs.rule_label,
                        obs.dimension,
                        obs.mode,
                        obs.class,
                        obs.length
                    );
                    created += 1;
                }
                RecordChange::Extended => extended += 1,
                RecordChange::Unchanged => {}
            }
        }
        log::debug!("Streak set changed: {created} created, {extended} extended");

        self.records = Arc::new(book);
        self.last_fingerprint = Some(print);
        self.schedule_save(now);
        Evaluation::Updated { created, extended }
    }

    /// Turn tracking on. The next evaluation re-examines everything.
    pub fn start(&mut self) {
        self.tracking = true;
        self.last_fingerprint = None;
        if self.initialized {
            self.schedule_save(now_ms());
        }
    }

    /// Turn tracking off. Records are kept.
    pub fn stop(&mut self) {
        self.tracking = false;
        if self.initialized {
            self.schedule_save(now_ms());
        }
    }

    /// Wipe every record.
    ///
    /// Local state and the fingerprint are cleared before this returns. The
    /// remote clear runs in the background; its handle is returned for
    /// callers that want to wait on it, and its failure is only logged.
    pub fn clear(&mut self) -> Option<JoinHandle<()>> {
        self.saver.cancel();
        let dropped = self.records.len();
        self.records = Arc::new(RecordBook::new());
        self.last_fingerprint = None;
        log::info!("Cleared {dropped} streak records");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("No async runtime available, skipping remote clear of streak records");
            return None;
        };
        let store = Arc::clone(&self.store);
        Some(runtime.spawn(async move {
            if let Err(e) = store.clear().await {
                log::warn!("Remote clear of streak records failed: {e}");
            }
        }))
    }

    /// Snapshot of the current state.
    pub fn snapshot(&self, now: u64) -> TrackerSnapshot {
        TrackerSnapshot::new(self.records.to_vec(), self.tracking, now)
    }

    /// Whether a debounced save is waiting to run.
    pub fn save_pending(&self) -> bool {
        self.saver.is_pending()
    }

    /// Write any pending snapshot immediately.
    pub async fn flush(&mut self) -> Result<bool, StoreError> {
        self.saver.flush().await
    }

    /// Drop any pending snapshot without writing it.
    pub fn shutdown(&mut self) -> bool {
        self.saver.cancel()
    }

    fn schedule_save(&mut self, now: u64) {
        let snapshot = self.snapshot(now);
        self.saver.schedule(snapshot);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
