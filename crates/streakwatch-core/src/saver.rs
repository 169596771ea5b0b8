//! Debounced, fire-and-forget snapshot writes.
//!
//! The saver holds at most one pending snapshot in a generation-tagged slot.
//! Scheduling replaces the slot and starts a fresh timer; a timer only writes
//! if the slot still carries its own generation, so a burst of changes
//! produces a single write `delay` after the last change. Writes are never
//! aborted mid-flight and run one at a time under a write lock, so an older
//! snapshot cannot land after a newer one. Failures are logged and dropped;
//! the next scheduled save carries the full state anyway.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::store::{RecordStore, StoreError, TrackerSnapshot};

/// Default delay between the last change and the write.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_secs(2);

type Slot = Option<(u64, Arc<TrackerSnapshot>)>;

struct Shared {
    store: Arc<dyn RecordStore>,
    slot: Mutex<Slot>,
    write_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    fn slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the pending snapshot if it is still the one `generation` scheduled.
    fn take_if(&self, generation: u64) -> Option<Arc<TrackerSnapshot>> {
        let mut slot = self.slot();
        if slot.as_ref().map(|(g, _)| *g) != Some(generation) {
            return None;
        }
        slot.take().map(|(_, s)| s)
    }
}

/// Single-slot debounced writer in front of a [`RecordStore`].
pub struct DebouncedSaver {
    shared: Arc<Shared>,
    delay: Duration,
    generation: u64,
}

impl DebouncedSaver {
    pub fn new(store: Arc<dyn RecordStore>, delay: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                slot: Mutex::new(None),
                write_lock: tokio::sync::Mutex::new(()),
            }),
            delay,
            generation: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending write with `snapshot`.
    ///
    /// Must run inside a Tokio runtime; without one the write is dropped
    /// with a warning.
    pub fn schedule(&mut self, snapshot: TrackerSnapshot) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("No async runtime available, dropping snapshot save");
            self.shared.slot().take();
            return;
        };

        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        *self.shared.slot() = Some((generation, Arc::new(snapshot)));

        let shared = Arc::clone(&self.shared);
        let delay = self.delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _write = shared.write_lock.lock().await;
            let Some(payload) = shared.take_if(generation) else {
                return;
            };
            match shared.store.save(&payload).await {
                Ok(()) => log::debug!("Saved {} streak records", payload.records.len()),
                Err(e) => log::warn!("Streak record save failed (will retry on next change): {e}"),
            }
        });
    }

    /// Whether a snapshot is waiting to be written.
    pub fn is_pending(&self) -> bool {
        self.shared.slot().is_some()
    }

    /// Drop the pending snapshot, if any. Returns true if one was waiting.
    ///
    /// A write already in progress still completes.
    pub fn cancel(&mut self) -> bool {
        self.shared.slot().take().is_some()
    }

    /// Write the pending snapshot now instead of waiting out the delay.
    ///
    /// Waits for any in-progress write first. Returns `Ok(false)` when
    /// nothing was pending.
    pub async fn flush(&mut self) -> Result<bool, StoreError> {
        let _write = self.shared.write_lock.lock().await;
        let pending = self.shared.slot().take();
        let Some((_, snapshot)) = pending else {
            return Ok(false);
        };
        self.shared.store.save(&snapshot).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::StreakRecord;
    use crate::store::{FileStore, MemoryStore};

    fn snapshot(marker: u64) -> TrackerSnapshot {
        TrackerSnapshot::new(Vec::new(), true, marker)
    }

    fn saver(store: &MemoryStore, ms: u64) -> DebouncedSaver {
        DebouncedSaver::new(Arc::new(store.clone()), Duration::from_millis(ms))
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_last_snapshot() {
        let store = MemoryStore::new();
        let mut saver = saver(&store, 500);

        saver.schedule(snapshot(1));
        tokio::time::sleep(Duration::from_millis(200)).await;
        saver.schedule(snapshot(2));
        tokio::time::sleep(Duration::from_millis(200)).await;
        saver.schedule(snapshot(3));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.save_count(), 0);
        assert!(saver.is_pending());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.snapshot().await.unwrap().saved_at, 3);
        assert!(!saver.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_write() {
        let store = MemoryStore::new();
        let mut saver = saver(&store, 100);
        saver.schedule(snapshot(1));
        assert!(saver.cancel());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.save_count(), 0);
        assert!(!saver.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let store = MemoryStore::new();
        let mut saver = saver(&store, 10_000);
        saver.schedule(snapshot(7));
        assert!(saver.flush().await.unwrap());
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.snapshot().await.unwrap().saved_at, 7);

        // the timer task finds the slot empty and does not write again
        tokio::time::sleep(Duration::from_millis(20_000)).await;
        assert_eq!(store.save_count(), 1);
        assert!(!saver.flush().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_is_swallowed() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let mut saver = saver(&store, 50);
        saver.schedule(snapshot(1));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.save_count(), 0);
        assert!(!saver.is_pending());

        store.set_failing(false);
        saver.schedule(snapshot(2));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_schedule_without_runtime_is_dropped() {
        let store = MemoryStore::new();
        let mut saver = saver(&store, 10);
        saver.schedule(snapshot(1));
        assert!(!saver.is_pending());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_superseded_file_saves_leave_only_latest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streaks.json");
        let store = FileStore::new(&path);
        let mut saver = DebouncedSaver::new(Arc::new(store.clone()), Duration::ZERO);

        let obs = crate::pattern::StreakObservation {
            rule_id: "r".to_string(),
            rule_label: "R".to_string(),
            dimension: crate::block::OutcomeClass::Big.dimension(),
            mode: crate::pattern::DetectionMode::Sequence,
            row_index: None,
            class: crate::block::OutcomeClass::Big,
            length: 5,
            predicted_next_height: 9,
        };
        let records: Vec<StreakRecord> = (0..500)
            .map(|i| StreakRecord::from_observation(&obs, i))
            .collect();

        for i in 0..50u64 {
            saver.schedule(TrackerSnapshot::new(records.clone(), true, i));
            if i % 5 == 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }
        saver.schedule(TrackerSnapshot::new(Vec::new(), true, 1_000));
        saver.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("streaks.json")]);

        // no older write may land after the flushed one
        let last = store.load().await.unwrap().unwrap();
        assert_eq!(last.saved_at, 1_000);
    }
}
