//! Persistence collaborators for tracker state.
//!
//! The tracker only ever talks to a [`RecordStore`]: save the whole snapshot,
//! load the last one, or wipe it. Two implementations live here:
//!
//! - [`FileStore`]: a single JSON file, written via temp file + rename
//! - [`MemoryStore`]: in-process, with save counting and failure injection
//!
//! The CLI adds an HTTP client store talking to `streakwatch-server`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::record::StreakRecord;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot (de)serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("store returned status {0}")]
    Status(u16),
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything the tracker persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub version: u32,
    pub tracking: bool,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub saved_at: u64,
    #[serde(default)]
    pub records: Vec<StreakRecord>,
}

impl TrackerSnapshot {
    pub fn new(records: Vec<StreakRecord>, tracking: bool, saved_at: u64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            tracking,
            saved_at,
            records,
        }
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Where tracker snapshots go.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Replace the stored snapshot.
    async fn save(&self, snapshot: &TrackerSnapshot) -> Result<(), StoreError>;

    /// Last saved snapshot, or `None` if nothing has been saved.
    async fn load(&self) -> Result<Option<TrackerSnapshot>, StoreError>;

    /// Remove the stored snapshot.
    async fn clear(&self) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Snapshot kept as one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }
}

/// Write `contents` to a temp file in `dir` and rename it onto `path`.
/// The temp file is removed if anything fails before the rename.
fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl RecordStore for FileStore {
    async fn save(&self, snapshot: &TrackerSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let dir = self.dir().to_path_buf();
        let path = self.path.clone();
        // the blocking write finishes even if the calling task is dropped
        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &json))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }

    async fn load(&self) -> Result<Option<TrackerSnapshot>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Memory store
// ---------------------------------------------------------------------------

/// In-process store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    snapshot: Mutex<Option<TrackerSnapshot>>,
    saves: AtomicUsize,
    clears: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store.
    pub fn with_snapshot(snapshot: TrackerSnapshot) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                snapshot: Mutex::new(Some(snapshot)),
                ..Default::default()
            }),
        }
    }

    /// Make every subsequent operation fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.inner.clears.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Option<TrackerSnapshot> {
        self.inner.snapshot.lock().await.clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.inner.failing.load(Ordering::SeqCst) {
            Err(StoreError::Transport("memory store set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save(&self, snapshot: &TrackerSnapshot) -> Result<(), StoreError> {
        self.check()?;
        *self.inner.snapshot.lock().await = Some(snapshot.clone());
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> Result<Option<TrackerSnapshot>, StoreError> {
        self.check()?;
        Ok(self.inner.snapshot.lock().await.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check()?;
        *self.inner.snapshot.lock().await = None;
        self.inner.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
