//! Storage for the "tour already completed" flag.
//!
//! Failures here are never fatal: an unreadable flag loads as `false` and a
//! failed save is reported to the caller, which only logs it. The worst case
//! is the tour being offered again on the next session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File name of the persisted record inside the state directory
pub const TOUR_STATE_FILE: &str = "tour.json";

pub trait FlagStore: Send {
    /// Whether the tour was previously completed, skipped or closed
    fn load(&self) -> bool;

    fn save(&mut self, completed: bool) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourRecord {
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// JSON file store at `<state>/tour.json`
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store inside a state directory
    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(TOUR_STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full record, `None` when nothing was saved yet
    pub fn record(&self) -> Result<Option<TourRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).context("Failed to read tour state file")?;
        let record = serde_json::from_str(&contents).context("Failed to parse tour state file")?;
        Ok(Some(record))
    }

    /// Remove the record so the next session sees a fresh tour
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to remove tour state file")?;
        }
        Ok(())
    }
}

impl FlagStore for FileFlagStore {
    fn load(&self) -> bool {
        match self.record() {
            Ok(record) => record.is_some_and(|r| r.completed),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable tour state");
                false
            }
        }
    }

    fn save(&mut self, completed: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create state directory")?;
        }
        let record = TourRecord {
            completed,
            updated_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&record)?;
        fs::write(&self.path, contents).context("Failed to write tour state file")?;
        Ok(())
    }
}

/// In-memory store; clones share the same flag and save counter
#[derive(Debug, Clone, Default)]
pub struct MemoryFlagStore {
    completed: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemoryFlagStore {
    pub fn new(completed: bool) -> Self {
        Self {
            completed: Arc::new(AtomicBool::new(completed)),
            saves: Arc::default(),
        }
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl FlagStore for MemoryFlagStore {
    fn load(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    fn save(&mut self, completed: bool) -> Result<()> {
        self.completed.store(completed, Ordering::SeqCst);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
