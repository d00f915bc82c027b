//! Undo/redo history for the document constructor.
//!
//! [`HistoryManager`] keeps a bounded sequence of [`PdfDocument`] snapshots
//! and a cursor into it. Snapshots are independent copies; the manager never
//! touches a live document. Pushing after an undo drops the redo tail, and
//! once the sequence exceeds its capacity the oldest snapshot falls off.
//!
//! History can be saved to a [`SnapshotStore`] under `pdf-history-{id}`.
//! Saved history carries a timestamp; on load, entries older than the TTL
//! (24 hours by default) or that fail to parse are removed from the store
//! instead of restored.

use crate::config::HistoryConfig;
use crate::document::PdfDocument;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_CAPACITY: usize = 50;
pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value storage for saved history.
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&self, key: &str) -> Result<(), PersistError>;
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

pub fn storage_key(document_id: &str) -> String {
    format!("pdf-history-{document_id}")
}

#[derive(Serialize, Deserialize)]
struct SavedHistory {
    history: Vec<PdfDocument>,
    /// -1 when the history is empty.
    current_index: i64,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<PdfDocument>,
    cursor: Option<usize>,
    capacity: usize,
    ttl: TimeDelta,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            capacity: capacity.max(1),
            ttl: TimeDelta::hours(DEFAULT_TTL_HOURS),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self {
            ttl: TimeDelta::hours(i64::from(config.ttl_hours)),
            ..Self::with_capacity(config.max_entries)
        }
    }

    /// Start over with `doc` as the only entry.
    pub fn initialize(&mut self, doc: &PdfDocument) {
        self.clear();
        self.push(doc);
    }

    pub fn push(&mut self, doc: &PdfDocument) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(doc.clone());
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    pub fn undo(&mut self) -> Result<PdfDocument, HistoryError> {
        match self.cursor {
            Some(c) if c > 0 => {
                self.cursor = Some(c - 1);
                Ok(self.entries[c - 1].clone())
            }
            _ => Err(HistoryError::NothingToUndo),
        }
    }

    pub fn redo(&mut self) -> Result<PdfDocument, HistoryError> {
        match self.cursor {
            Some(c) if c + 1 < self.entries.len() => {
                self.cursor = Some(c + 1);
                Ok(self.entries[c + 1].clone())
            }
            _ => Err(HistoryError::NothingToRedo),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&PdfDocument> {
        self.cursor.map(|c| &self.entries[c])
    }

    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn save(&self, store: &dyn SnapshotStore, document_id: &str) -> Result<(), PersistError> {
        self.save_at(store, document_id, Utc::now())
    }

    pub fn save_at(
        &self,
        store: &dyn SnapshotStore,
        document_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), PersistError> {
        let saved = SavedHistory {
            history: self.entries.clone(),
            current_index: self.cursor.map_or(-1, |c| c as i64),
            timestamp: now,
        };
        store.set(&storage_key(document_id), &serde_json::to_string(&saved)?)?;
        log::debug!(
            "saved {} history entries for '{document_id}'",
            self.entries.len()
        );
        Ok(())
    }

    /// Replace the in-memory history with the saved one, if it is fresh.
    ///
    /// Returns whether anything was restored.
    pub fn load(&mut self, store: &dyn SnapshotStore, document_id: &str) -> Result<bool, PersistError> {
        self.load_at(store, document_id, Utc::now())
    }

    pub fn load_at(
        &mut self,
        store: &dyn SnapshotStore,
        document_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, PersistError> {
        let key = storage_key(document_id);
        let Some(raw) = store.get(&key)? else {
            return Ok(false);
        };
        let saved = match serde_json::from_str::<SavedHistory>(&raw) {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("discarding unreadable history '{key}': {e}");
                store.remove(&key)?;
                return Ok(false);
            }
        };
        if now - saved.timestamp > self.ttl {
            log::warn!(
                "discarding stale history '{key}' saved at {}",
                saved.timestamp.to_rfc3339()
            );
            store.remove(&key)?;
            return Ok(false);
        }
        let cursor = match usize::try_from(saved.current_index) {
            Ok(c) if c < saved.history.len() => Some(c),
            Err(_) if saved.history.is_empty() => None,
            _ => {
                log::warn!(
                    "discarding history '{key}': index {} out of range",
                    saved.current_index
                );
                store.remove(&key)?;
                return Ok(false);
            }
        };

        self.entries = saved.history;
        self.cursor = cursor;
        if let Some(c) = self.cursor {
            if self.entries.len() > self.capacity {
                // Drop the oldest entries but never the current one.
                let excess = (self.entries.len() - self.capacity).min(c);
                self.entries.drain(..excess);
                self.entries.truncate(self.capacity);
                self.cursor = Some(c - excess);
            }
        }
        Ok(true)
    }

    /// Remove saved history for a document.
    pub fn forget(store: &dyn SnapshotStore, document_id: &str) -> Result<(), PersistError> {
        store.remove(&storage_key(document_id))
    }
}
