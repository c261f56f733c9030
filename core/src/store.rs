//! The persisted collection port and its in-memory adapter.
//!
//! The engine never touches storage directly. It reads and writes whole
//! named blobs through [`CollectionStore`]; each `put` is atomic for its own
//! collection only.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The four named collections the engine persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectionKey {
    /// Vehicles not present in the baseline catalog.
    Added,
    /// id -> latest edited snapshot of active vehicles.
    UpdatesOverlay,
    /// Sold snapshots, newest first.
    Sold,
    /// Pending snapshots, newest first.
    Pending,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 4] = [
        CollectionKey::Added,
        CollectionKey::UpdatesOverlay,
        CollectionKey::Sold,
        CollectionKey::Pending,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::UpdatesOverlay => "updatesOverlay",
            Self::Sold => "sold",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read collection {key} from {}: {source}", path.display())]
    Read {
        key: CollectionKey,
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to write collection {key} to {}: {source}", path.display())]
    Write {
        key: CollectionKey,
        path: PathBuf,
        source: io::Error,
    },
    #[error("collection store unavailable: {0}")]
    Unavailable(String),
}

/// Opaque key -> blob storage for the engine's collections.
pub trait CollectionStore {
    /// Current blob for `key`, or `None` if it was never written.
    fn get(&self, key: CollectionKey) -> Result<Option<String>, StoreError>;

    /// Replace the blob for `key`.
    fn put(&mut self, key: CollectionKey, value: &str) -> Result<(), StoreError>;
}

impl<S: CollectionStore + ?Sized> CollectionStore for Box<S> {
    fn get(&self, key: CollectionKey) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn put(&mut self, key: CollectionKey, value: &str) -> Result<(), StoreError> {
        (**self).put(key, value)
    }
}

/// In-process store. Counts writes so callers can assert on them.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blobs: BTreeMap<CollectionKey, String>,
    writes: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob without counting it as a write.
    #[must_use]
    pub fn with_blob(mut self, key: CollectionKey, value: impl Into<String>) -> Self {
        self.blobs.insert(key, value.into());
        self
    }

    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    #[must_use]
    pub fn blob(&self, key: CollectionKey) -> Option<&str> {
        self.blobs.get(&key).map(String::as_str)
    }
}

impl CollectionStore for MemoryStore {
    fn get(&self, key: CollectionKey) -> Result<Option<String>, StoreError> {
        Ok(self.blobs.get(&key).cloned())
    }

    fn put(&mut self, key: CollectionKey, value: &str) -> Result<(), StoreError> {
        self.blobs.insert(key, value.to_string());
        self.writes += 1;
        Ok(())
    }
}
