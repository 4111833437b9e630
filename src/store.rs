//! Flat-file JSON storage
//!
//! Each collection is one JSON array on disk, pretty-printed with two-space
//! indentation. Appending loads the whole array, pushes the record and writes
//! the array back.
//!
//! Writes go through a single lock and land in a temporary sibling file that is
//! flushed to disk, then renamed over the collection before the directory is
//! synced. A reader or a crash never observes a half-written array. Two appends
//! from this process cannot overwrite each other.

use crate::model::{CheckIn, Idea, Kudos, ProblemStatusEvent};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// The persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    CheckIns,
    Kudos,
    Ideas,
    ProblemStatus,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::CheckIns,
        Collection::Kudos,
        Collection::Ideas,
        Collection::ProblemStatus,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::CheckIns => "checkins.json",
            Collection::Kudos => "kudos.json",
            Collection::Ideas => "ideas.json",
            Collection::ProblemStatus => "problems_status.json",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Collection::CheckIns => "checkins",
            Collection::Kudos => "kudos",
            Collection::Ideas => "ideas",
            Collection::ProblemStatus => "problems_status",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record type and the collection it is persisted in
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;
}

impl Record for CheckIn {
    const COLLECTION: Collection = Collection::CheckIns;
}

impl Record for Kudos {
    const COLLECTION: Collection = Collection::Kudos;
}

impl Record for Idea {
    const COLLECTION: Collection = Collection::Ideas;
}

impl Record for ProblemStatusEvent {
    const COLLECTION: Collection = Collection::ProblemStatus;
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not a valid JSON array of records: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("could not encode {collection}: {source}")]
    Encode {
        collection: Collection,
        source: serde_json::Error,
    },

    #[error("store writer lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Handle on the directory holding the collections
#[derive(Debug)]
pub struct Store {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl Store {
    /// Open the store rooted at `dir`. Nothing touches the disk until the first
    /// read or write; the directory is created on the first write.
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Open the store at the configured data directory (respects HUDDLE_DATA_DIR)
    pub fn open_default() -> Self {
        Self::open(crate::config::data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    /// Load every record of a collection in persisted order.
    /// A collection that was never written is empty.
    pub fn load<T: Record>(&self) -> Result<Vec<T>> {
        let path = self.path_of(T::COLLECTION);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|source| StoreError::Decode { path, source })
    }

    /// Append a record to the end of its collection and persist the whole
    /// collection. Returns the new number of records.
    pub fn append<T: Record>(&self, record: &T) -> Result<usize> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let existing: Vec<T> = self.load()?;
        let all: Vec<&T> = existing.iter().chain(std::iter::once(record)).collect();
        self.write_atomically(T::COLLECTION, &all)?;

        tracing::info!(collection = %T::COLLECTION, total = all.len(), "appended record");
        Ok(all.len())
    }

    pub fn checkins(&self) -> Result<Vec<CheckIn>> {
        self.load()
    }

    pub fn kudos(&self) -> Result<Vec<Kudos>> {
        self.load()
    }

    pub fn ideas(&self) -> Result<Vec<Idea>> {
        self.load()
    }

    pub fn status_events(&self) -> Result<Vec<ProblemStatusEvent>> {
        self.load()
    }

    fn write_atomically<S: Serialize>(&self, collection: Collection, records: &S) -> Result<()> {
        let mut json = serde_json::to_string_pretty(records)
            .map_err(|source| StoreError::Encode { collection, source })?;
        json.push('\n');

        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let target = self.path_of(collection);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", collection.file_name(), Uuid::new_v4()));

        if let Err(source) = write_synced(&tmp, json.as_bytes()) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StoreError::Io { path: tmp, source });
        }

        std::fs::rename(&tmp, &target).map_err(|source| {
            let _ = std::fs::remove_file(&tmp);
            StoreError::Io {
                path: target.clone(),
                source,
            }
        })?;

        // the rename itself lives in the directory entry
        if let Ok(dir) = std::fs::File::open(&self.dir) {
            if let Err(e) = dir.sync_all() {
                tracing::debug!(dir = %self.dir.display(), error = %e, "directory sync skipped");
            }
        }
        Ok(())
    }
}

/// Write `bytes` to a fresh file and flush them to disk before returning
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
