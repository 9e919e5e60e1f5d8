//! # Cache persistence backends.
//!
//! [`CacheBackend`] is the load/save seam behind [`CacheSession`]. Two
//! implementations ship with the crate:
//!
//! - [`FileBackend`]: a flat JSON file keyed by topic. Absent or corrupt
//!   files load as an empty store (cold start, never an error); saves
//!   overwrite the whole file.
//! - [`MemoryBackend`]: keeps the persisted representation in memory, so
//!   cache lifecycle logic can be tested without filesystem access.
//!
//! Concurrent processes sharing a file race; last writer wins, no locking.
//!
//! [`CacheSession`]: crate::cache::CacheSession

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::cache::store::{CacheEntry, CacheStore};
use crate::error::LensError;

/// Load/save contract for the persisted topic cache.
pub trait CacheBackend: Send + Sync + 'static {
    /// Reads the persisted store. Absence or unreadable content is
    /// equivalent to an empty store; this never fails the caller.
    fn load(&self) -> CacheStore;

    /// Fully overwrites the persisted representation.
    ///
    /// # Errors
    /// Returns [`LensError::Cache`] when the representation cannot be
    /// written.
    fn save(&self, store: &CacheStore) -> Result<(), LensError>;
}

/// On-disk entry shape: raw value plus epoch-seconds observation time.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    value: String,
    observed_at: f64,
}

fn to_persisted(store: &CacheStore) -> HashMap<String, PersistedEntry> {
    store
        .iter()
        .map(|(topic, entry)| {
            let secs = entry
                .observed_at
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or(Duration::ZERO)
                .as_secs_f64();
            (
                topic.to_string(),
                PersistedEntry {
                    value: entry.value.clone(),
                    observed_at: secs,
                },
            )
        })
        .collect()
}

fn from_persisted(entries: HashMap<String, PersistedEntry>) -> CacheStore {
    let mut store = CacheStore::new();
    for (topic, persisted) in entries {
        // Nonsense timestamps degrade to "very stale", never to a panic.
        let observed_at = Duration::try_from_secs_f64(persisted.observed_at)
            .map(|d| SystemTime::UNIX_EPOCH + d)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        store.insert_entry(
            topic,
            CacheEntry {
                value: persisted.value,
                observed_at,
            },
        );
    }
    store
}

/// Flat JSON file backend.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Creates a backend persisting to the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CacheBackend for FileBackend {
    fn load(&self) -> CacheStore {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return CacheStore::new();
        };
        match serde_json::from_str::<HashMap<String, PersistedEntry>>(&raw) {
            Ok(entries) => from_persisted(entries),
            // Corruption is a cold start, not a failure.
            Err(_) => CacheStore::new(),
        }
    }

    fn save(&self, store: &CacheStore) -> Result<(), LensError> {
        let persisted = to_persisted(store);
        let raw = serde_json::to_string_pretty(&persisted).map_err(|e| LensError::Cache {
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, raw).map_err(|e| LensError::Cache {
            reason: format!("{}: {e}", self.path.display()),
        })
    }
}

/// In-memory backend for tests: the "persisted" representation lives in a
/// mutex-guarded slot.
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<CacheStore>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryBackend {
    fn load(&self) -> CacheStore {
        match self.slot.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => CacheStore::new(),
        }
    }

    fn save(&self, store: &CacheStore) -> Result<(), LensError> {
        match self.slot.lock() {
            Ok(mut guard) => {
                *guard = store.clone();
                Ok(())
            }
            Err(_) => Err(LensError::Cache {
                reason: "memory backend poisoned".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_round_trip_keeps_entry_and_age() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("cache.json"));

        let mut store = backend.load();
        assert!(store.is_empty());

        store.set("home/kitchen/temperature", "21.5");
        backend.save(&store).unwrap();

        let reloaded = backend.load();
        assert_eq!(reloaded.len(), 1);
        let (value, age) = reloaded.get("home/kitchen/temperature").unwrap();
        assert_eq!(value, "21.5");
        assert!(age < Duration::from_secs(2));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("does-not-exist.json"));
        assert!(backend.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not json at all").unwrap();

        let backend = FileBackend::new(path);
        assert!(backend.load().is_empty());
    }

    #[test]
    fn test_save_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("cache.json"));

        let mut first = CacheStore::new();
        first.set("a", "1");
        first.set("b", "2");
        backend.save(&first).unwrap();

        let mut second = CacheStore::new();
        second.set("c", "3");
        backend.save(&second).unwrap();

        let reloaded = backend.load();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.get("a").is_none());
        assert_eq!(reloaded.get("c").unwrap().0, "3");
    }

    #[test]
    fn test_memory_backend_round_trip() {
        let backend = MemoryBackend::new();
        let mut store = backend.load();
        store.set("t", "v");
        backend.save(&store).unwrap();
        assert_eq!(backend.load().get("t").unwrap().0, "v");
    }
}
