//! # In-memory cache store.
//!
//! [`CacheStore`] maps topic names to [`CacheEntry`] values. It is loaded
//! fully into memory at the start of an operation and flushed fully back by
//! the backend at the end; there are no incremental writes. One entry per
//! topic, overwritten whole on every new observation.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// One cached observation: the raw (pre-JSON-parse) value and when it was
/// last seen live.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    /// Raw value string exactly as received from the bus.
    pub value: String,
    /// Wall-clock time of the observation.
    pub observed_at: SystemTime,
}

/// Topic → entry mapping, owned exclusively by the cache layer.
#[derive(Clone, Debug, Default)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
}

impl CacheStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value and its age (elapsed since observation) for a
    /// topic, or `None` if the topic was never cached.
    pub fn get(&self, topic: &str) -> Option<(&str, Duration)> {
        self.entries.get(topic).map(|entry| {
            let age = SystemTime::now()
                .duration_since(entry.observed_at)
                .unwrap_or(Duration::ZERO);
            (entry.value.as_str(), age)
        })
    }

    /// Inserts or overwrites the entry for a topic, stamping the current
    /// time as its observation time.
    pub fn set(&mut self, topic: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(
            topic.into(),
            CacheEntry {
                value: value.into(),
                observed_at: SystemTime::now(),
            },
        );
    }

    /// Inserts an entry with an explicit observation time (backend loads).
    pub(crate) fn insert_entry(&mut self, topic: String, entry: CacheEntry) {
        self.entries.insert(topic, entry);
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of cached topics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
