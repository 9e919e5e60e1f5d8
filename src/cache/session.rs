//! # Scoped cache session.
//!
//! [`CacheSession`] enforces the cache lifecycle contract: load fully at the
//! start of an operation, mutate in place as reads complete, flush fully
//! back exactly once at the end.
//!
//! The collector keeps every failure on its happy path as data (per-topic
//! errors) precisely so that `close` is always reached — values fetched
//! before a transport failure must still be persisted.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use topiclens::{CacheSession, MemoryBackend};
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let mut session = CacheSession::open(backend.clone());
//! session.set("home/lamp", "ON");
//! session.close().unwrap();
//!
//! let reopened = CacheSession::open(backend);
//! assert_eq!(reopened.get("home/lamp").unwrap().0, "ON");
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::cache::backend::CacheBackend;
use crate::cache::store::CacheStore;
use crate::error::LensError;

/// Scoped handle over the persisted cache: acquire → mutate → flush.
pub struct CacheSession {
    store: CacheStore,
    backend: Arc<dyn CacheBackend>,
}

impl CacheSession {
    /// Opens a session by loading the persisted store.
    ///
    /// Absent or corrupt persisted content yields an empty store.
    pub fn open(backend: Arc<dyn CacheBackend>) -> Self {
        let store = backend.load();
        Self { store, backend }
    }

    /// Returns the cached raw value and its age for a topic.
    pub fn get(&self, topic: &str) -> Option<(&str, Duration)> {
        self.store.get(topic)
    }

    /// Records a fresh observation for a topic.
    pub fn set(&mut self, topic: impl Into<String>, value: impl Into<String>) {
        self.store.set(topic, value);
    }

    /// Flushes the store back to the backend, consuming the session.
    ///
    /// # Errors
    /// Returns [`LensError::Cache`] when the backend cannot persist.
    pub fn close(self) -> Result<(), LensError> {
        self.backend.save(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backend::MemoryBackend;

    #[test]
    fn test_close_persists_mutations() {
        let backend = Arc::new(MemoryBackend::new());

        let mut session = CacheSession::open(backend.clone());
        assert!(session.get("t").is_none());
        session.set("t", "42");
        session.close().unwrap();

        let session = CacheSession::open(backend);
        assert_eq!(session.get("t").unwrap().0, "42");
    }

    #[test]
    fn test_save_load_idempotent_on_empty_store() {
        let backend = Arc::new(MemoryBackend::new());
        CacheSession::open(backend.clone()).close().unwrap();
        assert!(CacheSession::open(backend).get("anything").is_none());
    }
}
