//! Disk-backed topic-value cache with freshness tracking.

mod backend;
mod session;
mod store;

pub use backend::{CacheBackend, FileBackend, MemoryBackend};
pub use session::CacheSession;
pub use store::{CacheEntry, CacheStore};
