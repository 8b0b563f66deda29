//! herdcache-storage: Storage backends for herdcache
//!
//! Provides the bounded in-memory LRU store and the no-op store. Both
//! implement the `CacheStore` trait from `herdcache-core`; the
//! cross-cutting provider behavior (region composition, duration
//! randomization, failure policy) lives in the `herdcache` crate.

mod empty;
mod memory;

pub use empty::EmptyStore;
pub use memory::{MemoryConfig, MemoryStore};
