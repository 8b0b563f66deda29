//! Cache store trait

use async_trait::async_trait;
use std::time::Duration;

use crate::{CacheEntry, Result};

/// Raw storage operations behind a cache provider
///
/// Implementations work on pre-composed string keys; region composition,
/// duration randomization and failure policy live in the provider layer.
/// Stores include the in-memory LRU store and the no-op store.
#[async_trait]
pub trait CacheStore<V>: Send + Sync + 'static {
    /// Read the entry under `key`, **regardless of logical expiration**
    ///
    /// Expired entries are returned deliberately so callers can serve the
    /// old value while a refresh is arranged. Returns `None` only when no
    /// entry exists at all.
    async fn read(&self, key: &str) -> Result<Option<CacheEntry<V>>>;

    /// Store `entry` under `key`, replacing any previous entry
    ///
    /// `backend_ttl` is the hard lifetime of the stored bytes: stores with
    /// their own expiration drop the entry only after it passes, which
    /// keeps logically-expired entries readable for stale serving.
    async fn write(&self, key: &str, entry: CacheEntry<V>, backend_ttl: Duration) -> Result<()>;

    /// Conditionally reserve `key` for `duration`
    ///
    /// If no entry exists, or the existing entry has logically expired,
    /// write a placeholder entry carrying the previous value (absent on a
    /// true miss) and return `true`. If an unexpired entry exists, return
    /// `false` without mutation. The read-check-write must be atomic: for
    /// any number of concurrent callers against the same absent or
    /// expired key, exactly one receives `true`.
    async fn touch(&self, key: &str, duration: Duration) -> Result<bool>;

    /// Delete the entry under `key`; no-op when absent
    async fn remove(&self, key: &str) -> Result<()>;

    /// Drop every entry in every region
    async fn clear(&self) -> Result<()>;
}
