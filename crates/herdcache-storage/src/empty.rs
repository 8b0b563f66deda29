//! No-op store

use async_trait::async_trait;
use std::time::Duration;

use herdcache_core::{CacheEntry, CacheStore, Result};

/// A store that never retains anything
///
/// Reads always miss and writes are discarded, while `touch` always grants
/// the reservation. A loading cache layered on top therefore reloads on
/// every call and never caches the result, which disables caching without
/// changing call sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyStore;

impl EmptyStore {
    /// Create a new no-op store
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<V> CacheStore<V> for EmptyStore
where
    V: Clone + Send + Sync + 'static,
{
    async fn read(&self, _key: &str) -> Result<Option<CacheEntry<V>>> {
        Ok(None)
    }

    async fn write(&self, _key: &str, _entry: CacheEntry<V>, _backend_ttl: Duration) -> Result<()> {
        Ok(())
    }

    async fn touch(&self, _key: &str, _duration: Duration) -> Result<bool> {
        Ok(true)
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_always_miss() {
        let store = EmptyStore::new();

        CacheStore::<String>::write(
            &store,
            "k",
            CacheEntry::new(Some("v".to_string()), Duration::from_secs(60)).unwrap(),
            Duration::from_secs(120),
        )
        .await
        .unwrap();

        let found: Option<CacheEntry<String>> = store.read("k").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_touch_always_wins() {
        let store = EmptyStore::new();

        for _ in 0..3 {
            let won = CacheStore::<String>::touch(&store, "k", Duration::from_secs(10))
                .await
                .unwrap();
            assert!(won);
        }
    }

    #[tokio::test]
    async fn test_remove_and_clear_are_noops() {
        let store = EmptyStore::new();
        CacheStore::<String>::remove(&store, "k").await.unwrap();
        CacheStore::<String>::clear(&store).await.unwrap();
    }
}
