//! Integration tests for the loading caches

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

use crate::prelude::*;

/// Loader that counts invocations and returns the running count
struct CountingLoader {
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingLoader {
    fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Loader<String> for CountingLoader {
    async fn load(&self, _key: &CacheKey) -> Result<String> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(count.to_string())
    }
}

/// Loader that always fails
struct FailingLoader;

#[async_trait]
impl Loader<String> for FailingLoader {
    async fn load(&self, key: &CacheKey) -> Result<String> {
        Err(CacheError::Backend(format!("source down for {key}")))
    }
}

/// Loader returning a fixed value, counting invocations
struct FixedLoader {
    value: String,
    calls: AtomicUsize,
    delay: Duration,
}

impl FixedLoader {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Loader<String> for FixedLoader {
    async fn load(&self, _key: &CacheKey) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.value.clone())
    }
}

fn provider_over(
    store: MemoryStore<String>,
) -> CacheProvider<MemoryStore<String>, String> {
    CacheProvider::with_config(store, ProviderConfig::no_adjustment())
}

fn provider() -> CacheProvider<MemoryStore<String>, String> {
    provider_over(MemoryStore::with_defaults())
}

fn config() -> LoadingConfig {
    LoadingConfig::new("R")
        .unwrap()
        .durations(Duration::from_secs(3600), Duration::from_secs(600))
        .unwrap()
}

fn user_key() -> CacheKey {
    CacheKey::new("user", 1, vec![Component::from(42)]).unwrap()
}

#[tokio::test]
async fn test_miss_load_hit() {
    let key = user_key();
    assert_eq!(key.serialized(), "42-user-v1");

    let loader = Arc::new(FixedLoader::new("U42"));
    let cache = LoadingCache::new(provider(), Arc::clone(&loader), config());

    // First call loads, second is answered from the cache
    assert_eq!(cache.get(&key).await, Some("U42".to_string()));
    assert_eq!(cache.get(&key).await, Some("U42".to_string()));
    assert_eq!(loader.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_miss_loads_exactly_once() {
    let loader = Arc::new(CountingLoader::with_delay(Duration::from_millis(100)));
    let cache = Arc::new(LoadingCache::new(provider(), Arc::clone(&loader), config()));
    let barrier = Arc::new(Barrier::new(20));

    let mut handles = Vec::new();
    for _ in 0..20 {
        let cache = Arc::clone(&cache);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            cache.get(&user_key()).await
        }));
    }

    let mut loaded = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            loaded += 1;
        }
    }

    // One winner loaded; everyone else observed the in-flight reservation
    assert_eq!(loaded, 1);
    assert_eq!(loader.calls(), 1);

    // The winner's value is now cached for everyone
    assert_eq!(cache.get(&user_key()).await, Some("1".to_string()));
    assert_eq!(loader.calls(), 1);
}

#[tokio::test]
async fn test_live_reservation_yields_none() {
    let store = MemoryStore::with_defaults();
    let key = user_key();

    // Another caller holds a fresh reservation on the key
    let reserved = provider_over(store.clone())
        .touch(Some("R"), &key, Duration::from_secs(600))
        .await
        .unwrap();
    assert!(reserved);

    // The placeholder is a fresh entry with no value, and the touch loss
    // keeps this caller from loading
    let loader = Arc::new(FixedLoader::new("V"));
    let cache = LoadingCache::new(provider_over(store), Arc::clone(&loader), config());
    assert_eq!(cache.get(&key).await, None);
    assert_eq!(loader.calls(), 0);
}

#[tokio::test]
async fn test_failed_load_returns_none() {
    let cache = LoadingCache::new(provider(), FailingLoader, config());
    assert_eq!(cache.get(&user_key()).await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sync_reload_replaces_expired_entry() {
    let store = MemoryStore::with_defaults();
    let key = user_key();
    provider_over(store.clone())
        .put(Some("R"), &key, "old".to_string(), Duration::from_secs(2))
        .await;

    let loader = Arc::new(FixedLoader::new("new"));
    let cache = LoadingCache::new(provider_over(store), Arc::clone(&loader), config());

    tokio::time::sleep(Duration::from_secs(3)).await;

    // The caller blocks on the reload and gets the fresh value
    assert_eq!(cache.get(&key).await, Some("new".to_string()));
    assert_eq!(loader.calls(), 1);
    assert_eq!(cache.get(&key).await, Some("new".to_string()));
    assert_eq!(loader.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sync_failed_reload_serves_stale() {
    let store = MemoryStore::with_defaults();
    let key = user_key();
    provider_over(store.clone())
        .put(Some("R"), &key, "old".to_string(), Duration::from_secs(2))
        .await;

    let cache = LoadingCache::new(provider_over(store), FailingLoader, config());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(cache.get(&key).await, Some("old".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_async_stale_serve_with_single_refresh() {
    let store = MemoryStore::with_defaults();
    let key = user_key();
    provider_over(store.clone())
        .put(Some("R"), &key, "old".to_string(), Duration::from_secs(2))
        .await;

    let loader = Arc::new(FixedLoader::new("new").delayed(Duration::from_millis(100)));
    let cache = Arc::new(AsyncLoadingCache::new(
        provider_over(store),
        Arc::clone(&loader),
        Arc::new(TokioRunner),
        config(),
    ));

    tokio::time::sleep(Duration::from_secs(3)).await;

    // Both concurrent readers are answered from the expired entry
    let first = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get(&user_key()).await })
    };
    let second = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get(&user_key()).await })
    };
    assert_eq!(first.await.unwrap(), Some("old".to_string()));
    assert_eq!(second.await.unwrap(), Some("old".to_string()));

    // Exactly one background refresh replaced the entry
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(loader.calls(), 1);
    assert_eq!(cache.get(&key).await, Some("new".to_string()));
}

#[tokio::test]
async fn test_async_miss_loads_on_caller() {
    let loader = Arc::new(FixedLoader::new("fresh"));
    let cache = AsyncLoadingCache::new(
        provider(),
        Arc::clone(&loader),
        Arc::new(TokioRunner),
        config(),
    );

    assert_eq!(cache.get(&user_key()).await, Some("fresh".to_string()));
    assert_eq!(loader.calls(), 1);
}

#[tokio::test]
async fn test_evict_forces_reload() {
    let loader = Arc::new(FixedLoader::new("V"));
    let cache = LoadingCache::new(provider(), Arc::clone(&loader), config());
    let key = user_key();

    cache.get(&key).await;
    cache.evict(&key).await;
    cache.get(&key).await;

    assert_eq!(loader.calls(), 2);
}

#[tokio::test]
async fn test_empty_store_disables_caching() {
    let provider = CacheProvider::with_config(EmptyStore::new(), ProviderConfig::no_adjustment());
    let loader = Arc::new(FixedLoader::new("V"));
    let cache = LoadingCache::new(provider, Arc::clone(&loader), config());
    let key = user_key();

    // Every call reloads; nothing is ever cached
    assert_eq!(cache.get(&key).await, Some("V".to_string()));
    assert_eq!(cache.get(&key).await, Some("V".to_string()));
    assert_eq!(cache.get(&key).await, Some("V".to_string()));
    assert_eq!(loader.calls(), 3);
}

#[tokio::test]
async fn test_regions_partition_entries() {
    let store = MemoryStore::with_defaults();
    let key = user_key();

    let loader_a = Arc::new(FixedLoader::new("from-a"));
    let cache_a = LoadingCache::new(
        provider_over(store.clone()),
        Arc::clone(&loader_a),
        LoadingConfig::new("region-a").unwrap(),
    );

    let loader_b = Arc::new(FixedLoader::new("from-b"));
    let cache_b = LoadingCache::new(
        provider_over(store),
        Arc::clone(&loader_b),
        LoadingConfig::new("region-b").unwrap(),
    );

    assert_eq!(cache_a.get(&key).await, Some("from-a".to_string()));
    assert_eq!(cache_b.get(&key).await, Some("from-b".to_string()));
    assert_eq!(loader_a.calls(), 1);
    assert_eq!(loader_b.calls(), 1);
}
