//! Read-through cache with background refresh

use std::sync::Arc;
use tracing::warn;

use herdcache_core::{CacheKey, CacheStore, TaskRunner};

use super::{Loader, LoadingConfig};
use crate::provider::CacheProvider;

/// Read-through cache that never blocks a reader on an expiring entry
///
/// Identical to [`LoadingCache`](super::LoadingCache) on a miss or a fresh
/// hit. On an expired entry the touch winner hands the reload to the task
/// runner and returns the stale value immediately; losers return the
/// stale value without scheduling anything. The provider keeps expired
/// entries readable (its hard storage lifetime is twice the logical one),
/// and the touch reservation bounds the system to one inflight refresh
/// per key.
pub struct AsyncLoadingCache<S, V, L> {
    provider: Arc<CacheProvider<S, V>>,
    loader: Arc<L>,
    runner: Arc<dyn TaskRunner>,
    config: LoadingConfig,
}

impl<S, V, L> Clone for AsyncLoadingCache<S, V, L> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            loader: Arc::clone(&self.loader),
            runner: Arc::clone(&self.runner),
            config: self.config.clone(),
        }
    }
}

impl<S, V, L> AsyncLoadingCache<S, V, L>
where
    S: CacheStore<V>,
    V: Clone + Send + Sync + 'static,
    L: Loader<V>,
{
    /// Create an async loading cache over a provider and a task runner
    pub fn new(
        provider: CacheProvider<S, V>,
        loader: L,
        runner: Arc<dyn TaskRunner>,
        config: LoadingConfig,
    ) -> Self {
        Self {
            provider: Arc::new(provider),
            loader: Arc::new(loader),
            runner,
            config,
        }
    }

    fn region(&self) -> Option<&str> {
        Some(self.config.region.as_str())
    }

    /// Get the value for `key`
    ///
    /// An expired entry is returned as-is while at most one background
    /// refresh replaces it; a miss loads on the caller's task exactly as
    /// the synchronous cache does.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        match self.provider.get(self.region(), key).await {
            None => self.load_missing(key).await,
            Some(entry) if entry.has_expired() => {
                let stale = entry.into_value();
                match self
                    .provider
                    .touch(self.region(), key, self.config.touch_duration)
                    .await
                {
                    Ok(true) => self.spawn_refresh(key),
                    Ok(false) => {}
                    Err(error) => {
                        warn!(
                            target: "herdcache",
                            key = %key,
                            error = %error,
                            "reservation failed, serving stale value"
                        );
                    }
                }
                stale
            }
            Some(entry) => entry.into_value(),
        }
    }

    /// Drop the entry for `key`
    pub async fn evict(&self, key: &CacheKey) {
        self.provider.remove(self.region(), key).await;
    }

    /// Miss branch, on the caller's task: the touch winner loads and
    /// stores, losers get `None`
    async fn load_missing(&self, key: &CacheKey) -> Option<V> {
        match self
            .provider
            .touch(self.region(), key, self.config.touch_duration)
            .await
        {
            Ok(true) => match self.loader.load(key).await {
                Ok(value) => {
                    self.provider
                        .put(self.region(), key, value.clone(), self.config.cache_duration)
                        .await;
                    Some(value)
                }
                Err(error) => {
                    warn!(target: "herdcache", key = %key, error = %error, "load failed");
                    None
                }
            },
            Ok(false) => None,
            Err(error) => {
                warn!(target: "herdcache", key = %key, error = %error, "reservation failed");
                None
            }
        }
    }

    /// Hand a reload for `key` to the runner
    fn spawn_refresh(&self, key: &CacheKey) {
        let provider = Arc::clone(&self.provider);
        let loader = Arc::clone(&self.loader);
        let key = key.clone();
        let region = self.config.region.clone();
        let cache_duration = self.config.cache_duration;

        self.runner.submit(Box::pin(async move {
            match loader.load(&key).await {
                Ok(value) => {
                    provider
                        .put(Some(&region), &key, value, cache_duration)
                        .await;
                }
                Err(error) => {
                    warn!(
                        target: "herdcache",
                        key = %key,
                        error = %error,
                        "background refresh failed"
                    );
                }
            }
        }));
    }
}
