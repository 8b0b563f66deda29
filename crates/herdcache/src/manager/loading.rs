//! Synchronous read-through cache

use std::sync::Arc;
use tracing::warn;

use herdcache_core::{CacheKey, CacheStore};

use super::{Loader, LoadingConfig};
use crate::provider::CacheProvider;

/// Read-through cache that reloads on the caller's task
///
/// A `get` is a three-way decision over the stored entry: a fresh hit
/// returns the stored value, while a miss or an expired entry triggers a
/// reload race. The provider's `touch` reservation turns that race into a
/// single-winner contest; the winner calls the loader and stores the
/// result, losers settle for the stale value (or `None` on a true miss)
/// or retry with a later `get`.
pub struct LoadingCache<S, V, L> {
    provider: Arc<CacheProvider<S, V>>,
    loader: Arc<L>,
    config: LoadingConfig,
}

impl<S, V, L> Clone for LoadingCache<S, V, L> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            loader: Arc::clone(&self.loader),
            config: self.config.clone(),
        }
    }
}

impl<S, V, L> LoadingCache<S, V, L>
where
    S: CacheStore<V>,
    V: Clone + Send + Sync + 'static,
    L: Loader<V>,
{
    /// Create a loading cache over a provider
    pub fn new(provider: CacheProvider<S, V>, loader: L, config: LoadingConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            loader: Arc::new(loader),
            config,
        }
    }

    fn region(&self) -> Option<&str> {
        Some(self.config.region.as_str())
    }

    /// Get the value for `key`, loading it if missing or expired
    ///
    /// Returns `None` on a miss lost to another caller, on a failed load,
    /// or when the winning reservation is still being filled.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        match self.provider.get(self.region(), key).await {
            None => self.load_missing(key).await,
            Some(entry) if entry.has_expired() => {
                let stale = entry.into_value();
                self.reload_expired(key, stale).await
            }
            Some(entry) => entry.into_value(),
        }
    }

    /// Drop the entry for `key`
    pub async fn evict(&self, key: &CacheKey) {
        self.provider.remove(self.region(), key).await;
    }

    /// Miss branch: the touch winner loads and stores, losers get `None`
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

    /// Stale branch: the touch winner reloads, everyone else serves the
    /// value already in hand
    async fn reload_expired(&self, key: &CacheKey, stale: Option<V>) -> Option<V> {
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
                    warn!(
                        target: "herdcache",
                        key = %key,
                        error = %error,
                        "reload failed, serving stale value"
                    );
                    stale
                }
            },
            Ok(false) => stale,
            Err(error) => {
                warn!(
                    target: "herdcache",
                    key = %key,
                    error = %error,
                    "reservation failed, serving stale value"
                );
                stale
            }
        }
    }
}
