//! Auto-loading cache managers
//!
//! A loading cache wraps a [`CacheProvider`](crate::CacheProvider) with a
//! fixed region, entry and reservation lifetimes, and a [`Loader`] for the
//! slow data source. The synchronous [`LoadingCache`] blocks the caller
//! while it reloads; [`AsyncLoadingCache`] serves stale data and refreshes
//! in the background.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use herdcache_core::{CacheError, CacheKey, Result};

mod loading;
pub use loading::LoadingCache;

mod refresh;
pub use refresh::AsyncLoadingCache;

/// Default entry lifetime
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(3600);

/// Default reservation lifetime granted to a reload winner
pub const DEFAULT_TOUCH_DURATION: Duration = Duration::from_secs(600);

/// Loads values from the slow data source on cache miss
#[async_trait]
pub trait Loader<V>: Send + Sync + 'static {
    /// Load the value for the given key
    async fn load(&self, key: &CacheKey) -> Result<V>;
}

// Shared loader handles delegate to the inner loader
#[async_trait]
impl<V, L> Loader<V> for Arc<L>
where
    V: Send + 'static,
    L: Loader<V>,
{
    async fn load(&self, key: &CacheKey) -> Result<V> {
        (**self).load(key).await
    }
}

/// Configuration for the loading caches
#[derive(Debug, Clone)]
pub struct LoadingConfig {
    /// Region the manager operates in
    pub region: String,
    /// Lifetime of loaded entries
    pub cache_duration: Duration,
    /// Lifetime of a reload reservation; keep it short so other callers
    /// retry soon if the winning loader crashes
    pub touch_duration: Duration,
}

impl LoadingConfig {
    /// Create config for a region with default durations
    ///
    /// Fails with an argument error when `region` is empty.
    pub fn new(region: impl Into<String>) -> Result<Self> {
        let region = region.into();
        if region.is_empty() {
            return Err(CacheError::argument("region must not be empty"));
        }
        Ok(Self {
            region,
            cache_duration: DEFAULT_CACHE_DURATION,
            touch_duration: DEFAULT_TOUCH_DURATION,
        })
    }

    /// Override both durations
    ///
    /// Fails with an argument error unless both are at least one whole
    /// second.
    pub fn durations(mut self, cache_duration: Duration, touch_duration: Duration) -> Result<Self> {
        if cache_duration.as_secs() == 0 {
            return Err(CacheError::argument("cache duration must be positive"));
        }
        if touch_duration.as_secs() == 0 {
            return Err(CacheError::argument("touch duration must be positive"));
        }
        self.cache_duration = cache_duration;
        self.touch_duration = touch_duration;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoadingConfig::new("users").unwrap();
        assert_eq!(config.region, "users");
        assert_eq!(config.cache_duration, DEFAULT_CACHE_DURATION);
        assert_eq!(config.touch_duration, DEFAULT_TOUCH_DURATION);
    }

    #[test]
    fn test_empty_region_rejected() {
        assert!(LoadingConfig::new("").is_err());
    }

    #[test]
    fn test_duration_overrides() {
        let config = LoadingConfig::new("users")
            .unwrap()
            .durations(Duration::from_secs(60), Duration::from_secs(5))
            .unwrap();
        assert_eq!(config.cache_duration, Duration::from_secs(60));
        assert_eq!(config.touch_duration, Duration::from_secs(5));

        assert!(
            LoadingConfig::new("users")
                .unwrap()
                .durations(Duration::ZERO, Duration::from_secs(5))
                .is_err()
        );
        assert!(
            LoadingConfig::new("users")
                .unwrap()
                .durations(Duration::from_secs(60), Duration::ZERO)
                .is_err()
        );
    }
}
