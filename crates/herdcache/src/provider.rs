//! Cross-cutting cache provider
//!
//! [`CacheProvider`] wraps any [`CacheStore`] with the behavior every
//! store shares: region+key composition, argument validation, duration
//! randomization and the failure policy. Stores stay trivial; this layer
//! is where a broken backend degrades to cache misses instead of errors.

use rand::Rng;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use herdcache_core::{CacheEntry, CacheError, CacheKey, CacheStore, Result};

/// Default symmetric jitter applied to entry durations
pub const DEFAULT_DURATION_ADJUSTMENT: f64 = 0.25;

/// Largest permitted jitter
pub const MAX_DURATION_ADJUSTMENT: f64 = 0.5;

/// Configuration for [`CacheProvider`]
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Symmetric jitter factor: effective durations are sampled uniformly
    /// from `duration * [1 - a, 1 + a]`
    pub duration_adjustment: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            duration_adjustment: DEFAULT_DURATION_ADJUSTMENT,
        }
    }
}

impl ProviderConfig {
    /// Create config with a specific jitter factor
    ///
    /// Fails with an argument error unless the factor is within
    /// `[0, MAX_DURATION_ADJUSTMENT]`.
    pub fn new(duration_adjustment: f64) -> Result<Self> {
        if !(0.0..=MAX_DURATION_ADJUSTMENT).contains(&duration_adjustment) {
            return Err(CacheError::argument(format!(
                "duration adjustment must be within [0, {MAX_DURATION_ADJUSTMENT}], got {duration_adjustment}"
            )));
        }
        Ok(Self {
            duration_adjustment,
        })
    }

    /// Disable jitter; entry durations become deterministic
    pub fn no_adjustment() -> Self {
        Self {
            duration_adjustment: 0.0,
        }
    }
}

/// Provider over a raw store
///
/// Operations take an optional region and a structural [`CacheKey`]; the
/// composite storage key is `"{serialized}-{region}"` when a non-empty
/// region is given. All failures except `touch` are swallowed and logged,
/// so callers observe misses and no-ops rather than backend errors.
pub struct CacheProvider<S, V> {
    store: Arc<S>,
    config: ProviderConfig,
    _value: PhantomData<fn() -> V>,
}

impl<S, V> Clone for CacheProvider<S, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            _value: PhantomData,
        }
    }
}

impl<S, V> CacheProvider<S, V>
where
    S: CacheStore<V>,
    V: Clone + Send + Sync + 'static,
{
    /// Create a provider with default configuration
    pub fn new(store: S) -> Self {
        Self::with_config(store, ProviderConfig::default())
    }

    /// Create a provider with custom configuration
    pub fn with_config(store: S, config: ProviderConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
            _value: PhantomData,
        }
    }

    /// The composite storage key for a region and key
    fn storage_key(region: Option<&str>, key: &CacheKey) -> String {
        match region {
            Some(region) if !region.is_empty() => format!("{}-{}", key.serialized(), region),
            _ => key.serialized().to_string(),
        }
    }

    /// Apply symmetric jitter, never dropping below one whole second
    fn effective_duration(&self, duration: Duration) -> Duration {
        let adjustment = self.config.duration_adjustment;
        if adjustment == 0.0 {
            return duration;
        }
        let factor = 1.0 + rand::rng().random_range(-adjustment..=adjustment);
        Duration::from_secs_f64((duration.as_secs_f64() * factor).max(1.0))
    }

    /// Read the entry for `key`, expired or not
    ///
    /// Returns `None` when no entry exists or when the store failed.
    pub async fn get(&self, region: Option<&str>, key: &CacheKey) -> Option<CacheEntry<V>> {
        let storage_key = Self::storage_key(region, key);
        match self.store.read(&storage_key).await {
            Ok(entry) => {
                debug!(
                    target: "herdcache",
                    key = %storage_key,
                    found = entry.is_some(),
                    "cache read"
                );
                entry
            }
            Err(error) => {
                warn!(target: "herdcache", key = %storage_key, error = %error, "cache read failed");
                None
            }
        }
    }

    /// Store `value` for `key` with a jittered lifetime
    ///
    /// The store's own lifetime is twice the effective duration, so the
    /// entry stays readable for stale serving after it logically expires.
    /// Failures are swallowed; a subsequent `get` simply misses.
    pub async fn put(&self, region: Option<&str>, key: &CacheKey, value: V, duration: Duration) {
        let storage_key = Self::storage_key(region, key);
        if let Err(error) = self.try_put(&storage_key, value, duration).await {
            warn!(target: "herdcache", key = %storage_key, error = %error, "cache write failed");
        }
    }

    async fn try_put(&self, storage_key: &str, value: V, duration: Duration) -> Result<()> {
        if duration.as_secs() == 0 {
            return Err(CacheError::argument("entry duration must be positive"));
        }
        let effective = self.effective_duration(duration);
        let entry = CacheEntry::new(Some(value), effective)?;
        self.store
            .write(storage_key, entry, effective.saturating_mul(2))
            .await
    }

    /// Conditionally reserve `key` for `duration`
    ///
    /// Exactly one of any number of concurrent callers against an absent
    /// or expired key receives `true`. Unlike the other operations this
    /// re-raises failures: a swallowed error here would be
    /// indistinguishable from a successful reservation.
    pub async fn touch(
        &self,
        region: Option<&str>,
        key: &CacheKey,
        duration: Duration,
    ) -> Result<bool> {
        let storage_key = Self::storage_key(region, key);
        if duration.as_secs() == 0 {
            let error = CacheError::argument("touch duration must be positive");
            warn!(target: "herdcache", key = %storage_key, error = %error, "cache touch rejected");
            return Err(error);
        }
        match self.store.touch(&storage_key, duration).await {
            Ok(won) => {
                debug!(target: "herdcache", key = %storage_key, won, "cache touch");
                Ok(won)
            }
            Err(error) => {
                warn!(target: "herdcache", key = %storage_key, error = %error, "cache touch failed");
                Err(error)
            }
        }
    }

    /// Delete the entry for `key`; failures are swallowed
    pub async fn remove(&self, region: Option<&str>, key: &CacheKey) {
        let storage_key = Self::storage_key(region, key);
        if let Err(error) = self.store.remove(&storage_key).await {
            warn!(target: "herdcache", key = %storage_key, error = %error, "cache remove failed");
        }
    }

    /// Drop every entry in every region; failures are swallowed
    pub async fn clear(&self) {
        if let Err(error) = self.store.clear().await {
            warn!(target: "herdcache", error = %error, "cache clear failed");
        }
    }
}
