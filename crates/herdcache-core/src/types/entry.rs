//! Cache entry type

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{CacheError, Result};

/// Current wall-clock time as whole seconds since the Unix epoch
pub fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// A cached value with an absolute expiration timestamp
///
/// The value may be absent: a touch reservation writes a placeholder entry
/// that carries the previous value, or nothing on a true miss. Expiration
/// is wall-clock epoch seconds, not monotonic time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    value: Option<V>,
    expires_at: u64,
}

impl<V> CacheEntry<V> {
    /// Create an entry expiring `duration` from now
    ///
    /// Fails with an argument error unless the duration is at least one
    /// whole second.
    pub fn new(value: Option<V>, duration: Duration) -> Result<Self> {
        if duration.as_secs() == 0 {
            return Err(CacheError::argument("entry duration must be positive"));
        }
        Ok(Self {
            value,
            expires_at: epoch_now() + duration.as_secs(),
        })
    }

    /// The cached value, if any
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Consume the entry and take the value
    pub fn into_value(self) -> Option<V> {
        self.value
    }

    /// Absolute expiration, in epoch seconds
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Whether the logical lifetime has passed
    pub fn has_expired(&self) -> bool {
        epoch_now() > self.expires_at
    }
}
