//! Bounded in-memory store with LRU eviction and an optional spool

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use herdcache_core::{CacheEntry, CacheStore, Result, epoch_now};

/// Default capacity of the primary area
pub const DEFAULT_SIZE: usize = 128;

/// Configuration for the memory store
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Maximum number of entries in the primary area
    pub max_size: usize,
    /// Capacity of the spool that absorbs evicted entries (0 = disabled)
    pub spool_size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_SIZE,
            spool_size: 0,
        }
    }
}

impl MemoryConfig {
    /// Create config with a specific primary capacity
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            max_size,
            ..Default::default()
        }
    }

    /// Enable the overflow spool with the given capacity
    pub fn spool(mut self, spool_size: usize) -> Self {
        self.spool_size = spool_size;
        self
    }
}

/// An entry together with its hard storage deadline
///
/// The logical expiration lives inside the entry; the hard deadline is the
/// store-level lifetime past which the bytes are gone for good.
struct Stored<V> {
    entry: CacheEntry<V>,
    hard_deadline: u64,
}

struct Inner<V> {
    primary: LruCache<String, Stored<V>>,
    spool: Option<LruCache<String, Stored<V>>>,
}

impl<V: Clone> Inner<V> {
    /// Insert into the primary area, spilling the evicted entry (if any)
    /// into the spool
    fn insert(&mut self, key: String, stored: Stored<V>) {
        if let Some((evicted_key, evicted)) = self.primary.push(key.clone(), stored) {
            // push returns the replaced value when the key already existed
            if evicted_key != key {
                if let Some(spool) = self.spool.as_mut() {
                    spool.put(evicted_key, evicted);
                }
            }
        }
    }

    /// Look up a live entry, promoting it to most-recently-used
    ///
    /// Spool hits move back into the primary area. Entries past their hard
    /// deadline are dropped.
    fn lookup(&mut self, key: &str, now: u64) -> Option<CacheEntry<V>> {
        let primary_hit = self
            .primary
            .get(key)
            .map(|stored| (stored.entry.clone(), now > stored.hard_deadline));
        if let Some((entry, dead)) = primary_hit {
            if dead {
                self.primary.pop(key);
                return None;
            }
            return Some(entry);
        }

        let spooled = self.spool.as_mut().and_then(|spool| spool.pop(key))?;
        if now > spooled.hard_deadline {
            return None;
        }
        let entry = spooled.entry.clone();
        self.insert(key.to_string(), spooled);
        Some(entry)
    }
}

/// Bounded in-memory store
///
/// An access-ordered map protected by a single exclusive lock; every
/// operation, including the read-check-write of `touch`, runs as one
/// critical section. Cloning creates a new handle to the SAME underlying
/// store.
pub struct MemoryStore<V> {
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V> Clone for MemoryStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> MemoryStore<V> {
    /// Create a new memory store
    pub fn new(config: MemoryConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        let spool = NonZeroUsize::new(config.spool_size).map(LruCache::new);

        Self {
            inner: Arc::new(Mutex::new(Inner {
                primary: LruCache::new(capacity),
                spool,
            })),
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Number of entries in the primary area
    pub fn len(&self) -> usize {
        self.inner.lock().primary.len()
    }

    /// Whether the primary area is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of evicted entries currently held by the spool
    pub fn spool_len(&self) -> usize {
        self.inner
            .lock()
            .spool
            .as_ref()
            .map(LruCache::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl<V> CacheStore<V> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn read(&self, key: &str) -> Result<Option<CacheEntry<V>>> {
        let mut inner = self.inner.lock();
        Ok(inner.lookup(key, epoch_now()))
    }

    async fn write(&self, key: &str, entry: CacheEntry<V>, backend_ttl: Duration) -> Result<()> {
        let mut inner = self.inner.lock();
        let stored = Stored {
            entry,
            hard_deadline: epoch_now() + backend_ttl.as_secs(),
        };
        inner.insert(key.to_string(), stored);
        Ok(())
    }

    async fn touch(&self, key: &str, duration: Duration) -> Result<bool> {
        let mut inner = self.inner.lock();
        let now = epoch_now();

        let existing = inner.lookup(key, now);
        if let Some(entry) = &existing {
            if !entry.has_expired() {
                return Ok(false);
            }
        }

        // Reservation placeholder keeps the previous value readable
        let previous = existing.and_then(CacheEntry::into_value);
        let entry = CacheEntry::new(previous, duration)?;
        let stored = Stored {
            entry,
            hard_deadline: now + duration.as_secs().saturating_mul(2),
        };
        inner.insert(key.to_string(), stored);
        Ok(true)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.primary.pop(key);
        if let Some(spool) = inner.spool.as_mut() {
            spool.pop(key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.primary.clear();
        if let Some(spool) = inner.spool.as_mut() {
            spool.clear();
        }
        Ok(())
    }
}
