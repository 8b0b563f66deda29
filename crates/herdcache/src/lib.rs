//! herdcache: Auto-loading, stampede-proof expiring cache
//!
//! # Features
//!
//! - **Read-through loading** with single-loader coordination: concurrent
//!   callers for the same missing or expired key never stampede the data
//!   source
//! - **Stale serving**: the async cache answers from the expired entry
//!   while one background refresh replaces it
//! - **Bounded in-memory LRU store** with an optional overflow spool
//! - **Duration jitter** against synchronized expiration storms
//! - **Bounded async executor** with promotion of queued tasks
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use herdcache::prelude::*;
//!
//! struct UserLoader;
//!
//! #[async_trait]
//! impl Loader<String> for UserLoader {
//!     async fn load(&self, key: &CacheKey) -> Result<String> {
//!         Ok(format!("user for {key}"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let provider = CacheProvider::new(MemoryStore::with_defaults());
//!     let config = LoadingConfig::new("users")?
//!         .durations(Duration::from_secs(3600), Duration::from_secs(600))?;
//!     let cache = LoadingCache::new(provider, UserLoader, config);
//!
//!     let key = CacheKey::mono("user", 1, 42)?;
//!     let value = cache.get(&key).await;
//!     println!("loaded: {value:?}");
//!     Ok(())
//! }
//! ```

mod executor;
mod manager;
mod provider;

// Re-export core
pub use herdcache_core::*;

// Re-export storage
pub use herdcache_storage::{EmptyStore, MemoryConfig, MemoryStore};

// Export provider, managers and executor
pub use executor::{BoundedExecutor, TaskFuture, TokioRunner};
pub use manager::{
    AsyncLoadingCache, DEFAULT_CACHE_DURATION, DEFAULT_TOUCH_DURATION, Loader, LoadingCache,
    LoadingConfig,
};
pub use provider::{
    CacheProvider, DEFAULT_DURATION_ADJUSTMENT, MAX_DURATION_ADJUSTMENT, ProviderConfig,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AsyncLoadingCache, BoundedExecutor, CacheEntry, CacheError, CacheKey, CacheProvider,
        CacheStore, Component, EmptyStore, Loader, LoadingCache, LoadingConfig, MemoryConfig,
        MemoryStore, ProviderConfig, Result, TaskRunner, TokioRunner,
    };
}

#[cfg(test)]
mod tests;
