//! Stale-Serve Example
//!
//! Demonstrates the async loading cache answering readers from an expired
//! entry while a single background refresh replaces it.

use async_trait::async_trait;
use herdcache::prelude::*;
use std::sync::Arc;
use std::time::Duration;

struct VersionedSource;

#[async_trait]
impl Loader<String> for VersionedSource {
    async fn load(&self, _key: &CacheKey) -> Result<String> {
        println!("  → background refresh running");
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok("Dashboard v2".to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let store = MemoryStore::with_defaults();
    let provider = CacheProvider::with_config(store.clone(), ProviderConfig::no_adjustment());
    let config = LoadingConfig::new("demo")?
        .durations(Duration::from_secs(60), Duration::from_secs(10))?;
    let cache = AsyncLoadingCache::new(
        CacheProvider::with_config(store, ProviderConfig::no_adjustment()),
        VersionedSource,
        Arc::new(TokioRunner),
        config,
    );

    println!("=== Stale-Serve Demo ===\n");

    let key = CacheKey::singleton("dashboard", 1)?;
    provider
        .put(
            Some("demo"),
            &key,
            "Dashboard v1".to_string(),
            Duration::from_secs(2),
        )
        .await;
    println!("✓ Seeded '{key}' with a 2 second lifetime");

    println!("\n⏳ Waiting 3 seconds for the entry to expire...\n");
    tokio::time::sleep(Duration::from_secs(3)).await;

    // The reader is not blocked by the refresh
    let value = cache.get(&key).await;
    println!("T+3s: served {value:?} while the refresh runs");

    tokio::time::sleep(Duration::from_millis(300)).await;
    let value = cache.get(&key).await;
    println!("T+3.3s: refresh landed, now serving {value:?}");

    Ok(())
}
