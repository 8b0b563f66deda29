//! Read-Through Loading Example
//!
//! Demonstrates the single-loader guarantee: twenty concurrent callers
//! for the same missing key produce exactly one trip to the data source.

use async_trait::async_trait;
use herdcache::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct SlowSource {
    trips: AtomicUsize,
}

#[async_trait]
impl Loader<String> for SlowSource {
    async fn load(&self, key: &CacheKey) -> Result<String> {
        let trip = self.trips.fetch_add(1, Ordering::SeqCst) + 1;
        println!("  → data source hit #{trip} for {key}");
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(format!("payload for {key}"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let provider = CacheProvider::new(MemoryStore::with_defaults());
    let config = LoadingConfig::new("demo")?
        .durations(Duration::from_secs(60), Duration::from_secs(10))?;
    let cache = Arc::new(LoadingCache::new(
        provider,
        SlowSource {
            trips: AtomicUsize::new(0),
        },
        config,
    ));

    println!("=== Read-Through Demo ===\n");

    let key = CacheKey::mono("user", 1, 42)?;
    println!("Spawning 20 concurrent readers for {key}...");

    let mut handles = Vec::new();
    for reader in 0..20 {
        let cache = Arc::clone(&cache);
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            (reader, cache.get(&key).await)
        }));
    }

    let mut served = 0;
    for handle in handles {
        let (reader, value) = handle.await.expect("reader panicked");
        if let Some(value) = value {
            println!("  reader {reader:2}: {value}");
            served += 1;
        }
    }
    println!("\n{served} reader(s) got the loaded value; the rest lost the reservation race.");

    // By now the entry is cached; everyone hits
    let value = cache.get(&key).await;
    println!("follow-up read: {value:?} (no data source trip)");

    Ok(())
}
