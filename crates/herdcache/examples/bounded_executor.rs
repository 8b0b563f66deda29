//! Bounded Executor Example
//!
//! Demonstrates batch execution under a resource cap and promoting a
//! queued task ahead of the line.

use herdcache::prelude::*;
use herdcache::TaskFuture;
use std::sync::Arc;
use std::time::Duration;

fn report(id: &str, millis: u64) -> (String, TaskFuture<String>) {
    let name = id.to_string();
    (
        id.to_string(),
        Box::pin(async move {
            println!("  {name} started");
            tokio::time::sleep(Duration::from_millis(millis)).await;
            println!("  {name} finished");
            Ok(format!("report {name}"))
        }),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Bounded Executor Demo ===\n");

    let executor = BoundedExecutor::new(Arc::new(TokioRunner), 1)?;
    executor.execute(vec![
        report("t1", 800),
        report("t2", 100),
        report("t3", 100),
    ])?;
    println!("Submitted [t1, t2, t3] with a resource limit of 1");

    // t3 is still queued; asking for its result moves it ahead of t2
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("\nPromoting t3...");
    let promoted = executor.get_or_wait("t3").await?;
    println!("got '{promoted}' before t2 even started");

    let remaining = executor.get_or_wait("t2").await?;
    println!("t2 ran afterwards: '{remaining}'");

    assert!(executor.is_completed());
    println!("\nBatch complete.");

    Ok(())
}
