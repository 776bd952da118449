//! # Example: basic
//!
//! Runs a mix of blocking and async jobs on a two-slot scheduler with the
//! built-in [`LogWriter`] attached, then waits for the pool to drain.
//!
//! Demonstrates how to:
//! - Build a [`Scheduler`] with subscribers.
//! - Submit sync and async work and collect results through [`JobHandle`]s.
//! - Observe a failing job without disturbing the rest of the queue.
//! - Wait for idleness with [`Scheduler::await_idle`].
//!
//! ## Flow
//! ```text
//! Scheduler::builder(cfg).with_subscribers([LogWriter]).build()
//!     ├─► submit_sync(checksum)        ─► slot-0
//!     ├─► submit_async(fetch "a")      ─► slot-1
//!     ├─► submit_async(fetch "boom")   ─► queued
//!     ├─► submit_async(fetch "b")      ─► queued
//!     └─► await_idle()                 ─► resolves after the last release
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use workslots::{Config, JobHandle, LogWriter, Scheduler, Subscribe};

async fn fetch(name: &'static str) -> Result<String, String> {
    tokio::time::sleep(Duration::from_millis(200)).await;
    if name == "boom" {
        return Err(format!("{name}: connection refused"));
    }
    Ok(format!("{name}: 200 OK"))
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    // 1. Two slots, log every event
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let scheduler = Scheduler::builder(Config::with_workers(2))
        .with_subscribers(subs)
        .build()?;

    // 2. A blocking job
    let checksum = scheduler.submit_sync(|| {
        std::thread::sleep(Duration::from_millis(100));
        (0u64..1_000_000).fold(0u64, |acc, x| acc.wrapping_add(x * x))
    });

    // 3. Async jobs; the last two have to wait for a slot
    let fetches: Vec<JobHandle<String>> = ["a", "boom", "b"]
        .into_iter()
        .map(|name| scheduler.submit_async(move || fetch(name)))
        .collect();

    // 4. Wait for the pool to drain
    scheduler.await_idle().await;
    tracing::info!(snapshot = ?scheduler.snapshot(), "scheduler idle");

    let checksum = checksum.await?;
    tracing::info!(checksum, "blocking job done");
    for job in fetches {
        let id = job.id();
        match job.await {
            Ok(body) => tracing::info!(%id, %body, "fetched"),
            Err(err) => tracing::warn!(%id, label = err.as_label(), %err, "fetch failed"),
        }
    }

    // Give the subscriber worker a moment to flush before exit.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
