//! Getting started with the request cache
//!
//! Run with:
//!
//! ```bash
//! cargo run --example getting_started
//! REQUEST_CACHE_BACKEND=redis REDIS_URL=redis://localhost:6379 \
//!     cargo run --example getting_started --features cache-redis
//! ```

use anyhow::Result;
use request_cache::cache::KeyValueStore;
use request_cache::{CacheRequest, RequestCache, RequestCacheConfig};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Greeting {
    message: String,
    computed_at: String,
}

/// Stand-in for a slow upstream call
async fn compute_greeting(name: String, calls: Arc<AtomicUsize>) -> Result<Greeting> {
    calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(250)).await;
    Ok(Greeting {
        message: format!("hello, {name}"),
        computed_at: chrono::Utc::now().to_rfc3339(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    request_cache::logging::init_structured_logging();

    let config = RequestCacheConfig::from_env()?;
    let (cache, diagnostics) = RequestCache::from_config(&config).await;
    let mut events = diagnostics.subscribe();

    info!(
        backend = %config.backend,
        provider = cache.store().provider_name(),
        "Cache ready"
    );

    let calls = Arc::new(AtomicUsize::new(0));

    for attempt in 1..=2 {
        let started = Instant::now();
        let calls = Arc::clone(&calls);
        let greeting = cache
            .get(CacheRequest::new(
                "hello-world",
                Duration::from_secs(30),
                "world".to_string(),
                move |name| compute_greeting(name, calls),
            )?)
            .await?;

        info!(
            attempt = attempt,
            elapsed_ms = started.elapsed().as_millis() as u64,
            message = %greeting.message,
            computed_at = %greeting.computed_at,
            "Lookup finished"
        );
    }

    info!(
        retrievals = calls.load(Ordering::SeqCst),
        "Second lookup is served from the store when a backend is enabled"
    );

    let removed = cache.delete_by_pattern("hello-*").await?;
    info!(removed = removed, "Invalidated greetings");

    while let Ok(event) = events.try_recv() {
        info!(action = %event.action, key = %event.cache_key, "Diagnostic observed");
    }

    Ok(())
}
