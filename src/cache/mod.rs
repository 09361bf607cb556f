//! # Request Cache
//!
//! Cache-aside memoization over a key-value store.
//!
//! ## Architecture
//!
//! ```text
//! RequestCache<S, C>               <- get / delete_by_pattern(s)
//!   ├── S: KeyValueStore           <- get, setex, del, keys
//!   │     └── StoreProvider (enum) <- Redis | Moka | NoOp, chosen from config
//!   ├── C: CacheCodec<T>           <- JsonCodec by default
//!   └── DiagnosticsSink            <- non-fatal failures (tracing, broadcast, ...)
//! ```
//!
//! ## Design Decisions
//!
//! - **Store is optional**: every store or codec failure on the lookup path is
//!   reported as a diagnostic and bypassed; only the caller's retrieval error
//!   is ever returned from [`RequestCache::get`]
//! - **Self-healing**: an entry that fails to decode is deleted and replaced
//! - **Graceful degradation**: an unavailable backend becomes a NoOp store,
//!   never a startup failure
//! - **No request coalescing**: concurrent misses each run retrieval
//!
//! ## Usage
//!
//! ```rust
//! use request_cache::cache::{CacheRequest, RequestCache};
//! use request_cache::cache::providers::NoOpStore;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let cache = RequestCache::new(NoOpStore::new());
//!
//! let greeting: String = cache
//!     .get(
//!         CacheRequest::new("greeting", Duration::from_secs(60), "world", |name| async move {
//!             Ok::<_, String>(format!("hello {name}"))
//!         })
//!         .map_err(|e| e.to_string())?,
//!     )
//!     .await?;
//! assert_eq!(greeting, "hello world");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod diagnostics;
pub mod errors;
pub mod orchestrator;
pub mod pattern;
pub mod provider;
pub mod providers;
pub mod request;
pub mod traits;

pub use codec::{CacheCodec, FnCodec, JsonCodec};
pub use diagnostics::{
    DiagnosticAction, DiagnosticEvent, DiagnosticsPublisher, DiagnosticsSink, NoOpDiagnostics,
    TracingDiagnostics,
};
pub use errors::{CacheError, CacheResult, CodecError, StoreError, StoreResult};
pub use orchestrator::{RequestCache, RequestCacheBuilder};
pub use provider::StoreProvider;
pub use providers::NoOpStore;
pub use request::{CacheRequest, MIN_CACHE_TTL};
pub use traits::KeyValueStore;

#[cfg(feature = "cache-redis")]
pub use providers::RedisStore;

#[cfg(feature = "cache-moka")]
pub use providers::MokaStore;
