#![allow(clippy::doc_markdown)] // Allow technical terms like Redis, Moka in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Request Cache
//!
//! Cache-aside memoization for expensive lookups, backed by a key-value store.
//!
//! ## Overview
//!
//! A caller describes a lookup as a [`CacheRequest`]: a cache key, a TTL, and
//! a retrieval function with its options. [`RequestCache::get`] returns the
//! stored value while it is fresh and otherwise runs retrieval, stores the
//! result, and returns it. Groups of entries are invalidated by glob pattern
//! with [`RequestCache::delete_by_patterns`].
//!
//! ## Key Features
//!
//! - **Store failures never fail a lookup**: they are reported to a
//!   [`DiagnosticsSink`](cache::DiagnosticsSink) and the value is recomputed
//! - **Self-healing**: undecodable entries are deleted and replaced
//! - **Pluggable stores**: Redis/Dragonfly (`cache-redis`), in-process Moka
//!   (`cache-moka`, default), NoOp, or any [`KeyValueStore`](cache::KeyValueStore)
//! - **Pluggable encoding**: JSON by default, any [`CacheCodec`](cache::CacheCodec)
//!
//! ## Module Organization
//!
//! - [`cache`] - Orchestrator, stores, codecs and diagnostics
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Crate-level error type
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use request_cache::{CacheRequest, RequestCache, RequestCacheConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! request_cache::logging::init_structured_logging();
//!
//! let config = RequestCacheConfig::from_env()?;
//! let (cache, _diagnostics) = RequestCache::from_config(&config).await;
//!
//! let profile: serde_json::Value = cache
//!     .get(CacheRequest::new(
//!         "profile:42",
//!         Duration::from_secs(300),
//!         42u64,
//!         |user_id| async move {
//!             Ok::<_, std::io::Error>(serde_json::json!({ "id": user_id }))
//!         },
//!     )?)
//!     .await?;
//!
//! cache.delete_by_pattern("profile:*").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                                # Unit and integration tests
//! cargo test --features test-services       # Also run against a live Redis
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;

pub use cache::{CacheRequest, RequestCache, StoreProvider};
pub use config::RequestCacheConfig;
pub use error::{RequestCacheError, Result};
