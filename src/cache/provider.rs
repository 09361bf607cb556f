//! Store provider selected from configuration
//!
//! Uses enum dispatch over the compiled-in backends. Construction never fails:
//! a backend that is disabled, misconfigured, not compiled in, or unreachable
//! degrades to [`NoOpStore`], so every lookup recomputes instead of the process
//! refusing to start.

use super::errors::StoreResult;
use super::providers::NoOpStore;
use super::traits::KeyValueStore;
use crate::config::RequestCacheConfig;
use std::time::Duration;
use tracing::{info, warn};

#[cfg(feature = "cache-redis")]
use super::providers::RedisStore;

#[cfg(feature = "cache-moka")]
use super::providers::MokaStore;

/// Configured key-value store
#[derive(Debug, Clone)]
pub enum StoreProvider {
    /// Redis or any Redis-protocol server (boxed to reduce enum size)
    #[cfg(feature = "cache-redis")]
    Redis(Box<RedisStore>),

    /// In-process Moka store
    #[cfg(feature = "cache-moka")]
    Moka(Box<MokaStore>),

    /// Always miss, always succeed
    NoOp(NoOpStore),
}

impl StoreProvider {
    /// Create a store from configuration with graceful degradation
    ///
    /// If the configured backend cannot be created, logs a warning and returns
    /// a NoOp store instead.
    pub async fn from_config_graceful(config: &RequestCacheConfig) -> Self {
        if !config.enabled {
            info!("Request cache disabled by configuration");
            return Self::noop();
        }

        match config.backend.trim().to_lowercase().as_str() {
            // Dragonfly speaks the Redis protocol
            "redis" | "dragonfly" => Self::create_redis(config).await,
            "moka" | "memory" | "in-memory" => Self::create_moka(config),
            "noop" | "none" => Self::noop(),
            other => {
                warn!(backend = other, "Unknown cache backend, falling back to NoOp");
                Self::noop()
            }
        }
    }

    #[cfg(feature = "cache-redis")]
    async fn create_redis(config: &RequestCacheConfig) -> Self {
        let Some(redis_config) = &config.redis else {
            warn!("Redis cache enabled but no [redis] config found, falling back to NoOp");
            return Self::noop();
        };

        match RedisStore::from_config(redis_config).await {
            Ok(store) => {
                info!(backend = "redis", "Cache store initialized successfully");
                Self::Redis(Box::new(store))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Failed to connect to Redis, falling back to NoOp store (graceful degradation)"
                );
                Self::noop()
            }
        }
    }

    #[cfg(not(feature = "cache-redis"))]
    async fn create_redis(_config: &RequestCacheConfig) -> Self {
        warn!("Redis cache backend requested but 'cache-redis' feature not enabled, using NoOp");
        Self::noop()
    }

    #[cfg(feature = "cache-moka")]
    fn create_moka(config: &RequestCacheConfig) -> Self {
        let moka_config = config.moka.clone().unwrap_or_default();
        let store = MokaStore::from_config(&moka_config);
        info!(
            backend = "moka",
            max_capacity = moka_config.max_capacity,
            "In-memory cache store initialized successfully"
        );
        Self::Moka(Box::new(store))
    }

    #[cfg(not(feature = "cache-moka"))]
    fn create_moka(_config: &RequestCacheConfig) -> Self {
        warn!("Moka cache backend requested but 'cache-moka' feature not enabled, using NoOp");
        Self::noop()
    }

    /// Create a NoOp store (for explicit opt-out or testing)
    pub fn noop() -> Self {
        Self::NoOp(NoOpStore::new())
    }

    /// Check if caching is actually enabled (not NoOp)
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::NoOp(_))
    }
}

impl KeyValueStore for StoreProvider {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.get(key).await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.get(key).await,
            Self::NoOp(s) => s.get(key).await,
        }
    }

    async fn setex(&self, key: &str, ttl: Duration, value: &str) -> StoreResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.setex(key, ttl, value).await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.setex(key, ttl, value).await,
            Self::NoOp(s) => s.setex(key, ttl, value).await,
        }
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.del(keys).await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.del(keys).await,
            Self::NoOp(s) => s.del(keys).await,
        }
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.keys(pattern).await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.keys(pattern).await,
            Self::NoOp(s) => s.keys(pattern).await,
        }
    }

    async fn health_check(&self) -> StoreResult<bool> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.health_check().await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.health_check().await,
            Self::NoOp(s) => s.health_check().await,
        }
    }

    fn provider_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.provider_name(),
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.provider_name(),
            Self::NoOp(s) => s.provider_name(),
        }
    }

    fn is_distributed(&self) -> bool {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.is_distributed(),
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.is_distributed(),
            Self::NoOp(s) => s.is_distributed(),
        }
    }
}
