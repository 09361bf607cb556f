//! # Configuration
//!
//! Settings for wiring a [`RequestCache`](crate::cache::RequestCache) to a
//! store. Values come from defaults, then an optional file (TOML, YAML or
//! JSON, picked by extension), then `REQUEST_CACHE__*` environment overrides:
//!
//! ```toml
//! enabled = true
//! backend = "redis"
//! diagnostics_capacity = 1000
//!
//! [redis]
//! url = "redis://localhost:6379"
//! connection_timeout_seconds = 5
//! ```
//!
//! `REQUEST_CACHE__BACKEND=moka` or `REQUEST_CACHE__REDIS__URL=...` override
//! single fields.

use crate::error::{RequestCacheError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_PREFIX: &str = "REQUEST_CACHE";

/// Top-level cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestCacheConfig {
    /// When false every lookup recomputes (NoOp store)
    pub enabled: bool,
    /// `redis` (alias `dragonfly`), `moka` (aliases `memory`, `in-memory`) or `noop`
    pub backend: String,
    pub redis: Option<RedisConfig>,
    pub moka: Option<MokaConfig>,
    /// Buffer size of the diagnostics broadcast channel
    pub diagnostics_capacity: usize,
}

impl Default for RequestCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: "moka".to_string(),
            redis: None,
            moka: None,
            diagnostics_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
    pub connection_timeout_seconds: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connection_timeout_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MokaConfig {
    pub max_capacity: u64,
}

impl Default for MokaConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl RequestCacheConfig {
    /// Build configuration from process environment variables
    ///
    /// - `REQUEST_CACHE_ENABLED` (`true`/`false`)
    /// - `REQUEST_CACHE_BACKEND`
    /// - `REDIS_URL` (used by the `redis` backend)
    /// - `REQUEST_CACHE_MOKA_MAX_CAPACITY`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(enabled) = lookup("REQUEST_CACHE_ENABLED") {
            config.enabled = enabled.trim().parse::<bool>().map_err(|e| {
                RequestCacheError::ConfigurationError(format!("Invalid REQUEST_CACHE_ENABLED: {e}"))
            })?;
        }

        if let Some(backend) = lookup("REQUEST_CACHE_BACKEND") {
            config.backend = backend.trim().to_lowercase();
        }

        if let Some(url) = lookup("REDIS_URL") {
            config.redis = Some(RedisConfig {
                url,
                ..RedisConfig::default()
            });
        }

        if let Some(capacity) = lookup("REQUEST_CACHE_MOKA_MAX_CAPACITY") {
            let max_capacity = capacity.trim().parse::<u64>().map_err(|e| {
                RequestCacheError::ConfigurationError(format!(
                    "Invalid REQUEST_CACHE_MOKA_MAX_CAPACITY: {e}"
                ))
            })?;
            config.moka = Some(MokaConfig { max_capacity });
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, layered with `REQUEST_CACHE__*` overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                RequestCacheError::ConfigurationError(format!(
                    "Failed to load {}: {e}",
                    path.display()
                ))
            })?;

        let config: Self = settings.try_deserialize().map_err(|e| {
            RequestCacheError::ConfigurationError(format!("Invalid cache configuration: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a working cache
    pub fn validate(&self) -> Result<()> {
        if self.backend.trim().is_empty() {
            return Err(RequestCacheError::ConfigurationError(
                "backend must not be empty".to_string(),
            ));
        }
        if self.diagnostics_capacity == 0 {
            return Err(RequestCacheError::ConfigurationError(
                "diagnostics_capacity must be greater than 0".to_string(),
            ));
        }
        if let Some(redis) = &self.redis {
            if redis.url.trim().is_empty() {
                return Err(RequestCacheError::ConfigurationError(
                    "redis.url must not be empty".to_string(),
                ));
            }
            if redis.connection_timeout_seconds == 0 {
                return Err(RequestCacheError::ConfigurationError(
                    "redis.connection_timeout_seconds must be greater than 0".to_string(),
                ));
            }
        }
        if let Some(moka) = &self.moka {
            if moka.max_capacity == 0 {
                return Err(RequestCacheError::ConfigurationError(
                    "moka.max_capacity must be greater than 0".to_string(),
                ));
            }
        }
        Ok(())
    }
}
