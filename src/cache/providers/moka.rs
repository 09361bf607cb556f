//! In-memory store provider using Moka
//!
//! In-process store with a TTL per entry, for single-instance deployments and
//! tests. Pattern listing walks the live entries and applies the same glob
//! dialect Redis uses.
//!
//! **Important**: this store is NOT distributed. Each process has its own
//! entries, so invalidating in one process does not affect another.

use crate::cache::errors::StoreResult;
use crate::cache::pattern::{glob_match, is_literal};
use crate::cache::traits::KeyValueStore;
use crate::config::MokaConfig;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory store backed by `moka::future::Cache`
#[derive(Clone)]
pub struct MokaStore {
    cache: moka::future::Cache<String, StoredValue>,
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("max_capacity", &self.cache.policy().max_capacity())
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl MokaStore {
    /// Create a new Moka store from configuration
    pub fn from_config(config: &MokaConfig) -> Self {
        let cache = moka::future::Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        debug!(
            max_capacity = config.max_capacity,
            "Moka in-memory store created"
        );

        Self { cache }
    }

    pub fn new(max_capacity: u64) -> Self {
        Self::from_config(&MokaConfig { max_capacity })
    }
}

impl Default for MokaStore {
    fn default() -> Self {
        Self::from_config(&MokaConfig::default())
    }
}

impl KeyValueStore for MokaStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let result = self.cache.get(key).await.map(|stored| stored.value);

        if result.is_some() {
            debug!(key = key, "Store HIT (moka)");
        } else {
            debug!(key = key, "Store MISS (moka)");
        }

        Ok(result)
    }

    async fn setex(&self, key: &str, ttl: Duration, value: &str) -> StoreResult<()> {
        self.cache
            .insert(
                key.to_string(),
                StoredValue {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;

        debug!(key = key, ttl_seconds = ttl.as_secs(), "Store SET (moka)");
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        let mut deleted = 0;
        for key in keys {
            if self.cache.remove(key.as_str()).await.is_some() {
                deleted += 1;
            }
        }

        debug!(requested = keys.len(), deleted = deleted, "Store DEL (moka)");
        Ok(deleted)
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        if is_literal(pattern) {
            let found = self.cache.contains_key(pattern);
            return Ok(if found {
                vec![pattern.to_string()]
            } else {
                Vec::new()
            });
        }

        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, _)| key.to_string())
            .collect();

        debug!(pattern = pattern, matched = keys.len(), "Store KEYS (moka)");
        Ok(keys)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "moka"
    }
}
