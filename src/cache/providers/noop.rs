//! No-op store provider
//!
//! Always returns None/success. Used when caching is disabled or when the
//! configured backend is unavailable, turning every lookup into a fresh fetch.

use crate::cache::errors::StoreResult;
use crate::cache::traits::KeyValueStore;
use std::time::Duration;

/// Store that never holds anything
///
/// All reads miss, all writes succeed silently, no key ever matches.
#[derive(Debug, Clone, Default)]
pub struct NoOpStore;

impl NoOpStore {
    pub fn new() -> Self {
        Self
    }
}

impl KeyValueStore for NoOpStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }

    async fn setex(&self, _key: &str, _ttl: Duration, _value: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn del(&self, _keys: &[String]) -> StoreResult<u64> {
        Ok(0)
    }

    async fn keys(&self, _pattern: &str) -> StoreResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }

    fn is_distributed(&self) -> bool {
        // No state, so nothing can diverge between processes
        true
    }
}
