//! Key-value store trait definition

use super::errors::StoreResult;
use std::time::Duration;

/// Operations the cache needs from a key-value store
///
/// Implemented by concrete store providers (Redis, Moka, NoOp) and by
/// test doubles. All I/O is async; implementations must be safe to share
/// across tasks.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key
    ///
    /// Returns `Ok(Some(value))` on hit, `Ok(None)` on miss.
    fn get(&self, key: &str)
        -> impl std::future::Future<Output = StoreResult<Option<String>>> + Send;

    /// Set a value that expires after `ttl`
    fn setex(
        &self,
        key: &str,
        ttl: Duration,
        value: &str,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    /// Delete a batch of keys, returning how many existed
    fn del(&self, keys: &[String]) -> impl std::future::Future<Output = StoreResult<u64>> + Send;

    /// List keys matching a glob-style pattern
    fn keys(
        &self,
        pattern: &str,
    ) -> impl std::future::Future<Output = StoreResult<Vec<String>>> + Send;

    /// Check if the store is reachable
    fn health_check(&self) -> impl std::future::Future<Output = StoreResult<bool>> + Send;

    /// Name of the store provider
    fn provider_name(&self) -> &'static str;

    /// Whether state is shared between processes
    fn is_distributed(&self) -> bool {
        false
    }
}

impl<S: KeyValueStore> KeyValueStore for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn setex(&self, key: &str, ttl: Duration, value: &str) -> StoreResult<()> {
        (**self).setex(key, ttl, value).await
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        (**self).del(keys).await
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        (**self).keys(pattern).await
    }

    async fn health_check(&self) -> StoreResult<bool> {
        (**self).health_check().await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn is_distributed(&self) -> bool {
        (**self).is_distributed()
    }
}
