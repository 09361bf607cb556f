//! Cache lookup requests

use super::errors::{CacheError, CacheResult};
use std::fmt;
use std::time::Duration;

/// Shortest TTL a request may carry; stores expire in whole seconds
pub const MIN_CACHE_TTL: Duration = Duration::from_secs(1);

/// A single retrieve-or-compute lookup
///
/// Bundles the cache key, how long a fresh value stays valid, the retrieval
/// function to run on a miss, and the options handed to that function
/// unchanged. All four are required; an empty key or a TTL below
/// [`MIN_CACHE_TTL`] is rejected when the request is built.
pub struct CacheRequest<O, F> {
    cache_key: String,
    cache_ttl: Duration,
    retrieve_options: O,
    retrieve: F,
}

impl<O, F> CacheRequest<O, F> {
    /// Build a request
    ///
    /// `retrieve` is called with `retrieve_options` only when the store cannot
    /// serve the key.
    pub fn new(
        cache_key: impl Into<String>,
        cache_ttl: Duration,
        retrieve_options: O,
        retrieve: F,
    ) -> CacheResult<Self> {
        let cache_key = cache_key.into();
        if cache_key.is_empty() {
            return Err(CacheError::InvalidRequest(
                "cache_key must not be empty".to_string(),
            ));
        }
        if cache_ttl < MIN_CACHE_TTL {
            return Err(CacheError::InvalidRequest(format!(
                "cache_ttl must be at least {}s, got {:?}",
                MIN_CACHE_TTL.as_secs(),
                cache_ttl
            )));
        }

        Ok(Self {
            cache_key,
            cache_ttl,
            retrieve_options,
            retrieve,
        })
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn retrieve_options(&self) -> &O {
        &self.retrieve_options
    }

    pub(crate) fn into_parts(self) -> (String, Duration, O, F) {
        (
            self.cache_key,
            self.cache_ttl,
            self.retrieve_options,
            self.retrieve,
        )
    }
}

impl<O: fmt::Debug, F> fmt::Debug for CacheRequest<O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRequest")
            .field("cache_key", &self.cache_key)
            .field("cache_ttl", &self.cache_ttl)
            .field("retrieve_options", &self.retrieve_options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop_retrieve(_: ()) -> Result<u32, std::io::Error> {
        Ok(1)
    }

    #[test]
    fn test_valid_request() {
        let request =
            CacheRequest::new("hello-world", Duration::from_secs(100), (), noop_retrieve).unwrap();
        assert_eq!(request.cache_key(), "hello-world");
        assert_eq!(request.cache_ttl(), Duration::from_secs(100));
        assert_eq!(request.retrieve_options(), &());
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let err = CacheRequest::new("", Duration::from_secs(10), (), noop_retrieve).unwrap_err();
        assert!(matches!(err, CacheError::InvalidRequest(msg) if msg.contains("cache_key")));
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let err = CacheRequest::new("k", Duration::ZERO, (), noop_retrieve).unwrap_err();
        assert!(matches!(err, CacheError::InvalidRequest(msg) if msg.contains("cache_ttl")));
    }

    #[test]
    fn test_sub_second_ttl_is_rejected() {
        let result = CacheRequest::new("k", Duration::from_millis(500), (), noop_retrieve);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_shows_key_and_options() {
        let request =
            CacheRequest::new("k", Duration::from_secs(5), "opts", noop_retrieve_str).unwrap();
        let debug = format!("{request:?}");
        assert!(debug.contains("\"k\""));
        assert!(debug.contains("opts"));
    }

    async fn noop_retrieve_str(_: &'static str) -> Result<u32, std::io::Error> {
        Ok(1)
    }
}
