//! Cache-aside orchestration
//!
//! [`RequestCache`] serves a caller's value from the store while it is fresh and
//! otherwise runs the caller's retrieval function and repopulates the store.
//!
//! ## Lookup decision tree
//!
//! ```text
//! store.get(key)
//!   ├── Err        -> diagnostic(read)                      -> fresh fetch
//!   ├── Ok(None)   -> miss                                  -> fresh fetch
//!   └── Ok(raw)    -> decode
//!         ├── Ok(v)  -> return v
//!         └── Err    -> diagnostic(parse), del(key)
//!                       (del Err -> diagnostic(invalidate)) -> fresh fetch
//!
//! fresh fetch: retrieve(options)
//!   ├── Err(e)     -> return Err(e)        (only failing path)
//!   └── Ok(v)      -> encode
//!         ├── Err    -> diagnostic(serialize)               -> return v
//!         └── Ok(s)  -> store.setex(key, ttl, s)
//!               └── Err -> diagnostic(write)                -> return v
//! ```
//!
//! The store is a performance layer only: as long as retrieval succeeds, a
//! lookup succeeds, whatever state the store is in.
//!
//! Concurrent lookups of the same key are not coalesced. If several miss at
//! once, each runs retrieval and each writes; the last write wins.

use super::codec::{CacheCodec, JsonCodec};
use super::diagnostics::{
    DiagnosticAction, DiagnosticEvent, DiagnosticsPublisher, DiagnosticsSink, TracingDiagnostics,
};
use super::errors::{CacheError, CacheResult};
use super::provider::StoreProvider;
use super::request::CacheRequest;
use super::traits::KeyValueStore;
use crate::config::RequestCacheConfig;
use futures::future::join_all;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cache-aside memoization over a [`KeyValueStore`]
///
/// Holds no state of its own beyond its collaborators; cloning is cheap and
/// clones share the same store, codec and diagnostics sink.
pub struct RequestCache<S, C = JsonCodec> {
    store: Arc<S>,
    codec: Arc<C>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl<S> RequestCache<S, JsonCodec>
where
    S: KeyValueStore,
{
    /// Create a cache with the JSON codec, logging diagnostics via `tracing`
    pub fn new(store: S) -> Self {
        Self::builder(store).build()
    }

    /// Start building a cache with a custom codec or diagnostics sink
    pub fn builder(store: S) -> RequestCacheBuilder<S, JsonCodec> {
        RequestCacheBuilder {
            store: Arc::new(store),
            codec: JsonCodec,
            diagnostics: None,
        }
    }
}

impl RequestCache<StoreProvider, JsonCodec> {
    /// Create a cache wired from configuration
    ///
    /// The store degrades to NoOp when the configured backend is unavailable.
    /// Diagnostics are logged and also broadcast on the returned publisher,
    /// which callers may subscribe to or drop.
    pub async fn from_config(config: &RequestCacheConfig) -> (Self, DiagnosticsPublisher) {
        let store = StoreProvider::from_config_graceful(config).await;
        let publisher = DiagnosticsPublisher::new(config.diagnostics_capacity).with_logging();

        info!(
            provider = store.provider_name(),
            enabled = store.is_enabled(),
            "Request cache initialized"
        );

        let cache = Self::builder(store)
            .diagnostics(publisher.clone())
            .build();
        (cache, publisher)
    }
}

impl<S, C> RequestCache<S, C>
where
    S: KeyValueStore,
{
    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The codec used for stored values
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Get a value, serving it from the store when possible
    ///
    /// Returns the cached or freshly retrieved value. The only error this
    /// returns is the retrieval function's own error, unchanged; store and
    /// codec failures are reported to the diagnostics sink and bypassed.
    pub async fn get<T, E, O, F, Fut>(&self, request: CacheRequest<O, F>) -> Result<T, E>
    where
        C: CacheCodec<T>,
        F: FnOnce(O) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let (cache_key, cache_ttl, retrieve_options, retrieve) = request.into_parts();

        if let Some(value) = self.read_cached(&cache_key).await {
            return Ok(value);
        }

        self.fetch_fresh(&cache_key, cache_ttl, retrieve_options, retrieve)
            .await
    }

    /// Delete every key matching `pattern`
    ///
    /// Equivalent to `delete_by_patterns(&[pattern])`.
    pub async fn delete_by_pattern(&self, pattern: &str) -> CacheResult<u64> {
        self.delete_by_patterns(&[pattern]).await
    }

    /// Delete every key matching any of `patterns`
    ///
    /// Patterns are processed concurrently and independently; a pattern that
    /// matches nothing is a no-op. Every pattern runs to completion, then the
    /// first failure in pattern order is returned, if any. On success returns
    /// the number of keys removed.
    ///
    /// Matching keys are listed and then deleted in two store round-trips, so a
    /// key created in between may survive.
    pub async fn delete_by_patterns<P>(&self, patterns: &[P]) -> CacheResult<u64>
    where
        P: AsRef<str>,
    {
        if patterns.is_empty() {
            return Err(CacheError::InvalidRequest(
                "at least one pattern is required".to_string(),
            ));
        }
        if patterns.iter().any(|p| p.as_ref().is_empty()) {
            return Err(CacheError::InvalidRequest(
                "patterns must not be empty".to_string(),
            ));
        }

        let results = join_all(
            patterns
                .iter()
                .map(|pattern| self.delete_matching(pattern.as_ref())),
        )
        .await;

        let mut deleted = 0;
        for result in results {
            deleted += result?;
        }
        Ok(deleted)
    }

    async fn read_cached<T>(&self, cache_key: &str) -> Option<T>
    where
        C: CacheCodec<T>,
    {
        let raw = match self.store.get(cache_key).await {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => {
                debug!(key = cache_key, "Cache MISS");
                return None;
            }
            Err(source) => {
                self.report(DiagnosticEvent::new(
                    DiagnosticAction::Read,
                    cache_key,
                    CacheError::StoreRead {
                        key: cache_key.to_string(),
                        source,
                    },
                ));
                return None;
            }
        };

        match self.codec.decode(&raw) {
            Ok(value) => {
                debug!(key = cache_key, "Cache HIT");
                Some(value)
            }
            Err(source) => {
                self.report(
                    DiagnosticEvent::new(
                        DiagnosticAction::Parse,
                        cache_key,
                        CacheError::Deserialize {
                            key: cache_key.to_string(),
                            source,
                        },
                    )
                    .with_raw_value(raw.as_str()),
                );
                self.invalidate(cache_key, &raw).await;
                None
            }
        }
    }

    /// Best-effort removal of an entry that could not be decoded
    async fn invalidate(&self, cache_key: &str, raw: &str) {
        match self.store.del(&[cache_key.to_string()]).await {
            Ok(_) => debug!(key = cache_key, "Invalidated undecodable cache entry"),
            Err(source) => self.report(
                DiagnosticEvent::new(
                    DiagnosticAction::Invalidate,
                    cache_key,
                    CacheError::StoreDelete {
                        target: cache_key.to_string(),
                        source,
                    },
                )
                .with_raw_value(raw),
            ),
        }
    }

    async fn fetch_fresh<T, E, O, F, Fut>(
        &self,
        cache_key: &str,
        cache_ttl: Duration,
        retrieve_options: O,
        retrieve: F,
    ) -> Result<T, E>
    where
        C: CacheCodec<T>,
        F: FnOnce(O) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = retrieve(retrieve_options).await?;

        let encoded = match self.codec.encode(&value) {
            Ok(encoded) => encoded,
            Err(source) => {
                self.report(DiagnosticEvent::new(
                    DiagnosticAction::Serialize,
                    cache_key,
                    CacheError::Serialize {
                        key: cache_key.to_string(),
                        source,
                    },
                ));
                return Ok(value);
            }
        };

        match self.store.setex(cache_key, cache_ttl, &encoded).await {
            Ok(()) => debug!(
                key = cache_key,
                ttl_seconds = cache_ttl.as_secs(),
                "Cached fresh value"
            ),
            Err(source) => self.report(
                DiagnosticEvent::new(
                    DiagnosticAction::Write,
                    cache_key,
                    CacheError::StoreWrite {
                        key: cache_key.to_string(),
                        source,
                    },
                )
                .with_serialized_value(encoded),
            ),
        }

        Ok(value)
    }

    async fn delete_matching(&self, pattern: &str) -> CacheResult<u64> {
        let delete_error = |source| CacheError::StoreDelete {
            target: pattern.to_string(),
            source,
        };

        let keys = self.store.keys(pattern).await.map_err(|source| {
            warn!(pattern = pattern, error = %source, "Cache pattern lookup failed");
            delete_error(source)
        })?;

        if keys.is_empty() {
            debug!(pattern = pattern, "No cache keys match pattern");
            return Ok(0);
        }

        let deleted = self.store.del(&keys).await.map_err(|source| {
            warn!(
                pattern = pattern,
                matched = keys.len(),
                error = %source,
                "Cache pattern delete failed"
            );
            delete_error(source)
        })?;

        debug!(
            pattern = pattern,
            matched = keys.len(),
            deleted = deleted,
            "Cache pattern DEL"
        );
        Ok(deleted)
    }

    fn report(&self, event: DiagnosticEvent) {
        self.diagnostics.emit(event);
    }
}

impl<S, C> Clone for RequestCache<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            codec: Arc::clone(&self.codec),
            diagnostics: Arc::clone(&self.diagnostics),
        }
    }
}

impl<S: fmt::Debug, C: fmt::Debug> fmt::Debug for RequestCache<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCache")
            .field("store", &self.store)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RequestCache`]
pub struct RequestCacheBuilder<S, C> {
    store: Arc<S>,
    codec: C,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
}

impl<S, C> RequestCacheBuilder<S, C>
where
    S: KeyValueStore,
{
    /// Replace the codec
    pub fn codec<C2>(self, codec: C2) -> RequestCacheBuilder<S, C2> {
        RequestCacheBuilder {
            store: self.store,
            codec,
            diagnostics: self.diagnostics,
        }
    }

    /// Send diagnostics to `sink` instead of the tracing log
    pub fn diagnostics(mut self, sink: impl DiagnosticsSink + 'static) -> Self {
        self.diagnostics = Some(Arc::new(sink));
        self
    }

    pub fn build(self) -> RequestCache<S, C> {
        RequestCache {
            store: self.store,
            codec: Arc::new(self.codec),
            diagnostics: self
                .diagnostics
                .unwrap_or_else(|| Arc::new(TracingDiagnostics)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::codec::FnCodec;
    use crate::cache::diagnostics::DiagnosticsPublisher;
    use crate::cache::errors::{CodecError, StoreError, StoreResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Minimal store: a map plus switches that make each operation fail
    #[derive(Debug, Default)]
    struct ScriptedStore {
        entries: Mutex<HashMap<String, String>>,
        fail_get: bool,
        fail_setex: bool,
        fail_del: bool,
        setex_calls: AtomicUsize,
    }

    impl ScriptedStore {
        fn with_entry(key: &str, value: &str) -> Self {
            let store = Self::default();
            store
                .entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            store
        }

        fn value(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }
    }

    fn boom() -> StoreError {
        StoreError::ConnectionError("connection refused".to_string())
    }

    impl KeyValueStore for ScriptedStore {
        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            if self.fail_get {
                return Err(boom());
            }
            Ok(self.value(key))
        }

        async fn setex(&self, key: &str, _ttl: Duration, value: &str) -> StoreResult<()> {
            self.setex_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_setex {
                return Err(boom());
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn del(&self, keys: &[String]) -> StoreResult<u64> {
            if self.fail_del {
                return Err(boom());
            }
            let mut entries = self.entries.lock().unwrap();
            Ok(keys.iter().filter(|k| entries.remove(*k).is_some()).count() as u64)
        }

        async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
            let entries = self.entries.lock().unwrap();
            Ok(entries
                .keys()
                .filter(|k| crate::cache::pattern::glob_match(pattern, k))
                .cloned()
                .collect())
        }

        async fn health_check(&self) -> StoreResult<bool> {
            Ok(!self.fail_get)
        }

        fn provider_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn request(
        key: &str,
        value: serde_json::Value,
    ) -> CacheRequest<
        (),
        impl FnOnce(()) -> std::future::Ready<Result<serde_json::Value, String>>,
    > {
        CacheRequest::new(key, Duration::from_secs(60), (), move |_: ()| {
            std::future::ready(Ok::<_, String>(value))
        })
        .unwrap()
    }

    fn cache_with(
        store: ScriptedStore,
    ) -> (
        RequestCache<ScriptedStore>,
        tokio::sync::broadcast::Receiver<DiagnosticEvent>,
    ) {
        let publisher = DiagnosticsPublisher::new(16);
        let rx = publisher.subscribe();
        let cache = RequestCache::builder(store).diagnostics(publisher).build();
        (cache, rx)
    }

    #[tokio::test]
    async fn test_miss_populates_store() {
        let (cache, mut rx) = cache_with(ScriptedStore::default());

        let value = cache
            .get(request("k", serde_json::json!({"a": 1})))
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!({"a": 1}));
        assert_eq!(cache.store().value("k").as_deref(), Some(r#"{"a":1}"#));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_hit_skips_retrieval() {
        let (cache, _rx) = cache_with(ScriptedStore::with_entry("k", r#"{"cached":true}"#));

        let value: serde_json::Value = cache
            .get(
                CacheRequest::new("k", Duration::from_secs(60), (), |_| async {
                    Err::<serde_json::Value, _>("retrieval must not run")
                })
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!({"cached": true}));
        assert_eq!(cache.store().setex_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_stored_value_is_a_miss() {
        let (cache, mut rx) = cache_with(ScriptedStore::with_entry("k", ""));

        let value = cache
            .get(request("k", serde_json::json!(7)))
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!(7));
        assert!(rx.try_recv().is_err(), "an empty value is not a parse failure");
    }

    #[tokio::test]
    async fn test_read_failure_falls_back_to_retrieval() {
        let store = ScriptedStore {
            fail_get: true,
            ..Default::default()
        };
        let (cache, mut rx) = cache_with(store);

        let value = cache
            .get(request("k", serde_json::json!("fresh")))
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!("fresh"));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.action, DiagnosticAction::Read);
        assert_eq!(event.cache_key, "k");
        assert!(matches!(event.error, CacheError::StoreRead { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_deleted_and_replaced() {
        let (cache, mut rx) = cache_with(ScriptedStore::with_entry("k", "{not json"));

        let value = cache
            .get(request("k", serde_json::json!({"fresh": 1})))
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!({"fresh": 1}));
        assert_eq!(cache.store().value("k").as_deref(), Some(r#"{"fresh":1}"#));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.action, DiagnosticAction::Parse);
        assert_eq!(event.raw_value.as_deref(), Some("{not json"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_invalidation_is_reported_and_ignored() {
        let store = ScriptedStore {
            fail_del: true,
            ..ScriptedStore::with_entry("k", "{not json")
        };
        let (cache, mut rx) = cache_with(store);

        let value = cache
            .get(request("k", serde_json::json!(1)))
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!(1));
        assert_eq!(rx.try_recv().unwrap().action, DiagnosticAction::Parse);
        let invalidate = rx.try_recv().unwrap();
        assert_eq!(invalidate.action, DiagnosticAction::Invalidate);
        assert_eq!(invalidate.raw_value.as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn test_write_failure_still_returns_value() {
        let store = ScriptedStore {
            fail_setex: true,
            ..Default::default()
        };
        let (cache, mut rx) = cache_with(store);

        let value = cache
            .get(request("k", serde_json::json!({"hello": "world"})))
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!({"hello": "world"}));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.action, DiagnosticAction::Write);
        assert_eq!(
            event.serialized_value.as_deref(),
            Some(r#"{"hello":"world"}"#)
        );
    }

    #[tokio::test]
    async fn test_retrieval_error_is_returned_without_write() {
        let (cache, mut rx) = cache_with(ScriptedStore::default());

        let result: Result<serde_json::Value, String> = cache
            .get(
                CacheRequest::new("k", Duration::from_secs(60), 5u32, |attempt: u32| async move {
                    Err(format!("upstream down after {attempt} attempts"))
                })
                .unwrap(),
            )
            .await;

        assert_eq!(result.unwrap_err(), "upstream down after 5 attempts");
        assert_eq!(cache.store().setex_calls.load(Ordering::SeqCst), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_encode_failure_skips_write() {
        let codec = FnCodec::new(
            |_: &u32| Err(CodecError::Encode("unsupported".to_string())),
            |raw: &str| {
                raw.parse::<u32>()
                    .map_err(|e| CodecError::Decode(e.to_string()))
            },
        );
        let publisher = DiagnosticsPublisher::new(4);
        let mut rx = publisher.subscribe();
        let cache = RequestCache::builder(ScriptedStore::default())
            .codec(codec)
            .diagnostics(publisher)
            .build();

        let value = cache
            .get(
                CacheRequest::new("k", Duration::from_secs(60), (), |_| async {
                    Ok::<_, String>(42u32)
                })
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(cache.store().setex_calls.load(Ordering::SeqCst), 0);
        assert_eq!(rx.try_recv().unwrap().action, DiagnosticAction::Serialize);
    }

    #[tokio::test]
    async fn test_delete_by_patterns_counts_removed_keys() {
        let store = ScriptedStore::default();
        for key in ["a:1", "a:2", "b:1", "c:1"] {
            store
                .entries
                .lock()
                .unwrap()
                .insert(key.to_string(), "1".to_string());
        }
        let cache = RequestCache::new(store);

        let deleted = cache.delete_by_patterns(&["a*", "b*", "z*"]).await.unwrap();

        assert_eq!(deleted, 3);
        assert!(cache.store().value("c:1").is_some());
    }

    #[tokio::test]
    async fn test_delete_by_patterns_rejects_empty_input() {
        let cache = RequestCache::new(ScriptedStore::default());
        let none: [&str; 0] = [];

        assert!(matches!(
            cache.delete_by_patterns(&none).await,
            Err(CacheError::InvalidRequest(_))
        ));
        assert!(matches!(
            cache.delete_by_pattern("").await,
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_failure_is_returned() {
        let store = ScriptedStore {
            fail_del: true,
            ..ScriptedStore::with_entry("a:1", "1")
        };
        let cache = RequestCache::new(store);

        let err = cache.delete_by_pattern("a*").await.unwrap_err();

        assert!(matches!(err, CacheError::StoreDelete { ref target, .. } if target == "a*"));
    }

    #[test]
    fn test_clone_shares_store() {
        let cache = RequestCache::new(ScriptedStore::with_entry("k", "v"));
        let clone = cache.clone();
        assert!(std::ptr::eq(cache.store(), clone.store()));
    }
}
