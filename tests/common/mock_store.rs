//! In-memory KeyValueStore double
//!
//! Honors TTLs, matches patterns with the crate's glob dialect, and lets a test
//! switch each operation into failure independently.

use dashmap::DashMap;
use request_cache::cache::pattern::glob_match;
use request_cache::cache::{KeyValueStore, StoreError, StoreResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct MockStore {
    entries: DashMap<String, (String, Instant)>,
    fail_get: AtomicBool,
    fail_setex: AtomicBool,
    fail_del: AtomicBool,
    fail_keys: AtomicBool,
    setex_calls: AtomicUsize,
    del_calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value without going through the cache
    pub fn insert_raw(&self, key: &str, value: &str, ttl: Duration) {
        self.entries
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
    }

    /// Current value of `key`, ignoring failure switches
    pub fn raw(&self, key: &str) -> Option<String> {
        self.live(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.live(key).is_some()
    }

    /// Make every operation fail
    pub fn go_down(&self) {
        self.set_fail_get(true);
        self.set_fail_setex(true);
        self.set_fail_del(true);
        self.set_fail_keys(true);
    }

    pub fn set_fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_setex(&self, fail: bool) {
        self.fail_setex.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_del(&self, fail: bool) {
        self.fail_del.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_keys(&self, fail: bool) {
        self.fail_keys.store(fail, Ordering::SeqCst);
    }

    pub fn setex_calls(&self) -> usize {
        self.setex_calls.load(Ordering::SeqCst)
    }

    pub fn del_calls(&self) -> usize {
        self.del_calls.load(Ordering::SeqCst)
    }

    fn live(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.1 > Instant::now() => return Some(entry.0.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn check(flag: &AtomicBool, op: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::ConnectionError(format!("{op}: connection refused")))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MockStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Self::check(&self.fail_get, "GET")?;
        Ok(self.live(key))
    }

    async fn setex(&self, key: &str, ttl: Duration, value: &str) -> StoreResult<()> {
        self.setex_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_setex, "SETEX")?;
        self.insert_raw(key, value, ttl);
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        self.del_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_del, "DEL")?;
        let removed = keys
            .iter()
            .filter(|key| self.live(key).is_some() && self.entries.remove(key.as_str()).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        Self::check(&self.fail_keys, "KEYS")?;
        let now = Instant::now();
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.value().1 > now && glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(!self.fail_get.load(Ordering::SeqCst))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
