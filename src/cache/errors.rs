//! Cache error types
//!
//! Three layers:
//!
//! - [`StoreError`]: a single key-value store call failed (connectivity, protocol, timeout)
//! - [`CodecError`]: a value could not be encoded to or decoded from its stored text form
//! - [`CacheError`]: the orchestrator-level taxonomy, naming which step of a cache
//!   operation failed and for which key
//!
//! All payloads are string-based and `Clone` so that diagnostic events carrying
//! them can be fanned out to several subscribers.

use thiserror::Error;

/// Errors raised by a key-value store backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Failed to connect to the store
    #[error("Store connection error: {0}")]
    ConnectionError(String),

    /// Store operation timed out
    #[error("Store operation timed out: {0}")]
    Timeout(String),

    /// Generic backend error (protocol, command rejected, ...)
    #[error("Store backend error: {0}")]
    BackendError(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a cache codec
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to encode value: {0}")]
    Encode(String),

    #[error("Failed to decode value: {0}")]
    Decode(String),
}

/// Errors that can occur during cache operations
///
/// Inside [`RequestCache::get`](crate::cache::RequestCache::get) every variant
/// except `InvalidRequest` is non-fatal: it is reported once through the
/// diagnostics sink and the lookup falls back to a fresh fetch. Pattern
/// deletion returns `StoreDelete` to its caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// Reading a key from the store failed
    #[error("Could not read cache key '{key}': {source}")]
    StoreRead { key: String, source: StoreError },

    /// Writing a fresh value to the store failed
    #[error("Could not write cache key '{key}': {source}")]
    StoreWrite { key: String, source: StoreError },

    /// Listing or deleting keys failed (`target` is a key or a pattern)
    #[error("Could not delete '{target}' from cache: {source}")]
    StoreDelete { target: String, source: StoreError },

    /// A stored value could not be decoded
    #[error("Could not parse cached value for '{key}': {source}")]
    Deserialize { key: String, source: CodecError },

    /// A fresh value could not be encoded for storage
    #[error("Could not serialize fresh value for '{key}': {source}")]
    Serialize { key: String, source: CodecError },

    /// The caller supplied an unusable request (empty key, zero TTL, no patterns)
    #[error("Invalid cache request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// The cache key or pattern this error refers to, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::StoreRead { key, .. }
            | Self::StoreWrite { key, .. }
            | Self::Deserialize { key, .. }
            | Self::Serialize { key, .. } => Some(key),
            Self::StoreDelete { target, .. } => Some(target),
            Self::InvalidRequest(_) => None,
        }
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
