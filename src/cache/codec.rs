//! Value codecs
//!
//! The orchestrator stores values as opaque text. A [`CacheCodec`] turns a
//! caller's value into that text and back. [`JsonCodec`] is the default;
//! [`FnCodec`] wraps caller-supplied encode/decode functions for custom formats.

use super::errors::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Encode/decode values of type `T` to and from their stored text form
pub trait CacheCodec<T>: Send + Sync {
    /// Encode a value for storage
    fn encode(&self, value: &T) -> Result<String, CodecError>;

    /// Decode a stored value
    ///
    /// Must fail with a descriptive error on malformed input.
    fn decode(&self, raw: &str) -> Result<T, CodecError>;
}

/// JSON text codec backed by `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl<T> CacheCodec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<T, CodecError> {
        serde_json::from_str(raw).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

type EncodeFn<T> = dyn Fn(&T) -> Result<String, CodecError> + Send + Sync;
type DecodeFn<T> = dyn Fn(&str) -> Result<T, CodecError> + Send + Sync;

/// Codec assembled from a pair of functions
///
/// ```rust
/// use request_cache::cache::{CacheCodec, CodecError, FnCodec};
///
/// let codec = FnCodec::new(
///     |n: &u64| Ok(n.to_string()),
///     |raw: &str| raw.parse::<u64>().map_err(|e| CodecError::Decode(e.to_string())),
/// );
/// assert_eq!(codec.encode(&42).unwrap(), "42");
/// assert_eq!(codec.decode("7").unwrap(), 7);
/// ```
pub struct FnCodec<T> {
    encode: Arc<EncodeFn<T>>,
    decode: Arc<DecodeFn<T>>,
}

impl<T> FnCodec<T> {
    pub fn new<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> Result<String, CodecError> + Send + Sync + 'static,
        D: Fn(&str) -> Result<T, CodecError> + Send + Sync + 'static,
    {
        Self {
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }
}

impl<T> Clone for FnCodec<T> {
    fn clone(&self) -> Self {
        Self {
            encode: Arc::clone(&self.encode),
            decode: Arc::clone(&self.decode),
        }
    }
}

impl<T> fmt::Debug for FnCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCodec").finish_non_exhaustive()
    }
}

impl<T> CacheCodec<T> for FnCodec<T> {
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        (self.encode)(value)
    }

    fn decode(&self, raw: &str) -> Result<T, CodecError> {
        (self.decode)(raw)
    }
}
