use crate::cache::{CacheError, StoreError};
use thiserror::Error;

/// Crate-level errors: configuration problems plus anything the cache layer
/// surfaces to its callers
#[derive(Debug, Error)]
pub enum RequestCacheError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RequestCacheError>;
