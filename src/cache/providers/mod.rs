//! Store provider implementations

pub mod noop;

#[cfg(feature = "cache-redis")]
pub mod redis;

#[cfg(feature = "cache-moka")]
pub mod moka;

pub use noop::NoOpStore;

#[cfg(feature = "cache-redis")]
pub use self::redis::RedisStore;

#[cfg(feature = "cache-moka")]
pub use self::moka::MokaStore;
