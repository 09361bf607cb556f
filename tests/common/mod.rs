//! Shared test doubles for the integration tests
#![allow(dead_code)]

pub mod mock_store;
pub mod recording;

pub use mock_store::*;
pub use recording::*;
