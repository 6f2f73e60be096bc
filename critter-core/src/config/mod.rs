//! Configuration types
//!
//! Engine tuning persisted as postcard binary data with a version check.

pub mod types;

pub use types::*;
