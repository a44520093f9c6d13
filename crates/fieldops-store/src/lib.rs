//! # fieldops-store
//!
//! `SQLite` persistence layer: pooled connections and versioned schema
//! migrations shared by the repository crates.

#![deny(unsafe_code)]

pub mod errors;
pub mod migrations;
pub mod pool;

pub use errors::{Result, StoreError};
pub use pool::{open_pool, Pool, PooledConnection};
