//! SQLite-backed store for versioned cache buckets.
//!
//! This module provides the persistent side of the offline router using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named buckets of request/response pairs keyed by request identity
//! - Atomic multi-entry writes for app shell installs
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod buckets;
pub mod connection;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use buckets::{BucketInfo, EntryMeta};
pub use connection::CacheDb;
pub use store::CacheStore;
