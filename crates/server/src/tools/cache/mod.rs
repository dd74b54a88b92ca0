//! Cache maintenance MCP tools.
//!
//! These work on the SQLite bucket store directly and bypass routing.

pub mod buckets;
pub mod get;
pub mod purge;

pub use buckets::{CacheBucketsParams, buckets_impl};
pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};
