//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Bucket store implementation with SQLite backend
//! - Request/response model shared with the router
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod model;

pub use cache::{BucketInfo, CacheDb, CacheStore, EntryMeta};
pub use config::{AppConfig, ConfigError, RouterConfig};
pub use error::Error;
pub use model::{Destination, Method, Request, Response, ResponseSource};
