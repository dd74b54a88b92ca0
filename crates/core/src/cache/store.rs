//! The cache store seam used by the router.
//!
//! [`CacheStore`] is the purely mechanical interface the routing policy talks
//! to. [`CacheDb`] implements it on SQLite; tests substitute their own stores.

use super::connection::CacheDb;
use crate::Error;
use crate::model::{Request, Response};

/// Persistent named buckets of request/response pairs.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the bucket if it does not exist.
    async fn open(&self, bucket: &str) -> Result<(), Error>;

    /// Stored response for `request` in `bucket`.
    async fn match_request(&self, bucket: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Stored response for `request` in any bucket.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Store one entry, replacing any previous response for the request.
    async fn put(&self, bucket: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store several entries atomically.
    async fn put_all(&self, bucket: &str, entries: &[(Request, Response)]) -> Result<(), Error>;

    /// Remove a bucket. Returns false if it did not exist.
    async fn delete(&self, bucket: &str) -> Result<bool, Error>;

    /// Bucket names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    async fn entry_count(&self, bucket: &str) -> Result<u64, Error>;
}

#[async_trait::async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        self.open_bucket(bucket).await
    }

    async fn match_request(&self, bucket: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.match_in_bucket(bucket, request).await
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        CacheDb::match_any(self, request).await
    }

    async fn put(&self, bucket: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_entry(bucket, request, response).await
    }

    async fn put_all(&self, bucket: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.put_entries(bucket, entries).await
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        self.delete_bucket(bucket).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.bucket_names().await
    }

    async fn entry_count(&self, bucket: &str) -> Result<u64, Error> {
        CacheDb::entry_count(self, bucket).await
    }
}
