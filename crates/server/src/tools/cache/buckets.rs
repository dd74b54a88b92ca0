//! cache_buckets tool implementation.
//!
//! Lists buckets with their entry counts, oldest first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{BucketInfo, CacheDb, EntryMeta, Error};

use crate::tools::json_result;

/// Parameters for the cache_buckets tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheBucketsParams {
    /// Also list the entries of this bucket.
    #[serde(default)]
    pub bucket: Option<String>,
}

/// Output from the cache_buckets tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheBucketsOutput {
    /// Bucket the running release reads and writes.
    pub current: String,
    pub buckets: Vec<BucketInfo>,
    /// Entries of the requested bucket, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EntryMeta>>,
}

/// Implementation of the cache_buckets tool.
pub async fn buckets_impl(
    cache: &CacheDb, current: &str, params: CacheBucketsParams,
) -> Result<CallToolResult, McpError> {
    let buckets = cache.bucket_infos().await?;

    let entries = match params.bucket.as_deref() {
        None => None,
        Some("") => return Err(Error::InvalidInput("bucket cannot be empty".into()).into()),
        Some(name) if !buckets.iter().any(|b| b.name == name) => {
            return Err(Error::CacheMiss(format!("no bucket named {name}")).into());
        }
        Some(name) => Some(cache.list_entries(name).await?),
    };

    json_result(&CacheBucketsOutput { current: current.to_string(), buckets, entries })
}
