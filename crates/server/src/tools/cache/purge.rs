//! cache_purge tool implementation.
//!
//! Deletes one named bucket, or every bucket except the current release's.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, Error};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Bucket to delete. When omitted, all stale buckets are deleted.
    #[serde(default)]
    pub bucket: Option<String>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Names of the buckets deleted.
    pub deleted: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &CacheDb, current: &str, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let deleted = match params.bucket {
        Some(bucket) if bucket.trim().is_empty() => {
            return Err(Error::InvalidInput("bucket cannot be empty".to_string()).into());
        }
        Some(bucket) => {
            if cache.delete_bucket(&bucket).await? {
                vec![bucket]
            } else {
                Vec::new()
            }
        }
        None => cache.purge_stale_buckets(current).await?,
    };

    if !deleted.is_empty() {
        tracing::info!(?deleted, "purged buckets");
    }

    json_result(&CachePurgeOutput { deleted })
}
