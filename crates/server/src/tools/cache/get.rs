//! cache_get tool implementation.
//!
//! Looks up a stored response by request, in one bucket or across all of them.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, Error};
use url::Url;

use crate::tools::{RequestParams, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Bucket to search. Searches every bucket, oldest first, when omitted.
    #[serde(default)]
    pub bucket: Option<String>,

    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method the entry was stored under (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub url: String,
    /// URL the stored response was served from.
    pub response_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossy.
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, origin: &Url, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let request = RequestParams { url: params.url, method: params.method, ..Default::default() }.to_request(origin)?;

    let found = match params.bucket.as_deref() {
        Some(bucket) => cache.match_in_bucket(bucket, &request).await?,
        None => cache.match_any(&request).await?,
    };
    let response = found.ok_or_else(|| Error::CacheMiss(format!("{} {}", request.method, request.url)))?;

    let output = CacheGetOutput {
        url: request.url.to_string(),
        response_url: response.url.to_string(),
        status: response.status,
        content_type: response.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        headers: response.headers,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{origin, output};
    use shellcache_core::{Request, Response};

    fn params(bucket: Option<&str>, url: &str) -> CacheGetParams {
        CacheGetParams { bucket: bucket.map(str::to_string), url: url.to_string(), method: None }
    }

    async fn seeded() -> CacheDb {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let req = Request::get(origin().join("/api/countries").unwrap());
        let resp = Response::new(200, req.url.clone(), "[\"Chile\"]").with_header("content-type", "application/json");
        cache.put_entry("v1", &req, &resp).await.unwrap();
        cache
    }

    #[tokio::test]
    async fn test_get_impl_missing() {
        let cache = CacheDb::open_in_memory().await.unwrap();

        let err = get_impl(&cache, &origin(), params(None, "/quiz")).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_found_any_bucket() {
        let cache = seeded().await;

        let result = get_impl(&cache, &origin(), params(None, "/api/countries")).await.unwrap();
        let out: CacheGetOutput = output(&result);
        assert_eq!(out.status, 200);
        assert_eq!(out.body, "[\"Chile\"]");
        assert_eq!(out.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_get_impl_respects_bucket_and_method() {
        let cache = seeded().await;

        assert!(get_impl(&cache, &origin(), params(Some("v2"), "/api/countries")).await.is_err());
        assert!(get_impl(&cache, &origin(), params(Some("v1"), "/api/countries")).await.is_ok());

        let head = CacheGetParams { method: Some("HEAD".into()), ..params(Some("v1"), "/api/countries") };
        assert!(get_impl(&cache, &origin(), head).await.is_err());
    }
}
