//! router_fetch tool implementation.
//!
//! Sends one request through the router, exactly as an intercepted page
//! request would be handled.

use chrono::Utc;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{CacheRouter, OfflineRouter};
use shellcache_core::ResponseSource;

use crate::tools::{RequestParams, json_result};

/// Output from the router_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RouterFetchOutput {
    /// The requested URL after resolution against the origin.
    pub url: String,
    /// The URL the response came from (after redirects).
    pub final_url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossy.
    pub body: String,
    /// Whether the response came from the network or a bucket.
    pub source: ResponseSource,
    /// ISO8601 timestamp of when the router answered.
    pub fetched_at: String,
}

/// Implementation of the router_fetch tool.
pub async fn fetch_impl(router: &OfflineRouter, params: RequestParams) -> Result<CallToolResult, McpError> {
    let request = params.to_request(router.origin())?;
    let url = request.url.to_string();

    let response = router.handle(request).await?;

    let output = RouterFetchOutput {
        url,
        final_url: response.url.to_string(),
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        headers: response.headers,
        source: response.source,
        fetched_at: Utc::now().to_rfc3339(),
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output, router_with};

    fn page(path: &str) -> RequestParams {
        RequestParams { url: path.into(), destination: Some("document".into()), ..Default::default() }
    }

    #[tokio::test]
    async fn test_fetch_online_then_offline() {
        let (router, _db, net) = router_with("v1", &[], &[("/quiz", 200, "<h1>Quiz</h1>")]).await;

        let online: RouterFetchOutput = output(&fetch_impl(&router, page("/quiz")).await.unwrap());
        assert_eq!(online.status, 200);
        assert_eq!(online.source, ResponseSource::Network);
        assert_eq!(online.body, "<h1>Quiz</h1>");

        net.set_offline(true);
        let offline: RouterFetchOutput = output(&fetch_impl(&router, page("/quiz")).await.unwrap());
        assert_eq!(offline.source, ResponseSource::Cache);
        assert_eq!(offline.body, "<h1>Quiz</h1>");
    }

    #[tokio::test]
    async fn test_fetch_offline_miss_is_network_error() {
        let (router, _db, net) = router_with("v1", &[], &[]).await;
        net.set_offline(true);

        let err = fetch_impl(&router, page("/stats")).await.unwrap_err();
        assert_eq!(err.code.0, -32008);
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_url() {
        let (router, _db, _net) = router_with("v1", &[], &[]).await;
        let params = RequestParams { url: "ftp://[broken".into(), ..Default::default() };

        assert!(fetch_impl(&router, params).await.is_err());
    }
}
