//! router_classify tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{OfflineRouter, Route};

use crate::tools::{RequestParams, json_result};

/// Output from the router_classify tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RouterClassifyOutput {
    pub url: String,
    pub method: String,
    /// False for requests the router leaves to the network untouched.
    pub intercepted: bool,
    /// "api-passthrough", "network-first" or "cache-first" when intercepted.
    pub policy: Option<String>,
    /// Bucket that would be read or written.
    pub bucket: String,
}

/// Implementation of the router_classify tool. Never touches the network or the store.
pub async fn classify_impl(router: &OfflineRouter, params: RequestParams) -> Result<CallToolResult, McpError> {
    let request = params.to_request(router.origin())?;

    let policy = match router.route(&request) {
        Route::PassThrough => None,
        Route::Intercept(policy) => Some(policy.to_string()),
    };

    let output = RouterClassifyOutput {
        url: request.url.to_string(),
        method: request.method.to_string(),
        intercepted: policy.is_some(),
        policy,
        bucket: router.bucket().to_string(),
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output, router_with};

    async fn classify(params: RequestParams) -> RouterClassifyOutput {
        let (router, _db, _net) = router_with("v1", &[], &[]).await;
        output(&classify_impl(&router, params).await.unwrap())
    }

    #[tokio::test]
    async fn test_classify_policies() {
        let api = classify(RequestParams { url: "/api/countries".into(), ..Default::default() }).await;
        assert_eq!(api.policy.as_deref(), Some("api-passthrough"));

        let style = classify(RequestParams {
            url: "/static/style.css".into(),
            destination: Some("style".into()),
            ..Default::default()
        })
        .await;
        assert_eq!(style.policy.as_deref(), Some("network-first"));

        let icon = classify(RequestParams { url: "/static/icons/icon.svg".into(), ..Default::default() }).await;
        assert_eq!(icon.policy.as_deref(), Some("cache-first"));
        assert_eq!(icon.bucket, "v1");
    }

    #[tokio::test]
    async fn test_classify_pass_through() {
        let post = classify(RequestParams {
            url: "/api/answer".into(),
            method: Some("POST".into()),
            ..Default::default()
        })
        .await;
        assert!(!post.intercepted);
        assert_eq!(post.policy, None);
        assert_eq!(post.method, "POST");

        let cross = classify(RequestParams { url: "https://tiles.example.org/1/2/3.png".into(), ..Default::default() }).await;
        assert!(!cross.intercepted);
    }
}
