//! MCP tool implementations.
//!
//! `router_*` tools drive an [`OfflineRouter`](shellcache_client::OfflineRouter);
//! `cache_*` tools inspect and maintain the bucket store directly.

pub mod cache;
pub mod router;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::fetch::resolve;
use shellcache_core::{Destination, Error, Method, Request};
use url::Url;

/// Request description shared by `router_fetch` and `router_classify`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RequestParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Accept header, e.g. "text/html".
    #[serde(default)]
    pub accept: Option<String>,

    /// Request destination: "document", "script", "style", "worker", "image" or anything else.
    #[serde(default)]
    pub destination: Option<String>,
}

impl RequestParams {
    /// Build a [`Request`] against `origin`.
    pub fn to_request(&self, origin: &Url) -> Result<Request, Error> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidInput("url cannot be empty".into()));
        }

        let url = resolve(origin, self.url.trim()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let Ok(method) = self.method.as_deref().unwrap_or("GET").parse::<Method>();
        let mut request = Request::new(method, url);

        if let Some(accept) = self.accept.as_deref().filter(|a| !a.is_empty()) {
            request = request.with_accept(accept);
        }
        if let Some(destination) = self.destination.as_deref() {
            let Ok(destination) = destination.parse::<Destination>();
            request = request.with_destination(destination);
        }

        Ok(request)
    }
}

/// Serialize `output` as the pretty-printed text content of a successful result.
pub fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;
    use shellcache_client::{Network, OfflineRouter};
    use shellcache_core::{CacheDb, Error, Request, Response, RouterConfig};
    use url::Url;

    pub fn origin() -> Url {
        Url::parse("http://127.0.0.1:5000").unwrap()
    }

    /// Network answering from a fixed path table; anything else is unreachable.
    #[derive(Default)]
    pub struct StaticNetwork {
        pages: Mutex<HashMap<String, (u16, String)>>,
        offline: Mutex<bool>,
    }

    impl StaticNetwork {
        pub fn with_pages(pages: &[(&str, u16, &str)]) -> Arc<Self> {
            let net = Self::default();
            for (path, status, body) in pages {
                net.pages
                    .lock()
                    .unwrap()
                    .insert(origin().join(path).unwrap().to_string(), (*status, body.to_string()));
            }
            Arc::new(net)
        }

        pub fn set_offline(&self, offline: bool) {
            *self.offline.lock().unwrap() = offline;
        }
    }

    #[async_trait::async_trait]
    impl Network for StaticNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            if *self.offline.lock().unwrap() {
                return Err(Error::Network("offline".into()));
            }
            match self.pages.lock().unwrap().get(request.url.as_str()) {
                Some((status, body)) => Ok(Response::new(*status, request.url.clone(), body.clone())
                    .with_header("content-type", "text/html; charset=utf-8")),
                None => Err(Error::Network(format!("{}: unreachable", request.url))),
            }
        }
    }

    pub async fn router_with(
        tag: &str, manifest: &[&str], pages: &[(&str, u16, &str)],
    ) -> (Arc<OfflineRouter>, CacheDb, Arc<StaticNetwork>) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = StaticNetwork::with_pages(pages);
        let router = OfflineRouter::new(
            RouterConfig::with_release(tag, manifest),
            origin(),
            Arc::new(db.clone()),
            net.clone(),
        );
        (Arc::new(router), db, net)
    }

    /// Decode the JSON text content of a tool result.
    pub fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
