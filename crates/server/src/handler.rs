//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    RequestParams,
    cache::{CacheBucketsParams, CacheGetParams, CachePurgeParams, buckets_impl, get_impl, purge_impl},
    router::{activate_impl, classify_impl, fetch_impl, install_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::OfflineRouter;
use shellcache_core::CacheDb;

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellcacheServer {
    router: Arc<OfflineRouter>,
    db: CacheDb,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellcacheServer {
    /// Create a new server handler around a router and the database backing its store.
    pub fn new(router: Arc<OfflineRouter>, db: CacheDb) -> Self {
        Self { router, db, tool_router: Self::tool_router() }
    }

    #[tool(description = "Install the configured release: fetch every app shell resource and store them in the release bucket. Nothing is stored if any fetch fails.")]
    async fn router_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.router).await
    }

    #[tool(description = "Activate the installed release: delete every bucket other than the current version and start controlling requests.")]
    async fn router_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.router).await
    }

    /// Handle one request through the offline router.
    ///
    /// Returns status, headers, body and whether the response came from the network or the cache.
    #[tool(description = "Send a request through the offline router. Returns status, headers, body and source (network or cache).")]
    async fn router_fetch(&self, params: Parameters<RequestParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.router, params.0).await
    }

    #[tool(description = "Report whether a request would be intercepted and which strategy applies. No network or cache access.")]
    async fn router_classify(&self, params: Parameters<RequestParams>) -> Result<CallToolResult, McpError> {
        classify_impl(&self.router, params.0).await
    }

    #[tool(description = "List cache buckets with entry counts. Optionally list the entries of one bucket.")]
    async fn cache_buckets(&self, params: Parameters<CacheBucketsParams>) -> Result<CallToolResult, McpError> {
        buckets_impl(&self.db, self.router.bucket(), params.0).await
    }

    #[tool(description = "Look up a stored response by URL and method, in one bucket or across all buckets.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.db, self.router.origin(), params.0).await
    }

    #[tool(description = "Delete a named bucket, or every bucket except the current version when no bucket is given.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.db, self.router.bucket(), params.0).await
    }
}

impl ServerHandler for ShellcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline cache router for a web app shell. Run router_install then router_activate, \
                 then send requests with router_fetch."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
