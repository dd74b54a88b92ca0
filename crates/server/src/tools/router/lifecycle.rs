//! router_install and router_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use shellcache_client::{CacheRouter, OfflineRouter};

use crate::tools::json_result;

/// Fetch and store the app shell for the configured release.
pub async fn install_impl(router: &OfflineRouter) -> Result<CallToolResult, McpError> {
    let outcome = router.on_install().await?;
    json_result(&outcome)
}

/// Drop stale buckets and take over request handling.
pub async fn activate_impl(router: &OfflineRouter) -> Result<CallToolResult, McpError> {
    let outcome = router.on_activate().await?;
    json_result(&outcome)
}
