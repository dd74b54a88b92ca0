//! shellcache server entry point.
//!
//! Boots the offline cache router behind an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchConfig, HttpNetwork, OfflineRouter};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let origin = config.origin_url()?;

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
    let network = HttpNetwork::new(FetchConfig::from(&config))?;

    let router = OfflineRouter::new(config.router.clone(), origin, Arc::new(db.clone()), Arc::new(network));

    tracing::info!(
        origin = %router.origin(),
        bucket = router.bucket(),
        "Starting shellcache server on stdio transport"
    );

    let handler = handler::ShellcacheServer::new(Arc::new(router), db);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
