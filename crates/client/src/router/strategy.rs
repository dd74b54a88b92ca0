//! Fetch strategies for intercepted requests.
//!
//! Store failures never fail a request: a broken lookup counts as a miss and
//! a broken write is skipped, so the router degrades to network-only.

use shellcache_core::{CacheStore, Error, Request, Response};
use url::Url;

use crate::fetch::{Network, same_origin};

/// Everything a strategy needs besides the request.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub store: &'a dyn CacheStore,
    pub network: &'a dyn Network,
    /// Bucket owned by the running release.
    pub bucket: &'a str,
    pub origin: &'a Url,
}

impl Context<'_> {
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.store.match_request(self.bucket, request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(bucket = self.bucket, url = %request.url, "cache lookup failed, treating as miss: {e}");
                None
            }
        }
    }

    async fn lookup_any(&self, request: &Request) -> Option<Response> {
        match self.store.match_any(request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %request.url, "cache lookup failed, treating as miss: {e}");
                None
            }
        }
    }

    async fn remember(&self, request: &Request, response: &Response) {
        if let Err(e) = self.store.put(self.bucket, request, response).await {
            tracing::warn!(bucket = self.bucket, url = %request.url, "cache write skipped: {e}");
        }
    }
}

/// Network; on transport failure, any cached copy from any bucket.
pub async fn api_passthrough(ctx: &Context<'_>, request: &Request) -> Result<Response, Error> {
    match ctx.network.fetch(request).await {
        Ok(response) => Ok(response),
        Err(err) if err.is_transport() => match ctx.lookup_any(request).await {
            Some(cached) => {
                tracing::debug!("offline fallback for {}: {}", request.url, err);
                Ok(cached)
            }
            None => Err(err),
        },
        Err(err) => Err(err),
    }
}

/// Network, refreshing the bucket with successful same-origin responses;
/// on transport failure, the bucket's copy of this exact request.
pub async fn network_first(ctx: &Context<'_>, request: &Request) -> Result<Response, Error> {
    match ctx.network.fetch(request).await {
        Ok(response) => {
            if response.is_success() && same_origin(ctx.origin, &response.url) {
                ctx.remember(request, &response).await;
            }
            Ok(response)
        }
        Err(err) if err.is_transport() => match ctx.lookup(request).await {
            Some(cached) => {
                tracing::debug!("offline fallback for {}: {}", request.url, err);
                Ok(cached)
            }
            None => Err(err),
        },
        Err(err) => Err(err),
    }
}

/// Bucket first; on a miss, fetch and store whatever came back.
pub async fn cache_first(ctx: &Context<'_>, request: &Request) -> Result<Response, Error> {
    if let Some(cached) = ctx.lookup(request).await {
        tracing::debug!("cache hit for {}", request.url);
        return Ok(cached);
    }

    let response = ctx.network.fetch(request).await?;
    ctx.remember(request, &response).await;
    Ok(response)
}
