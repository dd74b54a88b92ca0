//! Offline cache router.
//!
//! One [`OfflineRouter`] owns one release: its [`RouterConfig`] names the
//! bucket (the version tag), the app shell manifest and the path prefixes
//! used for classification. The platform shim drives it through the
//! [`CacheRouter`] trait:
//!
//! - `on_install` fetches the manifest and stores it in the release bucket
//! - `on_activate` deletes every other bucket and claims interception
//! - `handle` routes one request according to [`classify`]

pub mod classify;
pub mod lifecycle;
pub mod strategy;

#[cfg(test)]
pub(crate) mod fake;

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheStore, Error, Request, Response, RouterConfig};
use url::Url;

use crate::fetch::{Network, resolve};

pub use classify::{Route, RoutePolicy, classify, route, should_intercept};
pub use lifecycle::LifecycleState;
pub use strategy::Context;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOutcome {
    pub bucket: String,
    /// Number of manifest resources stored.
    pub cached: usize,
    /// Replace the previously active release without waiting for consumers to let go.
    pub skip_waiting: bool,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateOutcome {
    pub bucket: String,
    /// Buckets removed, in creation order.
    pub deleted: Vec<String>,
    /// Interception taken over immediately.
    pub claimed: bool,
}

/// Interception surface invoked by a platform shim.
#[async_trait::async_trait]
pub trait CacheRouter: Send + Sync {
    async fn on_install(&self) -> Result<InstallOutcome, Error>;

    async fn on_activate(&self) -> Result<ActivateOutcome, Error>;

    /// Serve one request. `Err` means both network and cache failed.
    async fn handle(&self, request: Request) -> Result<Response, Error>;
}

/// [`CacheRouter`] over a [`CacheStore`] and a [`Network`].
pub struct OfflineRouter {
    config: RouterConfig,
    origin: Url,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    state: Mutex<LifecycleState>,
}

/// An install or activation in progress.
///
/// Dropping it before [`Transition::finish`] writes `fallback`, so a cancelled
/// call never leaves the router stuck in `Installing` or `Activating`.
struct Transition<'a> {
    state: &'a Mutex<LifecycleState>,
    /// State before the call started.
    previous: LifecycleState,
    fallback: Option<LifecycleState>,
}

impl Transition<'_> {
    fn finish(mut self, next: LifecycleState) {
        self.fallback = None;
        *lock(self.state) = next;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if let Some(fallback) = self.fallback.take() {
            tracing::warn!(state = %fallback, "lifecycle call abandoned, state restored");
            *lock(self.state) = fallback;
        }
    }
}

fn lock(state: &Mutex<LifecycleState>) -> std::sync::MutexGuard<'_, LifecycleState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl OfflineRouter {
    pub fn new(config: RouterConfig, origin: Url, store: Arc<dyn CacheStore>, network: Arc<dyn Network>) -> Self {
        Self { config, origin, store, network, state: Mutex::new(LifecycleState::Parsed) }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Name of the bucket this release reads and writes.
    pub fn bucket(&self) -> &str {
        &self.config.version_tag
    }

    pub fn state(&self) -> LifecycleState {
        *lock(&self.state)
    }

    /// Interception decision for `request`, without side effects.
    pub fn route(&self, request: &Request) -> Route {
        route(&self.config, &self.origin, request)
    }

    fn context(&self) -> Context<'_> {
        Context { store: self.store.as_ref(), network: self.network.as_ref(), bucket: self.bucket(), origin: &self.origin }
    }

    /// Check and apply a transition. `fallback` maps the previous state to the
    /// one written back if the returned [`Transition`] is dropped unfinished.
    fn enter(
        &self, next: impl FnOnce(LifecycleState) -> Result<LifecycleState, Error>,
        fallback: impl FnOnce(LifecycleState) -> LifecycleState,
    ) -> Result<Transition<'_>, Error> {
        let mut state = lock(&self.state);
        let previous = *state;
        *state = next(previous)?;
        Ok(Transition { state: &self.state, previous, fallback: Some(fallback(previous)) })
    }

    /// Manifest paths as requests against the origin.
    fn manifest_requests(&self) -> Result<Vec<Request>, Error> {
        self.config
            .manifest
            .iter()
            .map(|path| {
                resolve(&self.origin, path)
                    .map(Request::get)
                    .map_err(|e| Error::InstallFailed { resource: path.clone(), reason: e.to_string() })
            })
            .collect()
    }

    /// Fetch every manifest resource, then store them all in one write.
    async fn install_shell(&self) -> Result<usize, Error> {
        let bucket = self.bucket();
        let requests = self.manifest_requests()?;
        let fetched = try_join_all(requests.into_iter().map(|request| async move {
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed { resource: request.url.path().to_string(), reason: e.to_string() })?;
            if !response.is_success() {
                return Err(Error::InstallFailed {
                    resource: request.url.path().to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            Ok((request, response))
        }))
        .await?;

        self.store
            .put_all(bucket, &fetched)
            .await
            .map_err(|e| Error::InstallFailed { resource: bucket.to_string(), reason: e.to_string() })?;

        Ok(fetched.len())
    }

    /// Delete every bucket other than this release's.
    async fn remove_stale_buckets(&self) -> Result<Vec<String>, Error> {
        let bucket = self.bucket();
        let names = self
            .store
            .keys()
            .await
            .map_err(|e| Error::ActivateFailed(format!("listing buckets: {e}")))?;

        let mut deleted = Vec::new();
        for name in names.into_iter().filter(|name| name != bucket) {
            if self
                .store
                .delete(&name)
                .await
                .map_err(|e| Error::ActivateFailed(format!("deleting {name}: {e}")))?
            {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}

#[async_trait::async_trait]
impl CacheRouter for OfflineRouter {
    async fn on_install(&self) -> Result<InstallOutcome, Error> {
        let transition = self.enter(LifecycleState::begin_install, |_| LifecycleState::Redundant)?;
        tracing::info!(bucket = self.bucket(), resources = self.config.manifest.len(), "install - cache version");

        match self.install_shell().await {
            Ok(cached) => {
                transition.finish(LifecycleState::Installed);
                tracing::info!(bucket = self.bucket(), cached, "installed, skipping wait");
                Ok(InstallOutcome { bucket: self.bucket().to_string(), cached, skip_waiting: true })
            }
            Err(e) => {
                transition.finish(LifecycleState::Redundant);
                tracing::warn!(bucket = self.bucket(), "install failed: {e}");
                Err(e)
            }
        }
    }

    async fn on_activate(&self) -> Result<ActivateOutcome, Error> {
        let transition = self.enter(LifecycleState::begin_activate, |previous| previous)?;
        tracing::info!(bucket = self.bucket(), "activate - cleaning old caches, keeping current");

        match self.remove_stale_buckets().await {
            Ok(deleted) => {
                transition.finish(LifecycleState::Activated);
                if !deleted.is_empty() {
                    tracing::info!(bucket = self.bucket(), ?deleted, "removed stale buckets");
                }
                Ok(ActivateOutcome { bucket: self.bucket().to_string(), deleted, claimed: true })
            }
            Err(e) => {
                let previous = transition.previous;
                transition.finish(previous);
                tracing::warn!(bucket = self.bucket(), "activate failed: {e}");
                Err(e)
            }
        }
    }

    async fn handle(&self, request: Request) -> Result<Response, Error> {
        let policy = match self.route(&request) {
            Route::PassThrough => {
                tracing::debug!("pass-through {} {}", request.method, request.url);
                return self.network.fetch(&request).await;
            }
            Route::Intercept(policy) => policy,
        };

        tracing::debug!("{} {} {}", policy, request.method, request.url);
        let ctx = self.context();
        match policy {
            RoutePolicy::ApiPassthrough => strategy::api_passthrough(&ctx, &request).await,
            RoutePolicy::NetworkFirst => strategy::network_first(&ctx, &request).await,
            RoutePolicy::CacheFirst => strategy::cache_first(&ctx, &request).await,
        }
    }
}
