//! Request classification.
//!
//! Pure functions: nothing here touches the store or the network.

use serde::{Deserialize, Serialize};
use shellcache_core::{Destination, Request, RouterConfig};
use std::fmt;
use url::Url;

use crate::fetch::same_origin;

/// Fetch strategy for an intercepted GET request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutePolicy {
    /// Network, falling back to any cached copy. Never writes.
    ApiPassthrough,
    /// Network, storing successful same-origin responses; bucket on failure.
    NetworkFirst,
    /// Bucket, fetching and storing on a miss.
    CacheFirst,
}

impl RoutePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiPassthrough => "api-passthrough",
            Self::NetworkFirst => "network-first",
            Self::CacheFirst => "cache-first",
        }
    }
}

impl fmt::Display for RoutePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the router does with a request as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", content = "policy", rename_all = "kebab-case")]
pub enum Route {
    /// Not intercepted: sent to the network untouched.
    PassThrough,
    Intercept(RoutePolicy),
}

/// Only same-origin GET requests are intercepted.
pub fn should_intercept(origin: &Url, request: &Request) -> bool {
    request.is_get() && same_origin(origin, &request.url)
}

/// Pick the strategy for an intercepted request. First match wins:
/// API prefix anywhere in the path, then navigations / HTML / script, style
/// and worker destinations / map assets, then everything else.
pub fn classify(config: &RouterConfig, request: &Request) -> RoutePolicy {
    let path = request.url.path();

    if path.contains(config.api_path_prefix.as_str()) {
        return RoutePolicy::ApiPassthrough;
    }

    let app_shell_destination =
        matches!(request.destination, Destination::Script | Destination::Style | Destination::Worker);

    if request.is_navigation()
        || request.accepts_html()
        || app_shell_destination
        || path.starts_with(config.map_asset_path_prefix.as_str())
    {
        return RoutePolicy::NetworkFirst;
    }

    RoutePolicy::CacheFirst
}

/// Interception decision and policy in one step.
pub fn route(config: &RouterConfig, origin: &Url, request: &Request) -> Route {
    if should_intercept(origin, request) { Route::Intercept(classify(config, request)) } else { Route::PassThrough }
}
