//! Client side of shellcache.
//!
//! This crate provides the network primitive and the offline cache router
//! that decides, per request, whether to answer from the network or from the
//! versioned cache.

pub mod fetch;
pub mod router;

pub use fetch::{FetchConfig, HttpNetwork, Network};

pub use router::{
    ActivateOutcome, CacheRouter, InstallOutcome, LifecycleState, OfflineRouter, Route, RoutePolicy, classify, route,
    should_intercept,
};
