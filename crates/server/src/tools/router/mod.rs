//! Router-facing MCP tools.

pub mod classify;
pub mod fetch;
pub mod lifecycle;

pub use classify::classify_impl;
pub use fetch::{RouterFetchOutput, fetch_impl};
pub use lifecycle::{activate_impl, install_impl};
