//! Config store client, cache and watch loop (spec.md §4.1).

pub mod cache;
pub mod client;
pub mod watch;

pub use cache::ConfigCache;
pub use client::{missing_path, ConfigStoreClient, NodeEvent, StaticConfigStore};
pub use watch::spawn_watch;
