//! Config store client boundary (spec.md §4.1).
//!
//! Modeled as a trait the way
//! `llm-schema-registry`'s `ConfigConsumer`/`ConfigUpdateListener` consumes
//! its upstream config manager: the gateway only ever depends on this
//! interface, never on a concrete ZooKeeper/etcd/consul transport, since
//! that transport is explicitly out of scope (spec.md §1).

use crate::errors::{GatewayError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

/// A single config-tree mutation notification (spec.md §4.1: watch loop).
#[derive(Debug, Clone)]
pub enum NodeEvent {
    Created { path: String, value: Bytes },
    Updated { path: String, value: Bytes },
    Deleted { path: String },
}

impl NodeEvent {
    pub fn path(&self) -> &str {
        match self {
            Self::Created { path, .. } | Self::Updated { path, .. } | Self::Deleted { path } => path,
        }
    }
}

/// Upstream config store boundary. Implementations own the real transport;
/// the gateway never sees connection details (spec.md §1 Non-goals).
#[async_trait]
pub trait ConfigStoreClient: Send + Sync {
    /// Read the full tree rooted at `prefix` at startup (spec.md §4.1).
    async fn read_tree(&self, prefix: &str) -> Result<HashMap<String, Bytes>>;

    /// Subscribe to mutations under `prefix`; each call returns a fresh
    /// channel so the watch task can be restarted after a transport error.
    async fn watch(&self, prefix: &str) -> Result<tokio::sync::mpsc::Receiver<NodeEvent>>;
}

/// In-memory test/dev double (spec.md §4.1 supplement). Seeds a static tree
/// and never emits watch events unless told to via `push_event`.
#[derive(Debug, Default)]
pub struct StaticConfigStore {
    tree: dashmap::DashMap<String, Bytes>,
}

impl StaticConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<P: Into<String>, V: Into<Bytes>>(&self, path: P, value: V) {
        self.tree.insert(path.into(), value.into());
    }
}

#[async_trait]
impl ConfigStoreClient for StaticConfigStore {
    async fn read_tree(&self, prefix: &str) -> Result<HashMap<String, Bytes>> {
        Ok(self
            .tree
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }

    async fn watch(&self, _prefix: &str) -> Result<tokio::sync::mpsc::Receiver<NodeEvent>> {
        let (_tx, rx) = tokio::sync::mpsc::channel(16);
        Ok(rx)
    }
}

/// Surfaced when a required config path is absent (spec.md §7).
pub fn missing_path(path: &str) -> GatewayError {
    GatewayError::config_missing(format!("required config path absent: {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_store_reads_by_prefix() {
        let store = StaticConfigStore::new();
        store.set("endpoints/widgets/path", Bytes::from_static(b"/widgets"));
        store.set("other/unrelated", Bytes::from_static(b"x"));

        let tree = store.read_tree("endpoints/").await.unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.contains_key("endpoints/widgets/path"));
    }
}
