//! Watch loop (spec.md §4.1): keeps `ConfigCache` current and fires a
//! rebuild signal for `EndpointRegistry` after every mutation.

use crate::configstore::cache::ConfigCache;
use crate::configstore::client::{ConfigStoreClient, NodeEvent};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Spawns the watch task. Returns a `watch::Receiver<()>` that ticks once
/// per applied mutation batch; `EndpointRegistry::rebuild` is driven by it.
pub fn spawn_watch(
    client: Arc<dyn ConfigStoreClient>,
    cache: Arc<ConfigCache>,
    prefix: String,
) -> watch::Receiver<()> {
    let (tx, rx) = watch::channel(());

    tokio::spawn(async move {
        loop {
            let mut events = match client.watch(&prefix).await {
                Ok(events) => events,
                Err(error) => {
                    warn!(%error, prefix = %prefix, "config store watch failed to start, retrying");
                    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                    continue;
                }
            };

            while let Some(event) = events.recv().await {
                apply(&cache, &event);
                info!(path = event.path(), "config store mutation applied");
                let _ = tx.send(());
            }

            warn!(prefix = %prefix, "config store watch channel closed, reconnecting");
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        }
    });

    rx
}

fn apply(cache: &ConfigCache, event: &NodeEvent) {
    match event {
        NodeEvent::Created { path, value } | NodeEvent::Updated { path, value } => {
            cache.put(path.clone(), value.clone());
        }
        NodeEvent::Deleted { path } => cache.remove(path),
    }
}
