//! Dynamic enum registry (spec.md §1, §4.3 supplement): periodically
//! refreshed from `EnumServiceClient`, feeding `EnumFieldBinding`-bound
//! schema fields.

use crate::domain::schema::DynamicEnum;
use crate::enumclient::EnumServiceClient;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Holds the last known value set for every dynamic enum the enum service
/// exposes, refreshed on a fixed interval.
#[derive(Debug, Default)]
pub struct EnumRegistry {
    enums: DashMap<String, Vec<(String, String)>>,
    /// Bumped on every `apply`, so `SchemaRegistry` can tell whether its
    /// compiled validators were built against a stale enum snapshot.
    generation: std::sync::atomic::AtomicU64,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self, name: &str) -> Option<Vec<(String, String)>> {
        self.enums.get(name).map(|entry| entry.value().clone())
    }

    /// Every valid code for `name`, in declared order — what the
    /// schema-augmentor inlines as `enum: [...]` (spec.md §9).
    pub fn codes(&self, name: &str) -> Option<Vec<String>> {
        self.enums.get(name).map(|entry| entry.value().iter().map(|(code, _)| code.clone()).collect())
    }

    /// The literal `code` maps to, for the response transformer.
    pub fn literal_for(&self, name: &str, code: &str) -> Option<String> {
        self.enums
            .get(name)
            .and_then(|entry| entry.value().iter().find(|(c, _)| c == code).map(|(_, l)| l.clone()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(std::sync::atomic::Ordering::Acquire)
    }

    fn apply(&self, enums: Vec<DynamicEnum>) {
        self.enums.clear();
        for e in enums {
            self.enums.insert(e.name, e.values);
        }
        self.generation.fetch_add(1, std::sync::atomic::Ordering::AcqRel);
    }
}

/// Runs one refresh pass: lists every enum name, fetches each, and applies
/// the whole batch atomically. `fail_on_error` governs whether a failure
/// here is fatal (boot-time `FailOnEnumLoadFailure`, spec.md §6) or is
/// logged and the previous values are retained.
pub async fn refresh_once(
    registry: &EnumRegistry,
    client: &dyn EnumServiceClient,
    fail_on_error: bool,
) -> crate::errors::Result<()> {
    let names = client.list_enum_names().await?;
    let mut fetched = Vec::with_capacity(names.len());

    for name in names {
        match client.fetch_enum(&name).await {
            Ok(e) => fetched.push(e),
            Err(error) if fail_on_error => return Err(error),
            Err(error) => {
                warn!(%error, enum_name = %name, "enum refresh failed, keeping stale value");
            }
        }
    }

    info!(enum_count = fetched.len(), "enum registry refreshed");
    registry.apply(fetched);
    Ok(())
}

/// Spawns the periodic refresh task (spec.md §6 `EnumRefreshIntervalSeconds`,
/// default 300s).
pub fn spawn_refresh_loop(
    registry: Arc<EnumRegistry>,
    client: Arc<dyn EnumServiceClient>,
    interval: Duration,
) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            if let Err(error) = refresh_once(&registry, client.as_ref(), false).await {
                error!(%error, "scheduled enum refresh failed");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumclient::InMemoryEnumClient;

    #[tokio::test]
    async fn refresh_populates_registry() {
        let client = InMemoryEnumClient::with_enum(
            "color",
            vec![("R".into(), "Red".into()), ("B".into(), "Blue".into())],
        );
        let registry = EnumRegistry::new();

        refresh_once(&registry, &client, true).await.unwrap();

        assert_eq!(registry.codes("color"), Some(vec!["R".to_string(), "B".to_string()]));
        assert_eq!(registry.literal_for("color", "R"), Some("Red".to_string()));
    }

    #[tokio::test]
    async fn refresh_bumps_generation() {
        let client = InMemoryEnumClient::with_enum("color", vec![("R".into(), "Red".into())]);
        let registry = EnumRegistry::new();
        let before = registry.generation();

        refresh_once(&registry, &client, true).await.unwrap();

        assert!(registry.generation() > before);
    }

    #[tokio::test]
    async fn fail_on_error_propagates() {
        let client = InMemoryEnumClient::failing();
        let registry = EnumRegistry::new();

        let result = refresh_once(&registry, &client, true).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn non_fatal_failure_keeps_registry_usable() {
        let client = InMemoryEnumClient::failing();
        let registry = EnumRegistry::new();

        let result = refresh_once(&registry, &client, false).await;
        assert!(result.is_ok());
        assert!(!registry.contains("color"));
    }
}
