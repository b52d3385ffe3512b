//! # Health Checking
//!
//! Liveness/readiness checking for the gateway's dependent components
//! (config store connectivity, document backend, enum service).

use crate::errors::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Health status for a component.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded { message: String },
    Unhealthy { message: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded { message } | HealthStatus::Unhealthy { message } => Some(message),
        }
    }
}

/// Health check result for a component.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub last_check: chrono::DateTime<chrono::Utc>,
    pub metadata: HashMap<String, String>,
}

impl HealthCheck {
    pub fn new(component: String, status: HealthStatus) -> Self {
        Self { component, status, last_check: chrono::Utc::now(), metadata: HashMap::new() }
    }

    pub fn healthy(component: String) -> Self {
        Self::new(component, HealthStatus::Healthy)
    }

    pub fn degraded<S: Into<String>>(component: String, message: S) -> Self {
        Self::new(component, HealthStatus::Degraded { message: message.into() })
    }

    pub fn unhealthy<S: Into<String>>(component: String, message: S) -> Self {
        Self::new(component, HealthStatus::Unhealthy { message: message.into() })
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A component that can report its own health.
#[async_trait::async_trait]
pub trait HealthProvider {
    async fn health_check(&self) -> Result<HealthCheck>;
}

/// Central health checker aggregating all registered providers.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    providers: Arc<RwLock<HashMap<String, Box<dyn HealthProvider + Send + Sync>>>>,
    cache: Arc<RwLock<HashMap<String, HealthCheck>>>,
    instance_id: String,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
            cache: Arc::new(RwLock::new(HashMap::new())),
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub async fn register_provider<S: Into<String>>(
        &self,
        name: S,
        provider: Box<dyn HealthProvider + Send + Sync>,
    ) {
        let name = name.into();
        self.providers.write().await.insert(name, provider);
    }

    pub async fn check_all(&self) -> Result<HashMap<String, HealthCheck>> {
        let providers = self.providers.read().await;
        let mut results = HashMap::new();

        for (name, provider) in providers.iter() {
            let check = match provider.health_check().await {
                Ok(check) => check,
                Err(e) => HealthCheck::unhealthy(name.clone(), format!("health check failed: {}", e)),
            };
            results.insert(name.clone(), check.clone());
        }

        let mut cache = self.cache.write().await;
        cache.extend(results.clone());

        Ok(results)
    }

    pub async fn overall_status(&self) -> HealthStatus {
        let checks = match self.check_all().await {
            Ok(checks) => checks,
            Err(e) => {
                return HealthStatus::Unhealthy { message: format!("failed to perform health checks: {}", e) };
            }
        };

        if checks.is_empty() {
            return HealthStatus::Degraded { message: "no health providers registered".to_string() };
        }

        let mut unhealthy_count = 0;
        let mut degraded_count = 0;

        for check in checks.values() {
            match &check.status {
                HealthStatus::Healthy => {}
                HealthStatus::Degraded { .. } => degraded_count += 1,
                HealthStatus::Unhealthy { .. } => unhealthy_count += 1,
            }
        }

        if unhealthy_count > 0 {
            HealthStatus::Unhealthy {
                message: format!(
                    "{} unhealthy, {} degraded out of {} components",
                    unhealthy_count,
                    degraded_count,
                    checks.len()
                ),
            }
        } else if degraded_count > 0 {
            HealthStatus::Degraded {
                message: format!("{} degraded out of {} components", degraded_count, checks.len()),
            }
        } else {
            HealthStatus::Healthy
        }
    }

    /// `/readyz`: true once all registered components are at least degraded-operational.
    pub async fn is_ready(&self) -> bool {
        self.overall_status().await.is_operational()
    }

    /// `/healthz`: the process can respond at all.
    pub async fn is_alive(&self) -> bool {
        true
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub async fn get_cached_checks(&self) -> HashMap<String, HealthCheck> {
        self.cache.read().await.clone()
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Health provider backed by the document backend's own connectivity.
pub struct BackendHealthProvider {
    backend: Arc<dyn crate::backend::DocumentBackend>,
    probe_collection: String,
}

impl BackendHealthProvider {
    pub fn new(backend: Arc<dyn crate::backend::DocumentBackend>, probe_collection: impl Into<String>) -> Self {
        Self { backend, probe_collection: probe_collection.into() }
    }
}

#[async_trait::async_trait]
impl HealthProvider for BackendHealthProvider {
    async fn health_check(&self) -> Result<HealthCheck> {
        let start = std::time::Instant::now();
        let filter = bson::doc! {};
        let options = crate::domain::request::FilterOptions { limit: Some(1), ..Default::default() };

        match self.backend.find(&self.probe_collection, filter, &options).await {
            Ok(_) => {
                let elapsed = start.elapsed();
                Ok(HealthCheck::healthy("document_backend".to_string())
                    .with_metadata("response_time_ms", elapsed.as_millis().to_string()))
            }
            Err(e) => Ok(HealthCheck::unhealthy(
                "document_backend".to_string(),
                format!("backend probe failed: {}", e),
            )),
        }
    }
}
