//! Shared application state handed to every handler (spec.md §4).

use crate::backend::DocumentBackend;
use crate::observability::HealthChecker;
use crate::registry::{EndpointRegistry, EnumRegistry, SchemaRegistry};
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub endpoints: Arc<EndpointRegistry>,
    pub schemas: Arc<SchemaRegistry>,
    pub enums: Arc<EnumRegistry>,
    pub backend: Arc<dyn DocumentBackend>,
    pub health: Arc<HealthChecker>,
    /// `IsEnvValidate` (spec.md §6): whether the `env` header filter runs at all.
    pub env_validation_enabled: bool,
    /// The `ENV` this process was started with (spec.md §6), compared
    /// case-insensitively against the inbound `env` header.
    pub configured_env: String,
}
