//! # Configuration Settings
//!
//! Defines the configuration structure for the gateway (spec.md §6).

use crate::errors::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Top-level configuration, assembled by `load_config` from defaults, an
/// optional file, and `GATEWAY_`-prefixed environment variables. `ENV` and
/// `SERVICE` (spec.md §6) are deliberately bare env vars, not under that
/// prefix, and are read separately before this struct is ever built.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,

    #[validate(nested)]
    pub config_store: ConfigStoreSettings,

    #[validate(nested)]
    pub backend: BackendConfig,

    #[validate(nested)]
    pub observability: ObservabilityConfig,

    #[validate(nested)]
    pub enum_service: EnumServiceConfig,

    #[validate(nested)]
    pub globals: GlobalsConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(GatewayError::from)?;
        self.validate_custom()?;
        Ok(())
    }

    fn validate_custom(&self) -> Result<()> {
        if self.enum_service.enabled && self.enum_service.base_url.trim().is_empty() {
            return Err(GatewayError::config_missing(
                "enum_service.base_url is required when enum_service.enabled is true",
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub request_timeout_seconds: u64,

    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_seconds: 30,
            enable_cors: true,
            cors_origins: vec![],
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Config store client configuration (spec.md §4.1, §6).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfigStoreSettings {
    #[validate(length(min = 1, message = "Config store root prefix cannot be empty"))]
    pub root_prefix: String,

    #[validate(range(min = 1, max = 300, message = "Poll interval must be between 1 and 300 seconds"))]
    pub poll_interval_seconds: u64,
}

impl Default for ConfigStoreSettings {
    fn default() -> Self {
        Self { root_prefix: "gateway".to_string(), poll_interval_seconds: 5 }
    }
}

/// Document backend configuration (spec.md §5 addition: `mongodb` default
/// production backend, `InMemoryBackend` for dev/test).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BackendConfig {
    /// `"memory"` or `"mongodb"`.
    #[validate(length(min = 1))]
    pub kind: String,

    pub mongo_uri: Option<String>,

    #[validate(length(min = 1, message = "Database name cannot be empty"))]
    pub mongo_database: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: "memory".to_string(),
            mongo_uri: None,
            mongo_database: "gateway".to_string(),
        }
    }
}

impl BackendConfig {
    pub fn is_mongo(&self) -> bool {
        self.kind.eq_ignore_ascii_case("mongodb")
    }
}

/// Observability configuration (spec.md §4.8 ambient stack addition).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    pub enable_metrics: bool,

    #[validate(range(max = 65535, message = "Metrics port must be <= 65535"))]
    pub metrics_port: u16,

    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { enable_metrics: true, metrics_port: 9090, log_level: "info".to_string(), json_logging: false }
    }
}

impl ObservabilityConfig {
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}

/// Enum service client configuration (spec.md §1, §4.3 supplement).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EnumServiceConfig {
    pub enabled: bool,
    pub base_url: String,

    #[validate(range(min = 1, message = "Refresh interval must be at least 1 second"))]
    pub refresh_interval_seconds: u64,

    /// `FailOnEnumLoadFailure` (spec.md §6): whether a failed enum fetch at
    /// boot aborts startup, or is logged and retried on the next cycle.
    pub fail_on_load_failure: bool,
}

impl Default for EnumServiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            refresh_interval_seconds: 300,
            fail_on_load_failure: false,
        }
    }
}

impl EnumServiceConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

/// Cross-cutting flags from `/{ENV}/Globals` (spec.md §6). Carried as
/// ordinary layered config rather than fetched from the config store at
/// runtime, since these toggle process-wide behavior rather than routing —
/// an Open Question decision recorded in DESIGN.md.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GlobalsConfig {
    /// `IsEnvValidate` (spec.md §6, default false).
    pub is_env_validate: bool,
}

impl Default for GlobalsConfig {
    fn default() -> Self {
        Self { is_env_validate: false }
    }
}
