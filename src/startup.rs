//! Boot sequence (spec.md §4.1, §6): read required env vars, load layered
//! config, seed the config cache from the config store, build every
//! registry, spawn the background watch/refresh loops, and finally serve
//! HTTP traffic.

use crate::api::ApiState;
use crate::backend::{DocumentBackend, InMemoryBackend, MongoBackend};
use crate::config::{self, AppConfig, RequiredEnv};
use crate::configstore::{spawn_watch, ConfigCache, ConfigStoreClient, StaticConfigStore};
use crate::enumclient::{EnumServiceClient, HttpEnumServiceClient, InMemoryEnumClient};
use crate::errors::{GatewayError, Result};
use crate::observability::{self, BackendHealthProvider};
use crate::registry::{self, EndpointRegistry, EnumRegistry, SchemaRegistry};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything assembled at startup that `main` needs to hand to the API
/// server. Exposed separately from `ApiState` so tests can construct a
/// subset without going through the full boot sequence.
pub struct Application {
    pub config: AppConfig,
    pub required_env: RequiredEnv,
    pub state: ApiState,
    pub cache: Arc<ConfigCache>,
}

/// Runs the full boot sequence (spec.md §6 exit codes: any failure here is
/// fatal at startup, not a degraded-but-running state).
pub async fn bootstrap() -> Result<Application> {
    let required_env = config::read_required_env()?;
    let config_file = std::env::var("GATEWAY_CONFIG_FILE").ok();
    let app_config = match &config_file {
        Some(path) => config::load_config_from_file(path)?,
        None => config::load_config_from_env()?,
    };

    let health_checker = observability::init_observability(&app_config.observability).await?;
    observability::log_config_info(&app_config);

    let store_client: Arc<dyn ConfigStoreClient> = build_config_store_client()?;
    let cache = Arc::new(ConfigCache::new());
    seed_cache_from_store(&cache, store_client.as_ref(), &app_config).await?;

    let endpoints = Arc::new(EndpointRegistry::new());
    endpoints.rebuild(&cache)?;
    observability::metrics::record_registry_rebuild(true, endpoints.current().len()).await;

    let schemas = Arc::new(SchemaRegistry::new());
    schemas.replace_all(registry::load_schema_defs(&cache));

    let enums = Arc::new(EnumRegistry::new());
    let enum_client: Arc<dyn EnumServiceClient> = if app_config.enum_service.enabled {
        Arc::new(HttpEnumServiceClient::new(app_config.enum_service.base_url.clone()))
    } else {
        Arc::new(InMemoryEnumClient::default())
    };

    if app_config.enum_service.enabled {
        if let Err(error) =
            registry::enum_registry::refresh_once(&enums, enum_client.as_ref(), app_config.enum_service.fail_on_load_failure)
                .await
        {
            if app_config.enum_service.fail_on_load_failure {
                return Err(error);
            }
            warn!(%error, "initial enum load failed, continuing with empty enum registry");
        }
        registry::enum_registry::spawn_refresh_loop(
            Arc::clone(&enums),
            Arc::clone(&enum_client),
            app_config.enum_service.refresh_interval(),
        );
    }

    spawn_registry_rebuild_loop(
        store_client.clone(),
        Arc::clone(&cache),
        Arc::clone(&endpoints),
        Arc::clone(&schemas),
        app_config.config_store.root_prefix.clone(),
    );

    let backend: Arc<dyn DocumentBackend> = build_backend(&app_config).await?;

    health_checker
        .register_provider(
            "document_backend",
            Box::new(BackendHealthProvider::new(Arc::clone(&backend), "__health_probe")),
        )
        .await;

    let state = ApiState {
        endpoints,
        schemas,
        enums,
        backend,
        health: Arc::new(health_checker),
        env_validation_enabled: app_config.globals.is_env_validate,
        configured_env: required_env.env.clone(),
    };

    Ok(Application { config: app_config, required_env, state, cache })
}

/// No production config-store transport ships with this gateway (spec.md
/// §1 Non-goals); `StaticConfigStore` is the only client available, seeded
/// from a local JSON file for local runs and tests.
fn build_config_store_client() -> Result<Arc<dyn ConfigStoreClient>> {
    Ok(Arc::new(StaticConfigStore::new()))
}

async fn seed_cache_from_store(
    cache: &ConfigCache,
    client: &dyn ConfigStoreClient,
    config: &AppConfig,
) -> Result<()> {
    let tree = client.read_tree(&config.config_store.root_prefix).await?;
    for (path, value) in tree {
        let relative = path.strip_prefix(&config.config_store.root_prefix).unwrap_or(&path);
        let relative = relative.trim_start_matches('/');
        cache.put(relative.to_string(), value);
    }

    if let Some(seed_path) = std::env::var("GATEWAY_CONFIG_SEED_FILE").ok() {
        seed_cache_from_file(cache, &seed_path)?;
    }

    Ok(())
}

/// Dev/test convenience: seed the cache directly from a flat JSON object of
/// `path -> string value` pairs, bypassing the config store entirely.
fn seed_cache_from_file(cache: &ConfigCache, path: &str) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| GatewayError::config_missing(format!("failed to read config seed file {path}: {e}")))?;
    let entries: std::collections::HashMap<String, String> = serde_json::from_str(&contents)
        .map_err(|e| GatewayError::config_missing(format!("malformed config seed file {path}: {e}")))?;

    for (key, value) in entries {
        cache.put(key, bytes::Bytes::from(value));
    }
    Ok(())
}

fn spawn_registry_rebuild_loop(
    client: Arc<dyn ConfigStoreClient>,
    cache: Arc<ConfigCache>,
    endpoints: Arc<EndpointRegistry>,
    schemas: Arc<SchemaRegistry>,
    prefix: String,
) {
    let mut ticks = spawn_watch(client, Arc::clone(&cache), prefix);
    tokio::spawn(async move {
        while ticks.changed().await.is_ok() {
            if let Err(error) = endpoints.rebuild(&cache) {
                warn!(%error, "endpoint registry rebuild failed, keeping previous snapshot");
                observability::metrics::record_registry_rebuild(false, endpoints.current().len())
                    .await;
                continue;
            }
            schemas.replace_all(registry::load_schema_defs(&cache));
            observability::metrics::record_registry_rebuild(true, endpoints.current().len()).await;
            info!("registries rebuilt from config store mutation");
        }
    });
}

async fn build_backend(config: &AppConfig) -> Result<Arc<dyn DocumentBackend>> {
    if config.backend.is_mongo() {
        let uri = config.backend.mongo_uri.clone().ok_or_else(|| {
            GatewayError::config_missing("backend.mongo_uri is required when backend.kind is mongodb")
        })?;
        let client = mongodb::Client::with_uri_str(&uri)
            .await
            .map_err(|e| GatewayError::backend_unavailable(format!("mongodb connect failed: {e}")))?;
        let database = client.database(&config.backend.mongo_database);
        Ok(Arc::new(MongoBackend::new(database)))
    } else {
        Ok(Arc::new(InMemoryBackend::new()))
    }
}
