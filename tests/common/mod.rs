//! Shared harness for the integration suite: builds an `ApiState`/router
//! from a hand-seeded `ConfigCache`, the same way `endpoint_registry`'s and
//! `handler`'s own unit tests do, but wired end to end behind a real HTTP
//! client.

#![allow(dead_code)]

use bytes::Bytes;
use dynagate::api::{build_router, ApiState};
use dynagate::backend::{DocumentBackend, InMemoryBackend};
use dynagate::configstore::ConfigCache;
use dynagate::observability::HealthChecker;
use dynagate::registry::{EndpointRegistry, EnumRegistry, SchemaRegistry};
use std::sync::Arc;

/// One endpoint declaration, mirroring the leaves `endpoint_registry`
/// reads out of `endpoints/{name}/*`.
pub struct EndpointSeed {
    pub name: &'static str,
    pub method: &'static str,
    pub path: &'static str,
    pub collection: &'static str,
    pub write_methods: &'static str,
    pub filter_config: Option<serde_json::Value>,
}

impl EndpointSeed {
    pub fn new(name: &'static str, method: &'static str, path: &'static str, collection: &'static str) -> Self {
        Self { name, method, path, collection, write_methods: "", filter_config: None }
    }

    pub fn writable(mut self, methods: &'static str) -> Self {
        self.write_methods = methods;
        self
    }

    pub fn filtering(mut self, config: serde_json::Value) -> Self {
        self.filter_config = Some(config);
        self
    }
}

fn seed_endpoint(cache: &ConfigCache, seed: &EndpointSeed) {
    let base = format!("endpoints/{}", seed.name);
    cache.put(format!("{base}/method"), Bytes::from(seed.method));
    cache.put(format!("{base}/path"), Bytes::from(seed.path));
    cache.put(format!("{base}/collection"), Bytes::from(seed.collection));
    if !seed.write_methods.is_empty() {
        cache.put(format!("{base}/writeMethods"), Bytes::from(seed.write_methods));
    }
    if let Some(config) = &seed.filter_config {
        cache.put(format!("{base}/filterConfig"), Bytes::from(config.to_string()));
    }
}

/// Builds a ready-to-serve `ApiState` over an in-memory backend, with every
/// endpoint in `seeds` registered. Env validation is left off; callers that
/// need scenario 5 (environment breach) flip it on after construction via
/// `with_env_validation`.
pub fn api_state(seeds: &[EndpointSeed]) -> ApiState {
    let cache = ConfigCache::new();
    for seed in seeds {
        seed_endpoint(&cache, seed);
    }

    let endpoints = Arc::new(EndpointRegistry::new());
    endpoints.rebuild(&cache).expect("seeded endpoints must build");

    ApiState {
        endpoints,
        schemas: Arc::new(SchemaRegistry::new()),
        enums: Arc::new(EnumRegistry::new()),
        backend: Arc::new(InMemoryBackend::new()),
        health: Arc::new(HealthChecker::new()),
        env_validation_enabled: false,
        configured_env: "prod".to_string(),
    }
}

pub fn with_env_validation(mut state: ApiState, configured_env: &str) -> ApiState {
    state.env_validation_enabled = true;
    state.configured_env = configured_env.to_string();
    state
}

pub async fn seed_document(state: &ApiState, collection: &str, document: serde_json::Value) {
    let bson_doc = bson::to_document(&document).expect("seed document must serialize");
    state.backend.insert(collection, bson_doc).await.expect("seed insert must succeed");
}

pub fn test_server(state: ApiState) -> axum_test::TestServer {
    axum_test::TestServer::new(build_router(state, true)).expect("router must build into a test server")
}
