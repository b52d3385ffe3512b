//! Enum service HTTP client (spec.md §1: "specified only at its interface").

use crate::domain::schema::DynamicEnum;
use crate::errors::{GatewayError, Result};
use async_trait::async_trait;
use dashmap::DashMap;

#[async_trait]
pub trait EnumServiceClient: Send + Sync {
    async fn fetch_enum(&self, name: &str) -> Result<DynamicEnum>;
    async fn list_enum_names(&self) -> Result<Vec<String>>;
}

/// Production implementation backed by `reqwest`, talking to a simple
/// `GET {base_url}/enums` / `GET {base_url}/enums/{name}` contract.
#[derive(Debug, Clone)]
pub struct HttpEnumServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpEnumServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl EnumServiceClient for HttpEnumServiceClient {
    async fn fetch_enum(&self, name: &str) -> Result<DynamicEnum> {
        let url = format!("{}/enums/{name}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::backend_unavailable(format!("enum service: {e}")))?;

        if !response.status().is_success() {
            return Err(GatewayError::backend_unavailable(format!(
                "enum service returned {} for {name}",
                response.status()
            )));
        }

        response
            .json::<DynamicEnum>()
            .await
            .map_err(|e| GatewayError::backend_unavailable(format!("enum service: {e}")))
    }

    async fn list_enum_names(&self) -> Result<Vec<String>> {
        let url = format!("{}/enums", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::backend_unavailable(format!("enum service: {e}")))?;

        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| GatewayError::backend_unavailable(format!("enum service: {e}")))
    }
}

/// In-memory test double, also usable for local dev without a running enum
/// service (`EnableEnumService=false` leaves this unused entirely).
#[derive(Debug, Default)]
pub struct InMemoryEnumClient {
    enums: DashMap<String, Vec<(String, String)>>,
    fail: bool,
}

impl InMemoryEnumClient {
    pub fn with_enum(name: impl Into<String>, values: Vec<(String, String)>) -> Self {
        let client = Self::default();
        client.enums.insert(name.into(), values);
        client
    }

    pub fn failing() -> Self {
        Self { enums: DashMap::new(), fail: true }
    }
}

#[async_trait]
impl EnumServiceClient for InMemoryEnumClient {
    async fn fetch_enum(&self, name: &str) -> Result<DynamicEnum> {
        if self.fail {
            return Err(GatewayError::backend_unavailable("enum service unreachable"));
        }
        self.enums
            .get(name)
            .map(|entry| DynamicEnum { name: name.to_string(), values: entry.value().clone() })
            .ok_or_else(|| GatewayError::backend_unavailable(format!("no such enum: {name}")))
    }

    async fn list_enum_names(&self) -> Result<Vec<String>> {
        if self.fail {
            return Err(GatewayError::backend_unavailable("enum service unreachable"));
        }
        Ok(self.enums.iter().map(|entry| entry.key().clone()).collect())
    }
}
