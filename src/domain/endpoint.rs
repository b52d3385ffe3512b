//! Endpoint descriptors (spec.md §3, §4.2): the unit the registry snapshot
//! is built from, one per `endpoints/{name}` subtree in the config store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// What the backend call behind an endpoint actually is. GraphQL endpoints
/// are declared but their execution is out of scope (spec.md §1
/// Non-goals); the dispatcher still resolves and validates them, it just
/// never reaches the orchestrator for anything but `Rest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Rest,
    GraphQl,
}

/// Per-endpoint filter policy (spec.md §3, §4.3): which operators each
/// field may be filtered with, how deep the tree may nest, and whether
/// filtering is permitted on this endpoint at all.
///
/// `_id` is always filterable with `$eq` regardless of what
/// `field_operators` contains (spec.md §3 invariant) — the validator special
/// cases it rather than requiring every endpoint to declare it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Field name → the operator tokens (e.g. `"$regex"`) permitted against
    /// it. A field absent from this map may not be filtered at all.
    #[serde(default)]
    pub field_operators: HashMap<String, Vec<String>>,
    /// Whether filtering is permitted on this endpoint at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Maximum tree depth (spec.md §4.3 edge cases); `None` means unrestricted.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

fn default_enabled() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { field_operators: HashMap::new(), enabled: true, max_depth: None }
    }
}

/// A fully resolved endpoint, built by `EndpointRegistry` from the typed
/// config-cache leaves under `endpoints/{name}/*` (spec.md §4.1, §4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub name: String,
    pub method: String,
    pub path: String,
    pub kind: EndpointKind,
    /// Backend collection/table this endpoint reads and writes.
    pub collection: String,
    /// HTTP methods from `writeMethods` (spec.md §4.1) that route through
    /// the write pipeline instead of the read path.
    pub write_methods: Vec<String>,
    pub filter_config: FilterConfig,
    /// Name of the JSON Schema registered for this endpoint's writes, if any.
    pub schema_name: Option<String>,
    /// Whether a `sequence`/`bulkSize` query-param pair is honored for this
    /// endpoint at all (spec.md §3 `sequenceEnabled`).
    #[serde(default)]
    pub sequence_enabled: bool,
    /// `bulkSize` to use when `sequence` is present but `bulkSize` is
    /// omitted (spec.md §3 `defaultBulkSize`, positive and ≤ 10 000).
    #[serde(default)]
    pub default_bulk_size: Option<u32>,
    /// Field names eligible for sub-entity array merge on update (spec.md
    /// §3 `subEntityFields`); `None` falls back to merging every
    /// array-shaped field present in both the existing document and the
    /// incoming patch.
    #[serde(default)]
    pub sub_entity_fields: Option<Vec<String>>,
    /// Declared but not given further behavior by this specification
    /// (spec.md §3 `nestedDocument`), mirroring how a `GraphQl`-kind
    /// endpoint is resolved and validated without ever reaching execution.
    #[serde(default)]
    pub nested_document: bool,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl EndpointDescriptor {
    pub fn is_write_method(&self, method: &str) -> bool {
        self.write_methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }

    pub fn key(&self) -> (String, String) {
        (self.method.to_ascii_uppercase(), self.path.clone())
    }
}
