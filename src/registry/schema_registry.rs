//! Schema registry (spec.md §4.6): named JSON Schemas for endpoint writes,
//! with compiled validators cached the same way
//! `rajeevramani-flowplane/src/services/filter_validation.rs` caches its
//! per-filter-type `jsonschema::Validator`s.

use crate::configstore::ConfigCache;
use crate::domain::schema::{EnumFieldBinding, JsonSchemaDef};
use crate::registry::{schema_augmentor, EnumRegistry};
use dashmap::DashMap;
use jsonschema::{Draft, Validator};
use serde_json::Value;
use std::sync::Arc;

/// Read every `schemas/{name}` leaf as a full JSON Schema blob (spec.md
/// §4.6). Unlike endpoints, a write schema has no further grandchild
/// structure worth modeling separately, so it is stored and read back whole.
pub fn load_schema_defs(cache: &ConfigCache) -> Vec<JsonSchemaDef> {
    cache
        .child_names("schemas")
        .into_iter()
        .filter_map(|name| {
            let schema: Value = cache.get_json(&format!("schemas/{name}"))?;
            Some(JsonSchemaDef { name, schema })
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaRegistryError {
    #[error("unknown schema: {0}")]
    UnknownSchema(String),
    #[error("schema compilation failed for '{name}': {message}")]
    CompilationFailed { name: String, message: String },
}

/// Holds registered schema definitions and their compiled validators. A
/// compiled entry is tagged with the `EnumRegistry` generation it was built
/// against (spec.md §9 "Enum augmentation"), so a schema whose `enumRef`
/// fields resolve to a stale enum snapshot is transparently recompiled
/// rather than serving inlined values from before the last enum refresh.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    definitions: DashMap<String, Value>,
    compiled: DashMap<String, (Arc<Validator>, u64)>,
    bindings: DashMap<String, Vec<EnumFieldBinding>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registered schema set wholesale (called on config rebuild,
    /// mirroring `EndpointRegistry::rebuild`'s snapshot-replace behavior).
    pub fn replace_all(&self, defs: Vec<JsonSchemaDef>) {
        self.definitions.clear();
        self.compiled.clear();
        self.bindings.clear();
        for def in defs {
            self.definitions.insert(def.name, def.schema);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Validate `document` against the named schema, returning every
    /// violation rather than stopping at the first (spec.md §4.6 edge case:
    /// "collect all schema violations, not just the first").
    pub fn validate(
        &self,
        name: &str,
        document: &Value,
        enums: &EnumRegistry,
    ) -> Result<Vec<String>, SchemaRegistryError> {
        let validator = self.get_or_compile(name, enums)?;
        Ok(validator.iter_errors(document).map(|e| format!("{}: {e}", e.instance_path)).collect())
    }

    /// Every `(pointer, enumName)` binding recorded the last time `name` was
    /// compiled — what the response transformer walks to map stored codes
    /// back to literals (spec.md §9).
    pub fn enum_bindings(&self, name: &str) -> Vec<EnumFieldBinding> {
        self.bindings.get(name).map(|entry| entry.value().clone()).unwrap_or_default()
    }

    fn get_or_compile(&self, name: &str, enums: &EnumRegistry) -> Result<Arc<Validator>, SchemaRegistryError> {
        let current_generation = enums.generation();
        if let Some(entry) = self.compiled.get(name) {
            if entry.1 == current_generation {
                return Ok(Arc::clone(&entry.0));
            }
        }

        let schema = self
            .definitions
            .get(name)
            .ok_or_else(|| SchemaRegistryError::UnknownSchema(name.to_string()))?;

        let (augmented, bindings) = schema_augmentor::augment(&schema, enums);

        let validator =
            Validator::options().with_draft(Draft::Draft202012).build(&augmented).map_err(|e| {
                SchemaRegistryError::CompilationFailed { name: name.to_string(), message: e.to_string() }
            })?;

        let validator = Arc::new(validator);
        self.compiled.insert(name.to_string(), (Arc::clone(&validator), current_generation));
        self.bindings.insert(name.to_string(), bindings);
        Ok(validator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget_schema() -> JsonSchemaDef {
        JsonSchemaDef {
            name: "widget".to_string(),
            schema: json!({
                "type": "object",
                "required": ["name", "price"],
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "price": { "type": "number", "minimum": 0 }
                }
            }),
        }
    }

    #[test]
    fn valid_document_has_no_violations() {
        let registry = SchemaRegistry::new();
        registry.replace_all(vec![widget_schema()]);
        let enums = EnumRegistry::new();

        let violations =
            registry.validate("widget", &json!({"name": "gizmo", "price": 9.99}), &enums).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn invalid_document_accumulates_all_violations() {
        let registry = SchemaRegistry::new();
        registry.replace_all(vec![widget_schema()]);
        let enums = EnumRegistry::new();

        let violations = registry.validate("widget", &json!({"price": -1}), &enums).unwrap();
        assert!(violations.len() >= 2, "expected missing-name and negative-price violations");
    }

    #[test]
    fn unknown_schema_is_an_error() {
        let registry = SchemaRegistry::new();
        let result = registry.validate("nope", &json!({}), &EnumRegistry::new());
        assert!(matches!(result, Err(SchemaRegistryError::UnknownSchema(_))));
    }

    #[test]
    fn compiled_validator_is_cached() {
        let registry = SchemaRegistry::new();
        registry.replace_all(vec![widget_schema()]);
        let enums = EnumRegistry::new();
        let _ = registry.validate("widget", &json!({"name": "a", "price": 1}), &enums);
        assert!(registry.compiled.contains_key("widget"));
    }

    #[tokio::test]
    async fn enum_ref_field_is_augmented_and_binding_recorded() {
        use crate::enumclient::InMemoryEnumClient;

        let registry = SchemaRegistry::new();
        registry.replace_all(vec![JsonSchemaDef {
            name: "widget".to_string(),
            schema: json!({
                "type": "object",
                "properties": { "color": { "enumRef": "Color" } }
            }),
        }]);

        let enums = EnumRegistry::new();
        let client =
            InMemoryEnumClient::with_enum("Color", vec![("R".into(), "Red".into()), ("B".into(), "Blue".into())]);
        crate::registry::enum_registry::refresh_once(&enums, &client, true).await.unwrap();

        let violations = registry.validate("widget", &json!({"color": "R"}), &enums).unwrap();
        assert!(violations.is_empty());

        let violations = registry.validate("widget", &json!({"color": "purple"}), &enums).unwrap();
        assert!(!violations.is_empty());

        let bindings = registry.enum_bindings("widget");
        assert_eq!(bindings, vec![EnumFieldBinding { field_pointer: "/color".into(), enum_name: "Color".into() }]);
    }

    #[tokio::test]
    async fn enum_refresh_invalidates_compiled_validator() {
        use crate::enumclient::InMemoryEnumClient;

        let registry = SchemaRegistry::new();
        registry.replace_all(vec![JsonSchemaDef {
            name: "widget".to_string(),
            schema: json!({ "properties": { "color": { "enumRef": "Color" } } }),
        }]);

        let enums = EnumRegistry::new();
        let client = InMemoryEnumClient::with_enum("Color", vec![("R".into(), "Red".into())]);
        crate::registry::enum_registry::refresh_once(&enums, &client, true).await.unwrap();
        assert!(registry.validate("widget", &json!({"color": "B"}), &enums).unwrap().len() > 0);

        let client = InMemoryEnumClient::with_enum("Color", vec![("B".into(), "Blue".into())]);
        crate::registry::enum_registry::refresh_once(&enums, &client, true).await.unwrap();
        assert!(registry.validate("widget", &json!({"color": "B"}), &enums).unwrap().is_empty());
    }

    #[test]
    fn load_schema_defs_reads_every_schemas_leaf() {
        let cache = crate::configstore::ConfigCache::new();
        cache.put(
            "schemas/widget",
            bytes::Bytes::from(serde_json::to_vec(&json!({"type": "object"})).unwrap()),
        );
        cache.put(
            "schemas/gadget",
            bytes::Bytes::from(serde_json::to_vec(&json!({"type": "object"})).unwrap()),
        );

        let mut defs = load_schema_defs(&cache);
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "gadget");
        assert_eq!(defs[1].name, "widget");
    }
}
