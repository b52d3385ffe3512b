//! Write-schema and dynamic-enum types (spec.md §3, §4.3 supplement: enum
//! service client).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named JSON Schema registered for an endpoint's writes (spec.md §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaDef {
    pub name: String,
    pub schema: Value,
}

/// One enum fetched from the external enum service (spec.md §1 supplement,
/// GLOSSARY: "ordered mapping from code → literal"). `values` is kept as an
/// ordered `(code, literal)` list rather than a map so the wire order the
/// enum service returned survives into the schema-augmentor's `enum: [...]`
/// arrays and the response transformer's code→literal lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicEnum {
    pub name: String,
    pub values: Vec<(String, String)>,
}

impl DynamicEnum {
    /// Every valid code, in declared order — what the schema-augmentor
    /// inlines as a JSON Schema `enum: [...]` constraint.
    pub fn codes(&self) -> Vec<String> {
        self.values.iter().map(|(code, _)| code.clone()).collect()
    }

    /// The literal a code maps to, for the response transformer.
    pub fn literal_for(&self, code: &str) -> Option<&str> {
        self.values.iter().find(|(c, _)| c == code).map(|(_, literal)| literal.as_str())
    }
}

/// Binds a schema field to a dynamic enum's allowed values, so schema
/// compilation can inline an up-to-date `enum: [...]` constraint
/// (DESIGN.md §9 open-question decision).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumFieldBinding {
    pub field_pointer: String,
    pub enum_name: String,
}
