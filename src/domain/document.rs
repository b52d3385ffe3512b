//! Document representation and the audit/sub-entity field constants used
//! by the write pipeline (spec.md §3, §4.6).

use serde_json::{Map, Value};

/// An order-preserving JSON object (spec.md §3, §9(c) open question resolved
/// in DESIGN.md: insertion order is preserved end to end via `serde_json`'s
/// `preserve_order` feature).
pub type Document = Map<String, Value>;

/// Technical identifier field present on every sub-entity array element.
pub const SUB_ENTITY_ID_FIELD: &str = "myId";
/// Soft-delete marker set on a sub-entity once removed.
pub const SUB_ENTITY_DELETED_FIELD: &str = "isDeleted";
/// Per-request operation flag on an incoming sub-entity payload: delete it.
pub const SUB_ENTITY_DELETE_OP_FIELD: &str = "isDelete";

/// Injected on every create.
pub const AUDIT_CREATED_AT_FIELD: &str = "_createdAt";
/// Injected on every create and update.
pub const AUDIT_UPDATED_AT_FIELD: &str = "_updatedAt";
/// Injected on every write, the id of the request that produced this revision.
pub const AUDIT_LAST_REQUEST_ID_FIELD: &str = "_lastRequestId";

/// The document's top-level technical identifier.
pub const ID_FIELD: &str = "_id";

/// Read `field` as a `myId`-style technical identifier comparable for
/// sub-entity matching; tolerant of both string and numeric representations
/// since config-store-declared ids arrive as strings but backend-stored ones
/// may round-trip as numbers.
pub fn field_as_comparable(doc: &Document, field: &str) -> Option<String> {
    doc.get(field).map(value_as_comparable)
}

pub fn value_as_comparable(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
