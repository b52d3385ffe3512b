//! Write pipeline (spec.md §4.6): schema validation, audit-field injection,
//! and sub-entity array merge by technical id.

use crate::backend::DocumentBackend;
use crate::domain::document::{
    field_as_comparable, Document, AUDIT_CREATED_AT_FIELD, AUDIT_LAST_REQUEST_ID_FIELD,
    AUDIT_UPDATED_AT_FIELD, ID_FIELD, SUB_ENTITY_DELETED_FIELD, SUB_ENTITY_DELETE_OP_FIELD,
    SUB_ENTITY_ID_FIELD,
};
use crate::domain::endpoint::EndpointDescriptor;
use crate::domain::filter::FilterNode;
use crate::domain::id::RequestId;
use crate::domain::request::{FilterOptions, WriteRequest};
use crate::domain::response::WriteOutcome;
use crate::errors::GatewayError;
use crate::filter::translate_to_bson;
use crate::observability::metrics;
use crate::registry::{EnumRegistry, SchemaRegistry};
use crate::request_context;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Instant;
use tracing::instrument;

/// Execute a resolved `WriteRequest` (spec.md §4.5, §4.6). Like
/// `execute_query`, this never propagates a request-level failure as an
/// `Err` — it becomes `WriteOutcome::Rejected`.
#[instrument(skip(backend, schemas, enums, descriptor, request), fields(endpoint = %descriptor.name))]
pub async fn execute_write(
    backend: &dyn DocumentBackend,
    schemas: &SchemaRegistry,
    enums: &EnumRegistry,
    descriptor: &EndpointDescriptor,
    request: WriteRequest,
    now: &DateTime<Utc>,
) -> WriteOutcome {
    match request {
        WriteRequest::Create { request_id, collection, documents, .. } => {
            create(backend, schemas, enums, descriptor, collection, documents, request_id, now).await
        }
        WriteRequest::Update { request_id, collection, filter, updates, .. } => {
            update(backend, schemas, enums, descriptor, collection, filter, updates, request_id, now).await
        }
        WriteRequest::Delete { collection, filter, .. } => delete(backend, collection, filter).await,
        WriteRequest::Upsert { request_id, collection, filter, document, .. } => {
            upsert(backend, schemas, enums, descriptor, collection, filter, document, request_id, now).await
        }
    }
}

async fn validate_schema(
    schemas: &SchemaRegistry,
    enums: &EnumRegistry,
    descriptor: &EndpointDescriptor,
    document: &Document,
) -> Result<(), GatewayError> {
    let Some(schema_name) = &descriptor.schema_name else { return Ok(()) };
    let violations = schemas
        .validate(schema_name, &Value::Object(document.clone()), enums)
        .map_err(|e| GatewayError::internal(e.to_string()))?;
    let passed = violations.is_empty();
    metrics::record_schema_validation(schema_name, passed).await;
    if passed {
        Ok(())
    } else {
        Err(GatewayError::schema_validation(violations))
    }
}

fn inject_create_audit(document: &mut Document, request_id: &RequestId, now: &DateTime<Utc>) {
    let formatted = Value::String(request_context::current_time_format().format(now));
    document.insert(AUDIT_CREATED_AT_FIELD.to_string(), formatted.clone());
    document.insert(AUDIT_UPDATED_AT_FIELD.to_string(), formatted);
    document.insert(AUDIT_LAST_REQUEST_ID_FIELD.to_string(), Value::String(request_id.to_string()));
}

fn inject_update_audit(document: &mut Document, request_id: &RequestId, now: &DateTime<Utc>) {
    let formatted = Value::String(request_context::current_time_format().format(now));
    document.insert(AUDIT_UPDATED_AT_FIELD.to_string(), formatted);
    document.insert(AUDIT_LAST_REQUEST_ID_FIELD.to_string(), Value::String(request_id.to_string()));
}

/// Remove every client-supplied audit field from an incoming patch/document
/// body before it is merged (spec.md §4.6, §8 invariant: "no client-supplied
/// audit field survives"). `_createdAt` is restored from the existing
/// document by the caller; `_updatedAt`/`_lastRequestId` are always
/// recomputed by `inject_update_audit`.
fn strip_audit_fields(mut document: Document) -> Document {
    document.remove(AUDIT_CREATED_AT_FIELD);
    document.remove(AUDIT_UPDATED_AT_FIELD);
    document.remove(AUDIT_LAST_REQUEST_ID_FIELD);
    document
}

/// Resolve every document in `collection` matching `filter` (spec.md §3:
/// `Update`/`Delete`/`Upsert` target documents by filter, not by a single
/// id). Shared by update/delete/upsert so a path-id convenience route and an
/// explicit body filter both resolve through the same matching logic.
async fn resolve_by_filter(
    backend: &dyn DocumentBackend,
    collection: &str,
    filter: &FilterNode,
) -> Result<Vec<Document>, GatewayError> {
    let bson_filter = translate_to_bson(filter);
    let started = Instant::now();
    let result = backend.find(collection, bson_filter, &FilterOptions::default()).await;
    metrics::record_backend_call("find", collection, started.elapsed().as_secs_f64(), result.is_ok())
        .await;
    result.map(|(docs, _)| docs.into_iter().map(to_document).collect())
}

async fn create(
    backend: &dyn DocumentBackend,
    schemas: &SchemaRegistry,
    enums: &EnumRegistry,
    descriptor: &EndpointDescriptor,
    collection: String,
    documents: Vec<Document>,
    request_id: RequestId,
    now: &DateTime<Utc>,
) -> WriteOutcome {
    let mut stored_documents = Vec::with_capacity(documents.len());
    let mut inserted_ids = Vec::with_capacity(documents.len());

    for mut document in documents {
        if let Err(error) = validate_schema(schemas, enums, descriptor, &document).await {
            return WriteOutcome::Rejected(error);
        }
        inject_create_audit(&mut document, &request_id, now);

        let bson_doc = match bson::to_document(&Value::Object(document)) {
            Ok(doc) => doc,
            Err(error) => return WriteOutcome::Rejected(GatewayError::internal(error.to_string())),
        };

        let started = Instant::now();
        let result = backend.insert(&collection, bson_doc).await;
        metrics::record_backend_call("insert", &collection, started.elapsed().as_secs_f64(), result.is_ok())
            .await;

        match result {
            Ok(stored) => {
                let stored = to_document(stored);
                if let Some(id) = stored.get(ID_FIELD) {
                    inserted_ids.push(id.clone());
                }
                stored_documents.push(stored);
            }
            Err(error) => return WriteOutcome::Rejected(error),
        }
    }

    WriteOutcome::Created { documents: stored_documents, inserted_ids }
}

async fn update(
    backend: &dyn DocumentBackend,
    schemas: &SchemaRegistry,
    enums: &EnumRegistry,
    descriptor: &EndpointDescriptor,
    collection: String,
    filter: FilterNode,
    patch: Document,
    request_id: RequestId,
    now: &DateTime<Utc>,
) -> WriteOutcome {
    let matched = match resolve_by_filter(backend, &collection, &filter).await {
        Ok(matched) => matched,
        Err(error) => return WriteOutcome::Rejected(error),
    };
    if matched.is_empty() {
        return WriteOutcome::Rejected(GatewayError::sub_entity_conflict(
            "no document matches the given filter",
        ));
    }

    let matched_count = matched.len() as u64;
    let mut modified_count = 0u64;
    let mut updated_documents = Vec::with_capacity(matched.len());

    for existing in matched {
        let Some(id) = field_as_comparable(&existing, ID_FIELD) else {
            return WriteOutcome::Rejected(GatewayError::internal("matched document has no _id"));
        };

        let mut own_patch = strip_audit_fields(patch.clone());
        if let Err(error) = merge_sub_entities(&existing, &mut own_patch, descriptor.sub_entity_fields.as_deref())
        {
            return WriteOutcome::Rejected(error);
        }

        let created_at = existing.get(AUDIT_CREATED_AT_FIELD).cloned();
        let mut merged = existing;
        for (key, value) in own_patch {
            merged.insert(key, value);
        }
        if let Some(created_at) = created_at {
            merged.insert(AUDIT_CREATED_AT_FIELD.to_string(), created_at);
        }

        if let Err(error) = validate_schema(schemas, enums, descriptor, &merged).await {
            return WriteOutcome::Rejected(error);
        }
        inject_update_audit(&mut merged, &request_id, now);

        let bson_patch = match bson::to_document(&Value::Object(merged)) {
            Ok(doc) => doc,
            Err(error) => return WriteOutcome::Rejected(GatewayError::internal(error.to_string())),
        };

        let started = Instant::now();
        let result = backend.update(&collection, &id, bson_patch).await;
        metrics::record_backend_call("update", &collection, started.elapsed().as_secs_f64(), result.is_ok())
            .await;

        match result {
            Ok(Some(stored)) => {
                modified_count += 1;
                updated_documents.push(to_document(stored));
            }
            Ok(None) => {
                return WriteOutcome::Rejected(GatewayError::sub_entity_conflict(format!(
                    "document {id} vanished"
                )))
            }
            Err(error) => return WriteOutcome::Rejected(error),
        }
    }

    WriteOutcome::Updated { documents: updated_documents, matched_count, modified_count }
}

async fn delete(backend: &dyn DocumentBackend, collection: String, filter: FilterNode) -> WriteOutcome {
    let matched = match resolve_by_filter(backend, &collection, &filter).await {
        Ok(matched) => matched,
        Err(error) => return WriteOutcome::Rejected(error),
    };

    let mut deleted_count = 0u64;
    for existing in &matched {
        let Some(id) = field_as_comparable(existing, ID_FIELD) else { continue };

        let started = Instant::now();
        let result = backend.delete(&collection, &id).await;
        metrics::record_backend_call("delete", &collection, started.elapsed().as_secs_f64(), result.is_ok())
            .await;

        match result {
            Ok(true) => deleted_count += 1,
            Ok(false) => {}
            Err(error) => return WriteOutcome::Rejected(error),
        }
    }

    WriteOutcome::Deleted { deleted_count }
}

async fn upsert(
    backend: &dyn DocumentBackend,
    schemas: &SchemaRegistry,
    enums: &EnumRegistry,
    descriptor: &EndpointDescriptor,
    collection: String,
    filter: FilterNode,
    mut document: Document,
    request_id: RequestId,
    now: &DateTime<Utc>,
) -> WriteOutcome {
    if let Err(error) = validate_schema(schemas, enums, descriptor, &document).await {
        return WriteOutcome::Rejected(error);
    }

    let matched = match resolve_by_filter(backend, &collection, &filter).await {
        Ok(matched) => matched,
        Err(error) => return WriteOutcome::Rejected(error),
    };

    match matched.into_iter().next() {
        Some(existing) => {
            let Some(id) = field_as_comparable(&existing, ID_FIELD) else {
                return WriteOutcome::Rejected(GatewayError::internal("matched document has no _id"));
            };

            let created_at = existing.get(AUDIT_CREATED_AT_FIELD).cloned();
            document = strip_audit_fields(document);
            if let Some(created_at) = created_at {
                document.insert(AUDIT_CREATED_AT_FIELD.to_string(), created_at);
            }
            inject_update_audit(&mut document, &request_id, now);

            let bson_doc = match bson::to_document(&Value::Object(document)) {
                Ok(doc) => doc,
                Err(error) => return WriteOutcome::Rejected(GatewayError::internal(error.to_string())),
            };

            let started = Instant::now();
            let result = backend.update(&collection, &id, bson_doc).await;
            metrics::record_backend_call("update", &collection, started.elapsed().as_secs_f64(), result.is_ok())
                .await;

            match result {
                Ok(Some(stored)) => WriteOutcome::Upserted {
                    was_inserted: false,
                    document: to_document(stored),
                    document_id: None,
                    matched_count: Some(1),
                    modified_count: Some(1),
                },
                Ok(None) => {
                    WriteOutcome::Rejected(GatewayError::sub_entity_conflict(format!("document {id} vanished")))
                }
                Err(error) => WriteOutcome::Rejected(error),
            }
        }
        None => {
            inject_create_audit(&mut document, &request_id, now);

            let bson_doc = match bson::to_document(&Value::Object(document)) {
                Ok(doc) => doc,
                Err(error) => return WriteOutcome::Rejected(GatewayError::internal(error.to_string())),
            };

            let started = Instant::now();
            let result = backend.insert(&collection, bson_doc).await;
            metrics::record_backend_call("insert", &collection, started.elapsed().as_secs_f64(), result.is_ok())
                .await;

            match result {
                Ok(stored) => {
                    let stored = to_document(stored);
                    let document_id = stored.get(ID_FIELD).cloned();
                    WriteOutcome::Upserted {
                        was_inserted: true,
                        document: stored,
                        document_id,
                        matched_count: None,
                        modified_count: None,
                    }
                }
                Err(error) => WriteOutcome::Rejected(error),
            }
        }
    }
}

fn to_document(bson_doc: bson::Document) -> Document {
    match bson::from_document::<Value>(bson_doc) {
        Ok(Value::Object(map)) => map,
        _ => Document::new(),
    }
}

/// Merge each sub-entity array field present in `patch` against the
/// corresponding array in `existing`, by `myId` (spec.md §4.6). Builds
/// `indexById` from the current list; for every incoming element, extracts
/// `myId` and the delete flag (`isDelete` or `isDeleted`, case-insensitive),
/// then removes both operation flags from the element before it is stored:
///
/// a. no `myId` + delete ⇒ error.
/// b. no `myId` + not delete ⇒ new entry: assign a fresh `myId`, set
///    `isDeleted = false`, append.
/// c. `myId` absent from the current list ⇒ error ("does not exist").
/// d. `myId` found but already deleted ⇒ error ("already deleted").
/// e. `myId` found + delete ⇒ soft delete: set the existing entry's
///    `isDeleted = true`, leaving it in the array.
/// f. `myId` found + not delete ⇒ merge every field except `myId` into the
///    existing entry, set `isDeleted = false`.
///
/// The resulting list preserves existing order, with new entries appended.
///
/// `configured_fields` restricts the merge to the endpoint's declared
/// `subEntityFields` (spec.md §3) when present; with no configuration, every
/// array-shaped field present in both the existing document and the
/// incoming patch is treated as a sub-entity field.
fn merge_sub_entities(
    existing: &Document,
    patch: &mut Document,
    configured_fields: Option<&[String]>,
) -> Result<(), GatewayError> {
    let is_array_in_both = |k: &String| -> bool {
        matches!(patch.get(k.as_str()), Some(Value::Array(_)))
            && matches!(existing.get(k.as_str()), Some(Value::Array(_)))
    };

    let sub_entity_fields: Vec<String> = match configured_fields {
        Some(configured) => configured.iter().filter(|k| is_array_in_both(k)).cloned().collect(),
        None => patch
            .iter()
            .filter(|(_, v)| v.is_array())
            .filter(|(k, _)| matches!(existing.get(k.as_str()), Some(Value::Array(_))))
            .map(|(k, _)| k.clone())
            .collect(),
    };

    for field in sub_entity_fields {
        let existing_array = match existing.get(&field) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let incoming_array = match patch.get(&field) {
            Some(Value::Array(items)) => items.clone(),
            _ => continue,
        };

        let merged = merge_one_array(&field, existing_array, incoming_array)?;
        patch.insert(field, Value::Array(merged));
    }

    Ok(())
}

fn extract_delete_flag(object: &serde_json::Map<String, Value>) -> bool {
    object.get(SUB_ENTITY_DELETE_OP_FIELD).and_then(Value::as_bool).unwrap_or(false)
        || object.get(SUB_ENTITY_DELETED_FIELD).and_then(Value::as_bool).unwrap_or(false)
}

fn merge_one_array(
    field: &str,
    existing: Vec<Value>,
    incoming: Vec<Value>,
) -> Result<Vec<Value>, GatewayError> {
    let mut merged = existing;

    for element in incoming {
        let mut object = element
            .as_object()
            .ok_or_else(|| GatewayError::sub_entity_conflict(format!("'{field}' elements must be objects")))?
            .clone();

        let delete_op = extract_delete_flag(&object);
        let my_id = object.get(SUB_ENTITY_ID_FIELD).and_then(Value::as_str).map(str::to_string);
        object.remove(SUB_ENTITY_DELETE_OP_FIELD);
        object.remove(SUB_ENTITY_DELETED_FIELD);

        let my_id = match my_id {
            None if delete_op => {
                return Err(GatewayError::sub_entity_conflict(format!(
                    "'{field}' element has no '{SUB_ENTITY_ID_FIELD}' to delete"
                )));
            }
            None => {
                // (b) brand new sub-entity: mint its technical id.
                let new_id = uuid::Uuid::new_v4().to_string();
                object.insert(SUB_ENTITY_ID_FIELD.to_string(), Value::String(new_id.clone()));
                object.insert(SUB_ENTITY_DELETED_FIELD.to_string(), Value::Bool(false));
                merged.push(Value::Object(object));
                continue;
            }
            Some(id) => id,
        };

        let existing_index = merged.iter().position(|item| {
            item.as_object().and_then(|o| o.get(SUB_ENTITY_ID_FIELD)).and_then(Value::as_str)
                == Some(my_id.as_str())
        });

        let index = existing_index.ok_or_else(|| {
            GatewayError::sub_entity_conflict(format!("'{field}' element '{my_id}' does not exist"))
        })?;

        let already_deleted = merged[index]
            .as_object()
            .and_then(|o| o.get(SUB_ENTITY_DELETED_FIELD))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if already_deleted {
            return Err(GatewayError::sub_entity_conflict(format!(
                "'{field}' element '{my_id}' was already deleted"
            )));
        }

        if delete_op {
            // (e) soft delete: the entry stays in the array.
            if let Some(existing_object) = merged[index].as_object_mut() {
                existing_object.insert(SUB_ENTITY_DELETED_FIELD.to_string(), Value::Bool(true));
            }
        } else {
            // (f) merge every field but `myId` into the existing entry.
            if let Some(existing_object) = merged[index].as_object_mut() {
                for (key, value) in object {
                    if key != SUB_ENTITY_ID_FIELD {
                        existing_object.insert(key, value);
                    }
                }
                existing_object.insert(SUB_ENTITY_DELETED_FIELD.to_string(), Value::Bool(false));
            }
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn new_sub_entity_without_my_id_is_minted_and_appended() {
        let existing = doc(json!({"items": [{"myId": "1", "name": "a", "isDeleted": false}]}));
        let mut patch = doc(json!({"items": [{"name": "b"}]}));

        merge_sub_entities(&existing, &mut patch, None).unwrap();
        let items = patch["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[1]["myId"].as_str().unwrap().len() > 0);
        assert_eq!(items[1]["isDeleted"], false);
    }

    #[test]
    fn matching_my_id_merges_fields_in_place() {
        let existing = doc(json!({"items": [{"myId": "1", "name": "a", "extra": "keep"}]}));
        let mut patch = doc(json!({"items": [{"myId": "1", "name": "updated"}]}));

        merge_sub_entities(&existing, &mut patch, None).unwrap();
        let items = patch["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "updated");
        assert_eq!(items[0]["extra"], "keep");
        assert_eq!(items[0]["isDeleted"], false);
    }

    #[test]
    fn is_delete_soft_deletes_existing_element_in_place() {
        let existing = doc(json!({"items": [{"myId": "1", "name": "a", "isDeleted": false}]}));
        let mut patch = doc(json!({"items": [{"myId": "1", "isDelete": true}]}));

        merge_sub_entities(&existing, &mut patch, None).unwrap();
        let items = patch["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["isDeleted"], true);
    }

    #[test]
    fn delete_of_nonexistent_id_is_a_conflict() {
        let existing = doc(json!({"items": []}));
        let mut patch = doc(json!({"items": [{"myId": "1", "isDelete": true}]}));

        assert!(merge_sub_entities(&existing, &mut patch, None).is_err());
    }

    #[test]
    fn delete_without_my_id_is_a_conflict() {
        let existing = doc(json!({"items": []}));
        let mut patch = doc(json!({"items": [{"isDelete": true}]}));

        assert!(merge_sub_entities(&existing, &mut patch, None).is_err());
    }

    #[test]
    fn unknown_my_id_without_delete_is_a_conflict() {
        let existing = doc(json!({"items": []}));
        let mut patch = doc(json!({"items": [{"myId": "nope", "name": "x"}]}));

        assert!(merge_sub_entities(&existing, &mut patch, None).is_err());
    }

    #[test]
    fn patching_already_deleted_element_is_a_conflict() {
        let existing = doc(json!({"items": [{"myId": "1", "isDeleted": true}]}));
        let mut patch = doc(json!({"items": [{"myId": "1", "name": "x"}]}));

        assert!(merge_sub_entities(&existing, &mut patch, None).is_err());
    }

    #[test]
    fn unconfigured_array_field_is_left_untouched_by_merge() {
        let existing = doc(json!({"items": [{"myId": "1", "name": "a"}], "tags": ["x"]}));
        let mut patch = doc(json!({"tags": ["y"]}));

        merge_sub_entities(&existing, &mut patch, Some(&["items".to_string()])).unwrap();
        assert_eq!(patch["tags"], json!(["y"]));
    }

    mod execute_write {
        use super::*;
        use crate::backend::InMemoryBackend;
        use crate::domain::endpoint::{EndpointKind, FilterConfig};
        use crate::domain::filter::CompareOp;
        use crate::registry::{EnumRegistry, SchemaRegistry};
        use chrono::{TimeZone, Utc};

        fn descriptor() -> EndpointDescriptor {
            EndpointDescriptor {
                name: "widgets".into(),
                method: "POST".into(),
                path: "/widgets".into(),
                kind: EndpointKind::Rest,
                collection: "widgets".into(),
                write_methods: vec!["POST".into(), "PUT".into(), "PATCH".into(), "DELETE".into()],
                filter_config: FilterConfig::default(),
                schema_name: None,
                sequence_enabled: false,
                default_bulk_size: None,
                sub_entity_fields: None,
                nested_document: false,
                metadata: None,
            }
        }

        fn id_filter(id: &str) -> FilterNode {
            FilterNode::Compare { field: ID_FIELD.to_string(), op: CompareOp::Eq, value: json!(id) }
        }

        #[tokio::test]
        async fn batch_create_inserts_every_document() {
            let backend = InMemoryBackend::new();
            let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let request = WriteRequest::Create {
                request_id: RequestId::new(),
                endpoint_name: "widgets".into(),
                collection: "widgets".into(),
                documents: vec![doc(json!({"name": "a"})), doc(json!({"name": "b"}))],
            };

            match execute_write(&backend, &SchemaRegistry::new(), &EnumRegistry::new(), &descriptor(), request, &now)
                .await
            {
                WriteOutcome::Created { documents, inserted_ids } => {
                    assert_eq!(documents.len(), 2);
                    assert_eq!(inserted_ids.len(), 2);
                }
                other => panic!("expected Created, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn update_preserves_created_at_even_when_patch_supplies_one() {
            let backend = InMemoryBackend::new();
            let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            backend
                .insert("widgets", bson::doc! {"_id": "a", "name": "old", "_createdAt": "original"})
                .await
                .unwrap();

            let request = WriteRequest::Update {
                request_id: RequestId::new(),
                endpoint_name: "widgets".into(),
                collection: "widgets".into(),
                filter: id_filter("a"),
                updates: doc(json!({"name": "new", "_createdAt": "forged", "_lastRequestId": "forged"})),
            };

            match execute_write(&backend, &SchemaRegistry::new(), &EnumRegistry::new(), &descriptor(), request, &now)
                .await
            {
                WriteOutcome::Updated { documents, matched_count, modified_count } => {
                    assert_eq!(matched_count, 1);
                    assert_eq!(modified_count, 1);
                    assert_eq!(documents[0]["_createdAt"], "original");
                    assert_eq!(documents[0]["name"], "new");
                }
                other => panic!("expected Updated, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn upsert_against_no_match_inserts_and_reports_was_inserted_true() {
            let backend = InMemoryBackend::new();
            let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

            let request = WriteRequest::Upsert {
                request_id: RequestId::new(),
                endpoint_name: "widgets".into(),
                collection: "widgets".into(),
                filter: id_filter("missing"),
                document: doc(json!({"name": "fresh"})),
            };

            match execute_write(&backend, &SchemaRegistry::new(), &EnumRegistry::new(), &descriptor(), request, &now)
                .await
            {
                WriteOutcome::Upserted { was_inserted, document_id, matched_count, .. } => {
                    assert!(was_inserted);
                    assert!(document_id.is_some());
                    assert!(matched_count.is_none());
                }
                other => panic!("expected Upserted, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn upsert_against_a_match_updates_and_reports_was_inserted_false() {
            let backend = InMemoryBackend::new();
            let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            backend.insert("widgets", bson::doc! {"_id": "a", "name": "old"}).await.unwrap();

            let request = WriteRequest::Upsert {
                request_id: RequestId::new(),
                endpoint_name: "widgets".into(),
                collection: "widgets".into(),
                filter: id_filter("a"),
                document: doc(json!({"name": "updated"})),
            };

            match execute_write(&backend, &SchemaRegistry::new(), &EnumRegistry::new(), &descriptor(), request, &now)
                .await
            {
                WriteOutcome::Upserted { was_inserted, matched_count, modified_count, .. } => {
                    assert!(!was_inserted);
                    assert_eq!(matched_count, Some(1));
                    assert_eq!(modified_count, Some(1));
                }
                other => panic!("expected Upserted, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn delete_by_filter_reports_deleted_count() {
            let backend = InMemoryBackend::new();
            let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            backend.insert("widgets", bson::doc! {"_id": "a", "category": "x"}).await.unwrap();
            backend.insert("widgets", bson::doc! {"_id": "b", "category": "x"}).await.unwrap();
            backend.insert("widgets", bson::doc! {"_id": "c", "category": "y"}).await.unwrap();

            let request = WriteRequest::Delete {
                request_id: RequestId::new(),
                endpoint_name: "widgets".into(),
                collection: "widgets".into(),
                filter: FilterNode::Compare {
                    field: "category".to_string(),
                    op: CompareOp::Eq,
                    value: json!("x"),
                },
            };

            match execute_write(&backend, &SchemaRegistry::new(), &EnumRegistry::new(), &descriptor(), request, &now)
                .await
            {
                WriteOutcome::Deleted { deleted_count } => assert_eq!(deleted_count, 2),
                other => panic!("expected Deleted, got {other:?}"),
            }
        }
    }
}
