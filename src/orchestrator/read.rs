//! Read path of the orchestrator (spec.md §4.5).

use crate::backend::DocumentBackend;
use crate::domain::document::Document;
use crate::domain::endpoint::EndpointDescriptor;
use crate::domain::request::{FilterOptions, QueryRequest, SequencePage, SortDirection};
use crate::domain::response::{QueryOutcome, SequencePageResult};
use crate::domain::schema::EnumFieldBinding;
use crate::errors::GatewayError;
use crate::filter::{translate_to_bson, validate as validate_filter};
use crate::observability::metrics;
use crate::registry::{EnumRegistry, SchemaRegistry};
use bson::{doc, Document as BsonDocument};
use serde_json::Value;
use std::time::Instant;
use tracing::instrument;

/// Field a `SequenceBased` read orders and pages by (spec.md §4.3
/// supplement, §9 "Sequence-based pagination").
const SEQUENCE_FIELD: &str = "sequence";

/// Execute a resolved `QueryRequest` against `backend`. Never returns an
/// `Err` — every failure mode becomes `QueryOutcome::Rejected`
/// (spec.md §4.5: "the orchestrator never propagates a request-level
/// failure to its caller as an exception"). Documents are passed through
/// the schema-augmentor's recorded enum bindings (spec.md §9) before being
/// returned, so a stored code comes back as its literal.
#[instrument(skip(backend, schemas, enums, descriptor, request), fields(endpoint = %descriptor.name, collection = %descriptor.collection))]
pub async fn execute_query(
    backend: &dyn DocumentBackend,
    schemas: &SchemaRegistry,
    enums: &EnumRegistry,
    descriptor: &EndpointDescriptor,
    request: QueryRequest,
) -> QueryOutcome {
    let bindings = descriptor.schema_name.as_deref().map(|name| schemas.enum_bindings(name)).unwrap_or_default();

    if let Some(page) = request.sequence {
        if !descriptor.sequence_enabled {
            return QueryOutcome::Rejected(GatewayError::invalid_filter(
                "sequence-based pagination is not enabled for this endpoint",
            ));
        }
        return execute_sequence_page(backend, &request.collection, page, &bindings, enums).await;
    }

    let filter_bson = match &request.filter {
        None => BsonDocument::new(),
        Some(node) => {
            let violations = validate_filter(node, &descriptor.filter_config);
            if !violations.is_empty() {
                metrics::record_filter_rejected(&descriptor.name).await;
                return QueryOutcome::Rejected(GatewayError::filter_validation(violations));
            }
            translate_to_bson(node)
        }
    };

    let started = Instant::now();
    let result = backend.find(&request.collection, filter_bson, &request.options).await;
    metrics::record_backend_call(
        "find",
        &request.collection,
        started.elapsed().as_secs_f64(),
        result.is_ok(),
    )
    .await;

    match result {
        Ok((documents, total)) => {
            let documents = documents
                .into_iter()
                .map(|doc| {
                    let mut doc: Document = bson::from_document(doc).unwrap_or_default();
                    apply_enum_bindings(&mut doc, &bindings, enums);
                    apply_projection(&mut doc, &request.options.projection);
                    doc
                })
                .collect();
            QueryOutcome::Found { documents, total, page: None }
        }
        Err(error) => QueryOutcome::Rejected(error),
    }
}

/// Apply an ordered include/exclude projection to a returned document
/// (spec.md §4.3). Any include entries make the projection allow-list —
/// `_id` plus the included fields; exclude entries then remove fields from
/// whatever remains. A projection with only excludes starts from the full
/// document.
fn apply_projection(document: &mut Document, projection: &[(String, bool)]) {
    if projection.is_empty() {
        return;
    }

    let includes: Vec<&str> =
        projection.iter().filter(|(_, include)| *include).map(|(field, _)| field.as_str()).collect();
    if !includes.is_empty() {
        document.retain(|key, _| key == crate::domain::document::ID_FIELD || includes.contains(&key.as_str()));
    }

    for (field, include) in projection {
        if !include {
            document.remove(field);
        }
    }
}

/// Walk a document's enum-bound fields, replacing each stored code with its
/// literal (spec.md §9: "used later by the response transformer to map
/// codes to literals").
fn apply_enum_bindings(document: &mut Document, bindings: &[EnumFieldBinding], enums: &EnumRegistry) {
    for binding in bindings {
        let segments: Vec<&str> = binding.field_pointer.split('/').filter(|s| !s.is_empty()).collect();
        if let Some((first, rest)) = segments.split_first() {
            if let Some(value) = document.get_mut(*first) {
                apply_segments(value, rest, &binding.enum_name, enums);
            }
        }
    }
}

fn apply_segments(value: &mut Value, segments: &[&str], enum_name: &str, enums: &EnumRegistry) {
    match segments.split_first() {
        None => {
            if let Value::String(code) = value {
                if let Some(literal) = enums.literal_for(enum_name, code) {
                    *code = literal;
                }
            }
        }
        Some((&"items", rest)) => {
            if let Value::Array(items) = value {
                for item in items.iter_mut() {
                    apply_segments(item, rest, enum_name, enums);
                }
            }
        }
        Some((seg, rest)) => {
            if let Value::Object(map) = value {
                if let Some(child) = map.get_mut(*seg) {
                    apply_segments(child, rest, enum_name, enums);
                }
            }
        }
    }
}

/// Page through `collection` in ascending `sequence` order starting at
/// `page.start_sequence`, fetching one extra document beyond `bulk_size` to
/// determine `has_more` without a separate count query (spec.md §9
/// "Sequence-based pagination": "returning the next cursor and a hasMore
/// flag").
async fn execute_sequence_page(
    backend: &dyn DocumentBackend,
    collection: &str,
    page: SequencePage,
    bindings: &[EnumFieldBinding],
    enums: &EnumRegistry,
) -> QueryOutcome {
    let filter = doc! { SEQUENCE_FIELD: { "$gte": page.start_sequence } };
    let options = FilterOptions {
        sort: vec![(SEQUENCE_FIELD.to_string(), SortDirection::Ascending)],
        limit: Some(u64::from(page.bulk_size) + 1),
        skip: None,
        projection: Vec::new(),
    };

    let started = Instant::now();
    let result = backend.find(collection, filter, &options).await;
    metrics::record_backend_call("find", collection, started.elapsed().as_secs_f64(), result.is_ok())
        .await;

    match result {
        Ok((mut documents, _)) => {
            let has_more = documents.len() > page.bulk_size as usize;
            if has_more {
                documents.truncate(page.bulk_size as usize);
            }
            let next_cursor = documents
                .last()
                .and_then(|d| d.get_i64(SEQUENCE_FIELD).ok())
                .filter(|_| has_more)
                .map(|last| last + 1);
            let documents = documents
                .into_iter()
                .map(|doc| {
                    let mut doc: Document = bson::from_document(doc).unwrap_or_default();
                    apply_enum_bindings(&mut doc, bindings, enums);
                    doc
                })
                .collect();
            QueryOutcome::Found { documents, total: None, page: Some(SequencePageResult { has_more, next_cursor }) }
        }
        Err(error) => QueryOutcome::Rejected(error),
    }
}
