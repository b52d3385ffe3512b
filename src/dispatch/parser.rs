//! Parses an inbound HTTP request into a `QueryRequest` or `WriteRequest`
//! once the endpoint has been resolved (spec.md §4.4).

use crate::domain::document::{Document, ID_FIELD};
use crate::domain::filter::{CompareOp, FilterNode};
use crate::domain::id::RequestId;
use crate::domain::request::{QueryRequest, WriteRequest};
use crate::errors::GatewayError;
use crate::filter::{parse_filter, parse_flat_query, parse_options, parse_sequence_page};
use serde_json::Value;

/// Build a `QueryRequest` from a resolved endpoint, the request's query
/// params, and an optional JSON filter body (spec.md §4.4): a body present
/// always wins and is parsed as the filter DSL; otherwise a `sequence` +
/// `bulkSize` pair selects sequence-based pagination; otherwise any other
/// non-reserved query params are parsed as a flat GET-style filter; an empty
/// param set is a full-collection read.
pub fn parse_query(
    request_id: RequestId,
    endpoint_name: &str,
    collection: &str,
    query_params: &[(String, String)],
    filter_body: Option<&Value>,
    default_bulk_size: Option<u32>,
) -> Result<QueryRequest, GatewayError> {
    let options = parse_options(query_params)?;

    let (filter, sequence) = if let Some(value) = filter_body {
        (Some(parse_filter(value)?), None)
    } else if let Some(page) = parse_sequence_page(query_params, default_bulk_size)? {
        (None, Some(page))
    } else {
        (parse_flat_query(query_params)?, None)
    };

    Ok(QueryRequest {
        request_id,
        endpoint_name: endpoint_name.to_string(),
        collection: collection.to_string(),
        filter,
        options,
        sequence,
    })
}

/// Build a `WriteRequest` for the given HTTP method and parsed body
/// (spec.md §3, §4.4, §4.6).
///
/// `id` comes from a trailing path segment, when the caller hit an
/// endpoint's collection path with a convenience id rather than posting an
/// explicit `filter`. POST accepts a single document object or a JSON array
/// of them. PUT/PATCH/DELETE bodies carry `{filter, document|updates}` /
/// `{filter}`; when the body carries no `filter` key, the path id is
/// synthesized into `FilterNode::Compare{field:"_id", op:Eq, value:id}` so
/// both conventions resolve through the same filter-based targeting. PUT
/// only becomes an `Upsert` when `upsert` is explicitly requested
/// (spec.md §4.4); otherwise it is an ordinary `Update`.
pub fn parse_write(
    request_id: RequestId,
    endpoint_name: &str,
    collection: &str,
    method: &str,
    id: Option<String>,
    body: Option<Value>,
    upsert: bool,
) -> Result<WriteRequest, GatewayError> {
    match method.to_ascii_uppercase().as_str() {
        "POST" => {
            let documents = match body {
                Some(Value::Array(items)) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(map) => Ok(map),
                        _ => Err(GatewayError::invalid_filter(
                            "each document in a batch create must be a JSON object",
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                Some(Value::Object(map)) => vec![map],
                Some(_) => {
                    return Err(GatewayError::invalid_filter(
                        "request body must be a JSON object or an array of objects",
                    ))
                }
                None => return Err(GatewayError::invalid_filter("POST requires a request body")),
            };
            Ok(WriteRequest::Create {
                request_id,
                endpoint_name: endpoint_name.to_string(),
                collection: collection.to_string(),
                documents,
            })
        }
        "PUT" => {
            let (filter, document) = extract_filter_and_payload(as_object(body)?, id, "document")?;
            if upsert {
                Ok(WriteRequest::Upsert {
                    request_id,
                    endpoint_name: endpoint_name.to_string(),
                    collection: collection.to_string(),
                    filter,
                    document,
                })
            } else {
                Ok(WriteRequest::Update {
                    request_id,
                    endpoint_name: endpoint_name.to_string(),
                    collection: collection.to_string(),
                    filter,
                    updates: document,
                })
            }
        }
        "PATCH" => {
            let (filter, updates) = extract_filter_and_payload(as_object(body)?, id, "updates")?;
            Ok(WriteRequest::Update {
                request_id,
                endpoint_name: endpoint_name.to_string(),
                collection: collection.to_string(),
                filter,
                updates,
            })
        }
        "DELETE" => {
            let filter = extract_filter(as_object(body)?, id)?;
            Ok(WriteRequest::Delete {
                request_id,
                endpoint_name: endpoint_name.to_string(),
                collection: collection.to_string(),
                filter,
            })
        }
        other => Err(GatewayError::method_not_allowed(other)),
    }
}

fn as_object(body: Option<Value>) -> Result<Document, GatewayError> {
    match body {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(GatewayError::invalid_filter("request body must be a JSON object")),
        None => Ok(Document::new()),
    }
}

fn id_filter(id: String) -> FilterNode {
    FilterNode::Compare { field: ID_FIELD.to_string(), op: CompareOp::Eq, value: Value::String(id) }
}

fn extract_filter(mut body: Document, id: Option<String>) -> Result<FilterNode, GatewayError> {
    if let Some(filter_value) = body.remove("filter") {
        parse_filter(&filter_value)
    } else if let Some(id) = id {
        Ok(id_filter(id))
    } else {
        Err(GatewayError::illegal_argument(
            "this request requires either a 'filter' in the body or an id in the request path",
        ))
    }
}

fn extract_filter_and_payload(
    mut body: Document,
    id: Option<String>,
    payload_key: &str,
) -> Result<(FilterNode, Document), GatewayError> {
    if let Some(filter_value) = body.remove("filter") {
        let filter = parse_filter(&filter_value)?;
        let payload = match body.remove(payload_key) {
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(GatewayError::invalid_filter(format!("'{payload_key}' must be a JSON object")))
            }
            None => Document::new(),
        };
        Ok((filter, payload))
    } else if let Some(id) = id {
        Ok((id_filter(id), body))
    } else {
        Err(GatewayError::illegal_argument(
            "this request requires either a 'filter' in the body or an id in the request path",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_query_prefers_body_filter_over_flat_params() {
        let query = parse_query(
            RequestId::new(),
            "widgets",
            "widgets",
            &[("status".to_string(), "ignored".to_string())],
            Some(&json!({"status": "active"})),
            None,
        )
        .unwrap();

        match query.filter.unwrap() {
            crate::domain::filter::FilterNode::Compare { value, .. } => {
                assert_eq!(value, json!("active"));
            }
            other => panic!("unexpected node: {other:?}"),
        }
        assert!(query.sequence.is_none());
    }

    #[test]
    fn parse_query_sequence_pair_selects_sequence_based() {
        let query = parse_query(
            RequestId::new(),
            "widgets",
            "widgets",
            &[("sequence".to_string(), "0".to_string()), ("bulkSize".to_string(), "50".to_string())],
            None,
            None,
        )
        .unwrap();

        assert!(query.filter.is_none());
        let page = query.sequence.expect("expected a sequence page");
        assert_eq!(page.start_sequence, 0);
        assert_eq!(page.bulk_size, 50);
    }

    #[test]
    fn parse_query_body_filter_wins_over_sequence_pair() {
        let query = parse_query(
            RequestId::new(),
            "widgets",
            "widgets",
            &[("sequence".to_string(), "0".to_string()), ("bulkSize".to_string(), "50".to_string())],
            Some(&json!({"status": "active"})),
            None,
        )
        .unwrap();

        assert!(query.filter.is_some());
        assert!(query.sequence.is_none());
    }

    #[test]
    fn parse_query_sequence_without_bulk_size_uses_endpoint_default() {
        let query = parse_query(
            RequestId::new(),
            "widgets",
            "widgets",
            &[("sequence".to_string(), "0".to_string())],
            None,
            Some(25),
        )
        .unwrap();

        let page = query.sequence.expect("expected a sequence page");
        assert_eq!(page.bulk_size, 25);
    }

    #[test]
    fn parse_query_empty_params_is_full_collection() {
        let query = parse_query(RequestId::new(), "widgets", "widgets", &[], None, None).unwrap();
        assert!(query.filter.is_none());
        assert!(query.sequence.is_none());
    }

    #[test]
    fn parse_write_post_single_object_is_create_with_one_document() {
        let write = parse_write(
            RequestId::new(),
            "widgets",
            "widgets",
            "POST",
            None,
            Some(json!({"name": "gizmo"})),
            false,
        )
        .unwrap();
        match write {
            WriteRequest::Create { documents, .. } => assert_eq!(documents.len(), 1),
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn parse_write_post_array_is_batch_create() {
        let write = parse_write(
            RequestId::new(),
            "widgets",
            "widgets",
            "POST",
            None,
            Some(json!([{"name": "a"}, {"name": "b"}])),
            false,
        )
        .unwrap();
        match write {
            WriteRequest::Create { documents, .. } => assert_eq!(documents.len(), 2),
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn parse_write_patch_without_filter_or_id_fails() {
        let result = parse_write(
            RequestId::new(),
            "widgets",
            "widgets",
            "PATCH",
            None,
            Some(Value::Object(serde_json::Map::new())),
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn parse_write_patch_with_path_id_synthesizes_id_filter() {
        let write = parse_write(
            RequestId::new(),
            "widgets",
            "widgets",
            "PATCH",
            Some("abc".to_string()),
            Some(json!({"price": 5})),
            false,
        )
        .unwrap();
        match write {
            WriteRequest::Update { filter, updates, .. } => {
                assert_eq!(
                    filter,
                    crate::domain::filter::FilterNode::Compare {
                        field: "_id".to_string(),
                        op: crate::domain::filter::CompareOp::Eq,
                        value: json!("abc")
                    }
                );
                assert_eq!(updates["price"], 5);
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn parse_write_patch_with_explicit_filter_and_updates_body() {
        let write = parse_write(
            RequestId::new(),
            "widgets",
            "widgets",
            "PATCH",
            None,
            Some(json!({"filter": {"_id": 1}, "updates": {"price": 9}})),
            false,
        )
        .unwrap();
        match write {
            WriteRequest::Update { updates, .. } => assert_eq!(updates["price"], 9),
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn parse_write_put_without_upsert_is_update() {
        let write = parse_write(
            RequestId::new(),
            "widgets",
            "widgets",
            "PUT",
            Some("abc".to_string()),
            Some(json!({"name": "gizmo"})),
            false,
        )
        .unwrap();
        assert!(matches!(write, WriteRequest::Update { .. }));
    }

    #[test]
    fn parse_write_put_with_upsert_flag_is_upsert() {
        let write = parse_write(
            RequestId::new(),
            "widgets",
            "widgets",
            "PUT",
            Some("abc".to_string()),
            Some(json!({"name": "gizmo"})),
            true,
        )
        .unwrap();
        assert!(matches!(write, WriteRequest::Upsert { .. }));
    }

    #[test]
    fn parse_write_delete_with_path_id_synthesizes_id_filter() {
        let write =
            parse_write(RequestId::new(), "widgets", "widgets", "DELETE", Some("abc".to_string()), None, false)
                .unwrap();
        match write {
            WriteRequest::Delete { filter, .. } => {
                assert_eq!(
                    filter,
                    crate::domain::filter::FilterNode::Compare {
                        field: "_id".to_string(),
                        op: crate::domain::filter::CompareOp::Eq,
                        value: json!("abc")
                    }
                );
            }
            other => panic!("expected Delete, got {other:?}"),
        }
    }

    #[test]
    fn parse_write_unknown_method_is_method_not_allowed() {
        let result = parse_write(
            RequestId::new(),
            "widgets",
            "widgets",
            "TRACE",
            None,
            Some(Value::Object(serde_json::Map::new())),
            false,
        );
        assert!(matches!(result, Err(GatewayError::MethodNotAllowed { .. })));
    }
}
