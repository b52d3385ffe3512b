//! Translates a validated `FilterNode` (plus `FilterOptions`) into the
//! predicate shape `DocumentBackend` consumes, and parses the flat
//! `?field=value&field[$gt]=10` GET-style query form into the same
//! `FilterNode` tree the JSON body form produces (spec.md §4.3, §6 reserved
//! query params).

use crate::domain::filter::{CompareOp, FilterNode};
use crate::domain::request::{FilterOptions, SequencePage, SortDirection};
use crate::errors::GatewayError;
use crate::filter::operators::backend_operator_key;
use serde_json::{Map, Value};

/// Query params the dispatcher treats as modifiers rather than filter
/// fields (spec.md §6: `limit`, `skip`, `sort`, `sequence`, `bulkSize`).
pub const RESERVED_QUERY_PARAMS: &[&str] = &["sort", "limit", "skip", "fields", "sequence", "bulkSize"];

/// Largest page a `SequenceBased` read may request (spec.md §8 boundary:
/// `bulkSize = 10 000` accepted, `10 001` rejected).
pub const MAX_BULK_SIZE: u32 = 10_000;

/// Parse the `sequence`/`bulkSize` query-param pair into a `SequencePage`
/// (spec.md §4.3, §4.4). Returns `Ok(None)` when `sequence` is absent.
/// `bulkSize` may be omitted if the endpoint declares a `default_bulk_size`
/// (spec.md §3 `defaultBulkSize`); omitted with no default is rejected.
pub fn parse_sequence_page(
    params: &[(String, String)],
    default_bulk_size: Option<u32>,
) -> Result<Option<SequencePage>, GatewayError> {
    let Some(sequence) = params.iter().find(|(k, _)| k == "sequence").map(|(_, v)| v.as_str())
    else {
        return Ok(None);
    };
    let bulk_size = params.iter().find(|(k, _)| k == "bulkSize").map(|(_, v)| v.as_str());

    let start_sequence: i64 = sequence
        .parse()
        .map_err(|_| GatewayError::invalid_filter("sequence must be an integer"))?;
    if start_sequence < 0 {
        return Err(GatewayError::invalid_filter("sequence must be >= 0"));
    }

    let bulk_size: u32 = match bulk_size {
        Some(raw) => {
            raw.parse().map_err(|_| GatewayError::invalid_filter("bulkSize must be an integer"))?
        }
        None => default_bulk_size.ok_or_else(|| {
            GatewayError::invalid_filter(
                "bulkSize must be supplied (this endpoint has no defaultBulkSize)",
            )
        })?,
    };
    if bulk_size == 0 || bulk_size > MAX_BULK_SIZE {
        return Err(GatewayError::invalid_filter(format!(
            "bulkSize must be between 1 and {MAX_BULK_SIZE}"
        )));
    }

    Ok(Some(SequencePage { start_sequence, bulk_size }))
}

/// A backend-agnostic predicate: a `bson::Document`-shaped value produced
/// from the filter tree, ready for `DocumentBackend::find`.
pub fn translate_to_bson(node: &FilterNode) -> bson::Document {
    json_to_bson(&translate_to_json(node))
}

fn translate_to_json(node: &FilterNode) -> Value {
    match node {
        FilterNode::Compare { field, op, value } => {
            let predicate = match backend_operator_key(*op) {
                None => value.clone(),
                Some(key) => {
                    let mut inner = Map::new();
                    inner.insert(key.to_string(), value.clone());
                    Value::Object(inner)
                }
            };
            let mut object = Map::new();
            object.insert(field.clone(), predicate);
            Value::Object(object)
        }
        FilterNode::And(children) => combinator("$and", children),
        FilterNode::Or(children) => combinator("$or", children),
        FilterNode::Nor(children) => combinator("$nor", children),
        FilterNode::Not(child) => {
            let mut object = Map::new();
            object.insert("$not".to_string(), translate_to_json(child));
            Value::Object(object)
        }
    }
}

fn combinator(key: &str, children: &[FilterNode]) -> Value {
    let mut object = Map::new();
    object.insert(key.to_string(), Value::Array(children.iter().map(translate_to_json).collect()));
    Value::Object(object)
}

fn json_to_bson(value: &Value) -> bson::Document {
    bson::to_document(value).unwrap_or_default()
}

/// Parse `?sort=name,-createdAt&limit=10&skip=5&fields=name,price` into
/// `FilterOptions` (spec.md §4.3, §6).
pub fn parse_options(params: &[(String, String)]) -> Result<FilterOptions, GatewayError> {
    let mut options = FilterOptions::default();

    for (key, value) in params {
        match key.as_str() {
            "sort" => options.sort = parse_sort(value)?,
            "limit" => {
                options.limit =
                    Some(value.parse().map_err(|_| GatewayError::invalid_filter("limit must be an integer"))?)
            }
            "skip" => {
                options.skip =
                    Some(value.parse().map_err(|_| GatewayError::invalid_filter("skip must be an integer"))?)
            }
            "fields" => options.projection = parse_projection(value)?,
            _ => {}
        }
    }

    Ok(options)
}

/// Parse `?fields=name,-price` into ordered include/exclude pairs (spec.md
/// §4.3), reusing the `-` prefix convention `sort` uses for descending.
/// Including and excluding the same field is rejected (spec.md §8 boundary
/// test).
fn parse_projection(raw: &str) -> Result<Vec<(String, bool)>, GatewayError> {
    let mut projection = Vec::new();
    let mut seen: std::collections::HashMap<String, bool> = std::collections::HashMap::new();

    for token in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (field, include) = match token.strip_prefix('-') {
            Some(field) => (field.to_string(), false),
            None => (token.to_string(), true),
        };

        if let Some(&previous) = seen.get(&field) {
            if previous != include {
                return Err(GatewayError::invalid_filter(format!(
                    "field '{field}' cannot be both included and excluded in the same projection"
                )));
            }
            continue;
        }

        seen.insert(field.clone(), include);
        projection.push((field, include));
    }

    Ok(projection)
}

fn parse_sort(raw: &str) -> Result<Vec<(String, SortDirection)>, GatewayError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|token| {
            if let Some(field) = token.strip_prefix('-') {
                Ok((field.to_string(), SortDirection::Descending))
            } else {
                Ok((token.to_string(), SortDirection::Ascending))
            }
        })
        .collect()
}

/// Parse GET-style flat query params (everything not in
/// `RESERVED_QUERY_PARAMS`) into the same `FilterNode` shape the JSON body
/// form produces. `field[$gt]=10` maps to an explicit operator;
/// `field=value` maps to implicit equality.
pub fn parse_flat_query(params: &[(String, String)]) -> Result<Option<FilterNode>, GatewayError> {
    let mut clauses = Vec::new();

    for (key, value) in params {
        if RESERVED_QUERY_PARAMS.contains(&key.as_str()) {
            continue;
        }

        if let Some((field, op_token)) = split_bracket_operator(key) {
            let op = CompareOp::from_token(&op_token)
                .ok_or_else(|| GatewayError::invalid_filter(format!("unknown operator: {op_token}")))?;
            let value = if matches!(op, CompareOp::In | CompareOp::Nin) {
                Value::Array(value.split(',').map(|v| Value::String(v.to_string())).collect())
            } else {
                Value::String(value.clone())
            };
            clauses.push(FilterNode::Compare { field, op, value });
        } else {
            clauses.push(FilterNode::Compare {
                field: key.clone(),
                op: CompareOp::Eq,
                value: Value::String(value.clone()),
            });
        }
    }

    Ok(match clauses.len() {
        0 => None,
        1 => Some(clauses.into_iter().next().unwrap()),
        _ => Some(FilterNode::And(clauses)),
    })
}

fn split_bracket_operator(key: &str) -> Option<(String, String)> {
    let open = key.find('[')?;
    let close = key.find(']')?;
    if close < open {
        return None;
    }
    Some((key[..open].to_string(), key[open + 1..close].to_string()))
}
