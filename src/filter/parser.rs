//! Filter DSL parser (spec.md §4.3): turns the JSON-shaped filter object
//! into a `FilterNode` tree. Parse failures are structural (not matching any
//! known shape) and are reported individually rather than accumulated,
//! since a malformed tree can't be walked further to find more problems.

use crate::domain::filter::{CompareOp, FilterNode};
use crate::errors::GatewayError;
use serde_json::Value;

const COMBINATORS: &[&str] = &["$and", "$or", "$nor", "$not"];

/// Parse a filter object into a `FilterNode` tree. `None` input (no filter
/// supplied) is handled by the caller, not here.
pub fn parse_filter(value: &Value) -> Result<FilterNode, GatewayError> {
    let object = value
        .as_object()
        .ok_or_else(|| GatewayError::invalid_filter("filter must be a JSON object"))?;

    if object.is_empty() {
        return Err(GatewayError::invalid_filter("filter object must not be empty"));
    }

    // A combinator key at the top level owns the whole object; mixing a
    // combinator with field comparisons in the same object is ambiguous
    // and rejected (spec.md §4.3 edge cases).
    let combinator_keys: Vec<&str> =
        object.keys().map(String::as_str).filter(|k| COMBINATORS.contains(k)).collect();

    if !combinator_keys.is_empty() {
        if object.len() > 1 {
            return Err(GatewayError::invalid_filter(
                "a boolean combinator must be the only key in its object",
            ));
        }
        return parse_combinator(combinator_keys[0], &object[combinator_keys[0]]);
    }

    parse_field_conjunction(object)
}

fn parse_combinator(key: &str, value: &Value) -> Result<FilterNode, GatewayError> {
    match key {
        "$not" => Ok(FilterNode::Not(Box::new(parse_filter(value)?))),
        "$and" | "$or" | "$nor" => {
            let array = value
                .as_array()
                .ok_or_else(|| GatewayError::invalid_filter(format!("{key} requires an array")))?;
            if array.is_empty() {
                return Err(GatewayError::invalid_filter(format!("{key} requires a non-empty array")));
            }
            let children =
                array.iter().map(parse_filter).collect::<Result<Vec<_>, _>>()?;
            Ok(match key {
                "$and" => FilterNode::And(children),
                "$or" => FilterNode::Or(children),
                _ => FilterNode::Nor(children),
            })
        }
        other => unreachable!("unhandled combinator {other}"),
    }
}

/// An object with only field keys is an implicit `$and` over each
/// field's comparison (spec.md §3: multiple fields in one filter object
/// are ANDed).
fn parse_field_conjunction(
    object: &serde_json::Map<String, Value>,
) -> Result<FilterNode, GatewayError> {
    let mut clauses = Vec::with_capacity(object.len());
    for (field, value) in object {
        clauses.push(parse_field_value(field, value)?);
    }
    if clauses.len() == 1 {
        Ok(clauses.into_iter().next().unwrap())
    } else {
        Ok(FilterNode::And(clauses))
    }
}

fn parse_field_value(field: &str, value: &Value) -> Result<FilterNode, GatewayError> {
    match value.as_object() {
        // `{ "field": { "$op": operand, ... } }`
        Some(ops) if ops.keys().all(|k| k.starts_with('$')) && !ops.is_empty() => {
            let mut clauses = Vec::with_capacity(ops.len());
            for (token, operand) in ops {
                let op = CompareOp::from_token(token)
                    .ok_or_else(|| GatewayError::invalid_filter(format!("unknown operator: {token}")))?;
                clauses.push(FilterNode::Compare { field: field.to_string(), op, value: operand.clone() });
            }
            if clauses.len() == 1 {
                Ok(clauses.into_iter().next().unwrap())
            } else {
                Ok(FilterNode::And(clauses))
            }
        }
        // `{ "field": scalar }` — implicit equality.
        _ => Ok(FilterNode::Compare { field: field.to_string(), op: CompareOp::Eq, value: value.clone() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_eq_shorthand() {
        let node = parse_filter(&json!({"status": "active"})).unwrap();
        assert_eq!(
            node,
            FilterNode::Compare {
                field: "status".to_string(),
                op: CompareOp::Eq,
                value: json!("active")
            }
        );
    }

    #[test]
    fn explicit_operator() {
        let node = parse_filter(&json!({"age": {"$gt": 18}})).unwrap();
        assert_eq!(
            node,
            FilterNode::Compare { field: "age".to_string(), op: CompareOp::Gt, value: json!(18) }
        );
    }

    #[test]
    fn multiple_fields_become_implicit_and() {
        let node = parse_filter(&json!({"status": "active", "age": {"$gt": 18}})).unwrap();
        match node {
            FilterNode::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn nested_or_and() {
        let node = parse_filter(&json!({
            "$or": [
                {"status": "active"},
                {"$and": [{"age": {"$gte": 21}}, {"age": {"$lte": 65}}]}
            ]
        }))
        .unwrap();
        assert_eq!(node.depth(), 3);
    }

    #[test]
    fn mixing_combinator_and_field_is_rejected() {
        let result = parse_filter(&json!({"$and": [], "status": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn empty_and_array_is_rejected() {
        assert!(parse_filter(&json!({"$and": []})).is_err());
    }

    #[test]
    fn unknown_operator_is_rejected() {
        assert!(parse_filter(&json!({"age": {"$bogus": 1}})).is_err());
    }

    #[test]
    fn non_object_top_level_is_rejected() {
        assert!(parse_filter(&json!(["not", "an", "object"])).is_err());
    }
}
