//! Filter policy validation (spec.md §4.3): checks a parsed `FilterNode`
//! against an endpoint's `FilterConfig`, accumulating every violation
//! rather than stopping at the first — the same `iter_errors`-style
//! posture as `services/filter_validation.rs`'s schema validation.

use crate::domain::document::ID_FIELD;
use crate::domain::endpoint::FilterConfig;
use crate::domain::filter::{CompareOp, FilterNode};
use serde_json::Value;

/// Walks `node` against `config`, returning every violation found.
/// An empty result means the filter is allowed to execute.
///
/// `_id` is always filterable with `$eq`, regardless of `config` (spec.md §3
/// invariant) — every other field/operator pair must be declared in
/// `field_operators`.
pub fn validate(node: &FilterNode, config: &FilterConfig) -> Vec<String> {
    let mut violations = Vec::new();

    if !config.enabled {
        violations.push("filtering is disabled for this endpoint".to_string());
        return violations;
    }

    if let Some(max_depth) = config.max_depth {
        let depth = node.depth();
        if depth > max_depth {
            violations.push(format!("filter depth {depth} exceeds maximum of {max_depth}"));
        }
    }

    collect_violations(node, config, &mut violations);
    violations
}

fn collect_violations(node: &FilterNode, config: &FilterConfig, out: &mut Vec<String>) {
    match node {
        FilterNode::Compare { field, op, value } => {
            if field != ID_FIELD || !matches!(op, CompareOp::Eq) {
                match config.field_operators.get(field) {
                    Some(allowed) if allowed.iter().any(|a| a == op.as_str()) => {}
                    Some(_) => {
                        out.push(format!("operator '{op}' is not permitted on field '{field}'"));
                    }
                    None => {
                        out.push(format!("field '{field}' is not permitted in this filter"));
                    }
                }
            }
            if let Some(message) = check_value_type(*op, value) {
                out.push(format!("field '{field}': {message}"));
            }
        }
        FilterNode::And(children) | FilterNode::Or(children) | FilterNode::Nor(children) => {
            for child in children {
                collect_violations(child, config, out);
            }
        }
        FilterNode::Not(child) => collect_violations(child, config, out),
    }
}

/// Value-type predicates for the operators that require a particular JSON
/// shape (spec.md §4.3): `$type`/`$size` require a number, `$in`/`$nin`/
/// `$all` require an array, `$elemMatch` requires an object.
fn check_value_type(op: CompareOp, value: &Value) -> Option<String> {
    match op {
        CompareOp::Type | CompareOp::Size if !value.is_number() => {
            Some(format!("'{}' requires a number operand", op.as_str()))
        }
        CompareOp::In | CompareOp::Nin | CompareOp::All if !value.is_array() => {
            Some(format!("'{}' requires an array operand", op.as_str()))
        }
        CompareOp::ElemMatch if !value.is_object() => {
            Some("'$elemMatch' requires an object operand".to_string())
        }
        _ => None,
    }
}
