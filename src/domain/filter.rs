//! The filter expression tree (spec.md §3, §4.3).
//!
//! `FilterNode` is a closed sum type rather than a trait-object hierarchy —
//! the operator set is fixed by spec.md's GLOSSARY and new operators are
//! additive compiler-checked match arms, not runtime registrations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Comparison operators that take a single scalar/array operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Regex,
    Exists,
    /// Matches a value whose BSON type code equals the operand (spec.md §3,
    /// §4.3: "`$type` requires a number").
    Type,
    /// Matches an array whose length equals the operand.
    Size,
    /// Matches an array containing every element of the operand array.
    All,
    /// Matches an array with at least one element satisfying the operand
    /// sub-filter.
    ElemMatch,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::In => "$in",
            Self::Nin => "$nin",
            Self::Regex => "$regex",
            Self::Exists => "$exists",
            Self::Type => "$type",
            Self::Size => "$size",
            Self::All => "$all",
            Self::ElemMatch => "$elemMatch",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$eq" => Some(Self::Eq),
            "$ne" => Some(Self::Ne),
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            "$in" => Some(Self::In),
            "$nin" => Some(Self::Nin),
            "$regex" => Some(Self::Regex),
            "$exists" => Some(Self::Exists),
            "$type" => Some(Self::Type),
            "$size" => Some(Self::Size),
            "$all" => Some(Self::All),
            "$elemMatch" => Some(Self::ElemMatch),
            _ => None,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One node of the filter tree. A query's top-level filter is always a
/// single `FilterNode`; leaves are `Compare`, internal nodes are the
/// boolean combinators.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// `{ "field": { "$op": value } }` or the implicit-eq shorthand
    /// `{ "field": value }`, which is parsed into `Compare { op: Eq, .. }`.
    Compare { field: String, op: CompareOp, value: Value },
    /// `{ "$and": [ ... ] }`
    And(Vec<FilterNode>),
    /// `{ "$or": [ ... ] }`
    Or(Vec<FilterNode>),
    /// `{ "$nor": [ ... ] }`
    Nor(Vec<FilterNode>),
    /// `{ "$not": { ... } }`
    Not(Box<FilterNode>),
}

impl FilterNode {
    /// Every field name referenced anywhere in the tree, for policy checks
    /// against `FilterConfig.allowed_fields` (spec.md §4.3).
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare { field, .. } => out.push(field.as_str()),
            Self::And(children) | Self::Or(children) | Self::Nor(children) => {
                for child in children {
                    child.collect_fields(out);
                }
            }
            Self::Not(child) => child.collect_fields(out),
        }
    }

    /// Tree depth, 1 for a bare `Compare` leaf, used against
    /// `FilterConfig.max_depth` (spec.md §4.3 edge cases).
    pub fn depth(&self) -> usize {
        match self {
            Self::Compare { .. } => 1,
            Self::And(children) | Self::Or(children) | Self::Nor(children) => {
                1 + children.iter().map(FilterNode::depth).max().unwrap_or(0)
            }
            Self::Not(child) => 1 + child.depth(),
        }
    }
}
