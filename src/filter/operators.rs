//! Operator → backend-predicate-key dispatch table (spec.md §4.3).
//!
//! Kept separate from `translator` so the mapping from `CompareOp` to the
//! wire-level operator token a document-store query uses is one small,
//! exhaustively-matched table rather than buried in translation logic.

use crate::domain::filter::CompareOp;

/// The MongoDB-style operator key each `CompareOp` compiles to. `Eq` has no
/// operator key — it's expressed as a direct `{ field: value }` pair.
pub fn backend_operator_key(op: CompareOp) -> Option<&'static str> {
    match op {
        CompareOp::Eq => None,
        CompareOp::Ne => Some("$ne"),
        CompareOp::Gt => Some("$gt"),
        CompareOp::Gte => Some("$gte"),
        CompareOp::Lt => Some("$lt"),
        CompareOp::Lte => Some("$lte"),
        CompareOp::In => Some("$in"),
        CompareOp::Nin => Some("$nin"),
        CompareOp::Regex => Some("$regex"),
        CompareOp::Exists => Some("$exists"),
        CompareOp::Type => Some("$type"),
        CompareOp::Size => Some("$size"),
        CompareOp::All => Some("$all"),
        CompareOp::ElemMatch => Some("$elemMatch"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_has_no_operator_key() {
        assert_eq!(backend_operator_key(CompareOp::Eq), None);
    }

    #[test]
    fn every_other_operator_has_a_key() {
        for op in [
            CompareOp::Ne,
            CompareOp::Gt,
            CompareOp::Gte,
            CompareOp::Lt,
            CompareOp::Lte,
            CompareOp::In,
            CompareOp::Nin,
            CompareOp::Regex,
            CompareOp::Exists,
            CompareOp::Type,
            CompareOp::Size,
            CompareOp::All,
            CompareOp::ElemMatch,
        ] {
            assert!(backend_operator_key(op).is_some());
        }
    }
}
