//! Orchestrator outcomes, mapped to HTTP responses by `ResponseBuilder`
//! (spec.md §4.5, §4.7). The orchestrator never propagates an `Err` to its
//! caller for a request-level failure — every outcome, success or policy
//! rejection, is one of these variants.

use crate::domain::document::Document;
use crate::errors::GatewayError;
use serde_json::Value;

/// Cursor state for a `SequenceBased` read (spec.md §4.3 supplement, §9
/// "Sequence-based pagination": "returning the next cursor and a hasMore
/// flag").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencePageResult {
    pub has_more: bool,
    pub next_cursor: Option<i64>,
}

/// Outcome of `executeQuery` (spec.md §4.5). `page` is `Some` only for a
/// `SequenceBased` read; a `Filtered`/`FullCollection` read leaves it `None`
/// and carries no pagination metadata in the response.
#[derive(Debug)]
pub enum QueryOutcome {
    Found { documents: Vec<Document>, total: Option<u64>, page: Option<SequencePageResult> },
    Rejected(GatewayError),
}

/// Outcome of `executeWrite` (spec.md §4.5, §4.6, §4.7).
#[derive(Debug)]
pub enum WriteOutcome {
    Created { documents: Vec<Document>, inserted_ids: Vec<Value> },
    Updated { documents: Vec<Document>, matched_count: u64, modified_count: u64 },
    Deleted { deleted_count: u64 },
    /// `was_inserted = true` when no document matched `filter` and a new one
    /// was created (`document_id`/`document` describe it); `false` when an
    /// existing document matched and was updated (`matched_count`/
    /// `modified_count` describe that instead) (spec.md §4.6, §4.7, §8
    /// invariant: `wasInserted=true ⇒ documentId present; wasInserted=false
    /// ⇒ matchedCount ≥ 1`).
    Upserted {
        was_inserted: bool,
        document: Document,
        document_id: Option<Value>,
        matched_count: Option<u64>,
        modified_count: Option<u64>,
    },
    Rejected(GatewayError),
}

impl WriteOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
