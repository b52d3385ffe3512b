//! Parsed request shapes handed from the dispatcher to the orchestrator
//! (spec.md §4.4, §4.5, §4.6).

use crate::domain::document::Document;
use crate::domain::filter::FilterNode;
use crate::domain::id::RequestId;

/// Sort direction for `FilterOptions.sort` (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Non-filter query modifiers carried alongside a `FilterNode`
/// (spec.md §4.3: sort, limit, skip, projection).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    /// Insertion-ordered (spec.md §9(c)) field → direction pairs.
    pub sort: Vec<(String, SortDirection)>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    /// Insertion-ordered field → include(`true`)/exclude(`false`) pairs
    /// (spec.md §4.3); empty means "all fields". Include and exclude may
    /// never both be requested for the same field — the parser rejects that
    /// before it reaches here.
    pub projection: Vec<(String, bool)>,
}

/// `SequenceBased` read parameters (spec.md §4.3, §4.4): page through a
/// collection in monotonic order of its `sequence` field, `bulkSize`
/// documents at a time, starting from `startSequence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencePage {
    pub start_sequence: i64,
    pub bulk_size: u32,
}

/// A fully parsed, endpoint-resolved read (spec.md §4.4, §4.5). The three
/// variants spec.md describes (`FullCollection`, `Filtered`, `SequenceBased`)
/// are flattened here rather than modeled as an enum: `sequence` is set
/// exclusively of `filter` (the parser never produces both), and
/// `FullCollection` is simply `filter: None, sequence: None`.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub request_id: RequestId,
    pub endpoint_name: String,
    pub collection: String,
    pub filter: Option<FilterNode>,
    pub options: FilterOptions,
    pub sequence: Option<SequencePage>,
}

/// A fully parsed, endpoint-resolved write (spec.md §3, §4.6). `Update`,
/// `Delete` and `Upsert` target documents by `filter` rather than by a
/// single id — a PATCH/DELETE/PUT against a collection path with a trailing
/// id segment is parsed into a `FilterNode::Compare{field:"_id", op:Eq,
/// value:id}` rather than carrying the id separately, so one resolution
/// path (the filter engine) serves both path-id and body-filter targeting.
#[derive(Debug, Clone)]
pub enum WriteRequest {
    Create {
        request_id: RequestId,
        endpoint_name: String,
        collection: String,
        documents: Vec<Document>,
    },
    Update {
        request_id: RequestId,
        endpoint_name: String,
        collection: String,
        filter: FilterNode,
        updates: Document,
    },
    Delete { request_id: RequestId, endpoint_name: String, collection: String, filter: FilterNode },
    Upsert {
        request_id: RequestId,
        endpoint_name: String,
        collection: String,
        filter: FilterNode,
        document: Document,
    },
}

impl WriteRequest {
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::Create { request_id, .. }
            | Self::Update { request_id, .. }
            | Self::Delete { request_id, .. }
            | Self::Upsert { request_id, .. } => request_id,
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Self::Create { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. }
            | Self::Upsert { collection, .. } => collection,
        }
    }
}
