//! Core domain types: the closed data model spec.md §3 describes.

pub mod document;
pub mod endpoint;
pub mod filter;
pub mod id;
pub mod request;
pub mod response;
pub mod schema;

pub use document::Document;
pub use endpoint::{EndpointDescriptor, EndpointKind, FilterConfig};
pub use filter::{CompareOp, FilterNode};
pub use id::RequestId;
pub use request::{FilterOptions, QueryRequest, SequencePage, SortDirection, WriteRequest};
pub use response::{QueryOutcome, SequencePageResult, WriteOutcome};
pub use schema::{DynamicEnum, EnumFieldBinding, JsonSchemaDef};
