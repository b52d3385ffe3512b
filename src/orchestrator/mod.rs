//! Request orchestrator (spec.md §4.5): the sole caller of the filter
//! engine and document backend per request, never propagating a
//! request-level failure as an `Err` to its own caller.

pub mod read;
pub mod write;

pub use read::execute_query;
pub use write::execute_write;
