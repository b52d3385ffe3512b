//! Request parsing and endpoint dispatch (spec.md §4.4).

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{resolve, RequestClass};
pub use parser::{parse_query, parse_write};
