//! Filter expression engine: parse → validate → translate (spec.md §4.3).

pub mod operators;
pub mod parser;
pub mod translator;
pub mod validator;

pub use parser::parse_filter;
pub use translator::{
    parse_flat_query, parse_options, parse_sequence_page, translate_to_bson, RESERVED_QUERY_PARAMS,
};
pub use validator::validate;
