//! Table-side data model
//!
//! Coordinates, column roles, the preprocessor handoff and the lookup
//! service seam. Everything here is input plumbing; the semantics live in
//! the engine.

mod lookup;
mod model;
mod preprocessed;

pub use lookup::{
    EntityLookup, LookupEntity, LookupMatch, LookupRequest, LookupResponse, StaticLookup,
};
pub use model::{Candidate, Cell, ColumnPair, ColumnRole};
pub use preprocessed::{
    derive_column_roles, is_date_typing, is_named_entity_typing, is_plain_numeric_typing,
    is_unit_numeric_typing, ColumnTyping, HeaderInfo, PreprocessedTable, TypingScore,
};
