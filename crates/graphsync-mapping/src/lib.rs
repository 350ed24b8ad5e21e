//! # graphsync-mapping
//!
//! The field-mapping contract an index's documents must satisfy.
//!
//! A raw grouped declaration (`type -> [field, ...]`, with one level of
//! dotted nesting) is parsed once per index into a normalized [`Mapping`].
//! The first page of every query is then checked against the mapping; any
//! field present in data but absent from the mapping aborts that index.

pub mod error;
pub mod mapping;
pub mod validate;

pub use error::MappingError;
pub use mapping::{FieldMapping, FieldType, Mapping};
pub use validate::{collect_field_names, validate_page};
