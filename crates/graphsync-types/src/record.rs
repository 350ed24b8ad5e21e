//! Loosely typed records as returned by the graph source.
//!
//! A record is one row of a query result: field name to scalar, nested
//! map, or list. Records are ephemeral: a page is consumed by validation
//! and the write path and never persisted.

use serde_json::{Map, Value};

/// One row of a query result.
pub type Record = Map<String, Value>;

/// One bounded batch of records from a single pagination step.
pub type Page = Vec<Record>;

/// Extract the document identifier from a record.
///
/// Returns `None` when the field is absent, null, or an empty string.
/// Numeric identifiers are rendered in their canonical decimal form.
pub fn record_id(record: &Record, id_field: &str) -> Option<String> {
    match record.get(id_field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
