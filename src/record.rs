//! The record model the engine pushes through the pipeline.

use serde_json::{Map, Value};

/// A single JSON object read from the input file.
///
/// The engine treats records opaquely except for the configured ID key.
pub type Record = Map<String, Value>;

/// Sentinel used for `record_id` when a failure occurs on a record whose ID
/// could not be extracted.
pub const MISSING_ID_SENTINEL: &str = "N/A";

/// Extract the ID field from a record as a non-empty string.
///
/// Returns `None` if the key is absent, not a string, or an empty string.
pub fn extract_id(record: &Record, id_key: &str) -> Option<String> {
    match record.get(id_key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// A failure record emitted by the engine, with exactly the three fields
/// the output contract specifies.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FailureRecord {
    pub record_id: String,
    pub error_message: String,
    pub original_record: Record,
}

impl FailureRecord {
    pub fn new(id: Option<&str>, error_message: impl Into<String>, original_record: Record) -> Self {
        Self {
            record_id: id.unwrap_or(MISSING_ID_SENTINEL).to_string(),
            error_message: error_message.into(),
            original_record,
        }
    }
}
