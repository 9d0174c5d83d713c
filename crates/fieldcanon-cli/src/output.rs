//! Output formatting utilities.

use fieldcanon::{Digest, FieldReport, SerializedField};
use serde_json::{json, Value};

/// Formats a value as pretty JSON.
pub fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a serialized field as compact JSON.
pub fn format_field(field: &SerializedField) -> String {
    serde_json::to_string(field).unwrap_or_else(|_| "null".to_string())
}

/// Builds the JSON document printed by `canonicalize --report`.
pub fn field_document(
    field: &SerializedField,
    report: Option<&FieldReport>,
    digest: Option<&Digest>,
) -> Value {
    let mut doc = json!({ "field": field });
    if let Some(report) = report {
        doc["report"] = json!(report);
    }
    if let Some(digest) = digest {
        doc["digest"] = json!(digest);
    }
    doc
}
