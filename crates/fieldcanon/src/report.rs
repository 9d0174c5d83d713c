use serde::{Deserialize, Serialize};

/// What canonicalization did to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldStatus {
    /// The value was returned as JSON data.
    Unchanged,
    /// The value could not be represented as JSON and was rendered to text.
    Stringified,
    /// The rendered value exceeded the maximum length and was truncated.
    Truncated,
}

/// Report produced alongside a serialized field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    /// Outcome for the field.
    pub status: FieldStatus,
    /// Name of the field, as passed to the redactor.
    pub field_name: String,
    /// Length in characters of the rendered value before truncation.
    pub rendered_length: usize,
    /// Maximum length in effect.
    pub max_length: i64,
}
