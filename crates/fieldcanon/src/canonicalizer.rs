use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::{ConfigError, ConfigSource, CORE_SECTION, MAX_TEMPLATED_FIELD_LENGTH};
use crate::digest::{Digest, DigestError};
use crate::redaction::{NoopRedactor, Redactor};
use crate::report::{FieldReport, FieldStatus};
use crate::truncation::truncate_rendered_value;
use crate::value::{describe_object, TemplateValue};

/// Serialized form of a templated field: JSON data or display text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SerializedField {
    /// JSON-safe data, returned as-is (tuples converted, mappings sorted).
    Value(Value),
    /// Rendered text: a stringified value, or a truncated rendering.
    Text(String),
}

impl SerializedField {
    /// Text form, if the field was rendered to text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SerializedField::Text(text) => Some(text),
            SerializedField::Value(_) => None,
        }
    }

    /// JSON data, if the field was kept as data.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            SerializedField::Value(value) => Some(value),
            SerializedField::Text(_) => None,
        }
    }

    /// Converts into a JSON value; text becomes a JSON string.
    pub fn into_json(self) -> Value {
        match self {
            SerializedField::Value(value) => value,
            SerializedField::Text(text) => Value::String(text),
        }
    }

    /// SHA-256 over the canonical JSON encoding of the field.
    pub fn digest(&self) -> Result<Digest, DigestError> {
        Digest::of_json(&self.clone().into_json())
    }
}

/// Result of canonicalization.
#[derive(Debug, Clone)]
pub struct CanonicalizationResult {
    /// Serialized field value.
    pub field: SerializedField,
    /// Report describing what happened to the value.
    pub report: FieldReport,
}

/// Canonicalizer for templated field values, bounded by a maximum
/// rendered length.
#[derive(Clone)]
pub struct Canonicalizer {
    max_length: i64,
    redactor: Arc<dyn Redactor>,
}

impl std::fmt::Debug for Canonicalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canonicalizer")
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

impl Canonicalizer {
    /// Creates a canonicalizer that does not redact.
    pub fn new(max_length: i64) -> Self {
        Self {
            max_length,
            redactor: Arc::new(NoopRedactor),
        }
    }

    /// Creates a canonicalizer bounded by `[core]max_templated_field_length`.
    pub fn from_config(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let max_length = source.get_int(CORE_SECTION, MAX_TEMPLATED_FIELD_LENGTH)?;
        Ok(Self::new(max_length))
    }

    /// Replaces the redactor applied before truncation.
    pub fn with_redactor(mut self, redactor: impl Redactor + 'static) -> Self {
        self.redactor = Arc::new(redactor);
        self
    }

    /// Maximum rendered length.
    pub fn max_length(&self) -> i64 {
        self.max_length
    }

    /// Produces the serialized field.
    pub fn canonicalize(&self, value: TemplateValue, field_name: &str) -> SerializedField {
        self.canonicalize_with_report(value, field_name).field
    }

    /// Produces the serialized field + report.
    pub fn canonicalize_with_report(
        &self,
        value: TemplateValue,
        field_name: &str,
    ) -> CanonicalizationResult {
        serialize_template_field(value, field_name, self.max_length, self.redactor.as_ref())
    }
}

/// Returns a serializable representation of a templated field.
///
/// JSON-safe values come back as data with tuples turned into sequences
/// and, for mappings, keys sorted at every level. Other values are
/// rendered to text: their own serialization if they have one, then
/// `<callable qualified.name>` for callables, then their description.
/// Whenever the rendered text is longer than `max_length`, it is redacted
/// and truncated behind the truncation notice.
pub fn serialize_template_field(
    value: TemplateValue,
    field_name: &str,
    max_length: i64,
    redactor: &dyn Redactor,
) -> CanonicalizationResult {
    let bound = Bound {
        field_name,
        max_length,
        redactor,
    };

    // Empty values skip conversion; empty tuples still become sequences.
    let passthrough = value.is_falsy() && !value.is_tuple();
    let value = if passthrough {
        value
    } else {
        let value = value.tuples_to_sequences();
        if matches!(value, TemplateValue::Mapping(_)) {
            value.sort_keys()
        } else {
            value
        }
    };

    let json = match value.to_json() {
        Some(json) => json,
        None => {
            return bound.apply(
                render_unrepresentable(&value),
                FieldStatus::Stringified,
                SerializedField::Text,
            )
        }
    };
    if passthrough {
        return bound.unchanged(json);
    }

    let rendered = render_json(&json);
    bound.apply(rendered, FieldStatus::Unchanged, |_| {
        SerializedField::Value(json)
    })
}

struct Bound<'a> {
    field_name: &'a str,
    max_length: i64,
    redactor: &'a dyn Redactor,
}

impl Bound<'_> {
    fn unchanged(&self, json: Value) -> CanonicalizationResult {
        CanonicalizationResult {
            report: self.report(FieldStatus::Unchanged, render_json(&json).chars().count()),
            field: SerializedField::Value(json),
        }
    }

    fn apply(
        &self,
        rendered: String,
        status: FieldStatus,
        untruncated: impl FnOnce(String) -> SerializedField,
    ) -> CanonicalizationResult {
        let rendered_length = rendered.chars().count();
        if i64::try_from(rendered_length).unwrap_or(i64::MAX) > self.max_length {
            debug!(
                field = self.field_name,
                rendered_length,
                max_length = self.max_length,
                "truncating templated field"
            );
            let redacted = self.redactor.redact(&rendered, self.field_name);
            return CanonicalizationResult {
                field: SerializedField::Text(truncate_rendered_value(&redacted, self.max_length)),
                report: self.report(FieldStatus::Truncated, rendered_length),
            };
        }
        CanonicalizationResult {
            field: untruncated(rendered),
            report: self.report(status, rendered_length),
        }
    }

    fn report(&self, status: FieldStatus, rendered_length: usize) -> FieldReport {
        FieldReport {
            status,
            field_name: self.field_name.to_string(),
            rendered_length,
            max_length: self.max_length,
        }
    }
}

/// Text of a JSON-safe value: strings as themselves, everything else as
/// compact JSON.
fn render_json(json: &Value) -> String {
    match json {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_unrepresentable(value: &TemplateValue) -> String {
    match value {
        TemplateValue::Object(object) => describe_object(object.as_ref()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redaction::SecretsMasker;
    use crate::truncation::{truncation_notice, TRUNCATION_PREFIX, TRUNCATION_SUFFIX};
    use crate::value::{CallableRef, TemplateObject};
    use serde_json::json;

    #[derive(Debug)]
    struct WithSerialize;

    impl TemplateObject for WithSerialize {
        fn serialize(&self) -> Option<String> {
            Some("serialized-form".into())
        }

        fn qualified_name(&self, _include_module: bool) -> Option<String> {
            Some("never.used".into())
        }

        fn describe(&self) -> String {
            "never used".into()
        }
    }

    #[derive(Debug)]
    struct Payload(String);

    impl TemplateObject for Payload {
        fn serialize(&self) -> Option<String> {
            Some(self.0.clone())
        }

        fn describe(&self) -> String {
            "<Payload>".into()
        }
    }

    #[derive(Debug)]
    struct Plain;

    impl TemplateObject for Plain {
        fn describe(&self) -> String {
            "<Plain object>".into()
        }
    }

    #[test]
    fn json_values_are_returned_as_data() {
        let canonicalizer = Canonicalizer::new(4096);
        let field = canonicalizer.canonicalize(TemplateValue::from(json!([1, "two"])), "op_args");
        assert_eq!(field, SerializedField::Value(json!([1, "two"])));
    }

    #[test]
    fn falsy_values_are_returned_without_conversion() {
        let canonicalizer = Canonicalizer::new(1);
        for value in [json!(null), json!(""), json!(0), json!(false), json!([]), json!({})] {
            let result = canonicalizer.canonicalize_with_report(value.clone().into(), "f");
            assert_eq!(result.field, SerializedField::Value(value));
            assert_eq!(result.report.status, FieldStatus::Unchanged);
        }
    }

    #[test]
    fn tuples_become_lists_even_when_empty() {
        let canonicalizer = Canonicalizer::new(4096);
        assert_eq!(
            canonicalizer.canonicalize(TemplateValue::Tuple(vec![]), "f"),
            SerializedField::Value(json!([]))
        );
        let nested = TemplateValue::mapping([(
            "pair",
            TemplateValue::Tuple(vec![1i64.into(), TemplateValue::Tuple(vec!["a".into()])]),
        )]);
        assert_eq!(
            canonicalizer.canonicalize(nested, "f"),
            SerializedField::Value(json!({"pair": [1, ["a"]]}))
        );
    }

    #[test]
    fn mappings_are_sorted_recursively() {
        let canonicalizer = Canonicalizer::new(4096);
        let field = canonicalizer.canonicalize(
            TemplateValue::from(json!({"b": {"y": 1, "x": 2}, "a": [{"d": 1, "c": 2}]})),
            "params",
        );
        let text = serde_json::to_string(&field).unwrap();
        assert_eq!(text, r#"{"a":[{"c":2,"d":1}],"b":{"x":2,"y":1}}"#);
    }

    #[test]
    fn insertion_order_does_not_change_truncated_output() {
        let canonicalizer = Canonicalizer::new(95);
        let first = TemplateValue::mapping([("b", 1i64.into()), ("a", 2i64.into())]);
        let second = TemplateValue::mapping([("a", 2i64.into()), ("b", 1i64.into())]);
        let long_first = TemplateValue::mapping([
            ("b", TemplateValue::from("x".repeat(40))),
            ("a", TemplateValue::from("y".repeat(40))),
        ]);
        let long_second = TemplateValue::mapping([
            ("a", TemplateValue::from("y".repeat(40))),
            ("b", TemplateValue::from("x".repeat(40))),
        ]);

        let small = Canonicalizer::new(5);
        assert_eq!(
            small.canonicalize(first, "f"),
            small.canonicalize(second, "f")
        );

        let a = canonicalizer.canonicalize(long_first, "f");
        let b = canonicalizer.canonicalize(long_second, "f");
        assert_eq!(a, b);
        assert!(a.as_text().unwrap().starts_with(TRUNCATION_PREFIX));
    }

    #[test]
    fn long_strings_are_truncated() {
        let canonicalizer = Canonicalizer::new(1);
        let result =
            canonicalizer.canonicalize_with_report("This is a long string".into(), "test");
        assert_eq!(result.field, SerializedField::Text(truncation_notice()));
        assert_eq!(result.report.status, FieldStatus::Truncated);
        assert_eq!(result.report.rendered_length, 21);
    }

    #[test]
    fn long_json_is_rendered_then_truncated() {
        let canonicalizer = Canonicalizer::new(100);
        let field = canonicalizer.canonicalize(
            TemplateValue::from(json!({"key": "value".repeat(30)})),
            "f",
        );
        let text = field.as_text().unwrap();
        assert!(text.starts_with(&format!("{}'{{\"key\":\"value", TRUNCATION_PREFIX)));
        assert!(text.ends_with(TRUNCATION_SUFFIX));
        assert!(text.chars().count() <= 100);
    }

    #[test]
    fn serialize_method_wins_over_callable_name() {
        let canonicalizer = Canonicalizer::new(4096);
        assert_eq!(
            canonicalizer.canonicalize(TemplateValue::object(WithSerialize), "f"),
            SerializedField::Text("serialized-form".into())
        );
    }

    #[test]
    fn callables_render_their_qualified_name() {
        let canonicalizer = Canonicalizer::new(4096);
        let result = canonicalizer.canonicalize_with_report(
            TemplateValue::object(CallableRef::new("dags.etl", "transform")),
            "python_callable",
        );
        assert_eq!(
            result.field,
            SerializedField::Text("<callable dags.etl.transform>".into())
        );
        assert_eq!(result.report.status, FieldStatus::Stringified);
    }

    #[test]
    fn plain_objects_fall_back_to_description() {
        let canonicalizer = Canonicalizer::new(4096);
        assert_eq!(
            canonicalizer.canonicalize(TemplateValue::object(Plain), "f"),
            SerializedField::Text("<Plain object>".into())
        );
    }

    #[test]
    fn containers_with_objects_render_sorted_text() {
        let canonicalizer = Canonicalizer::new(4096);
        let value = TemplateValue::mapping([
            ("cb", TemplateValue::object(CallableRef::new("m", "f"))),
            ("args", TemplateValue::Tuple(vec![1i64.into(), "x".into()])),
        ]);
        assert_eq!(
            canonicalizer.canonicalize(value, "f"),
            SerializedField::Text(r#"{"args": [1, "x"], "cb": <callable m.f>}"#.into())
        );
    }

    #[test]
    fn long_serialized_objects_are_truncated() {
        let canonicalizer = Canonicalizer::new(100);
        let value = TemplateValue::object(Payload(format!("payload:{}", "x".repeat(120))));
        let result = canonicalizer.canonicalize_with_report(value, "f");
        assert_eq!(
            result.field,
            SerializedField::Text(format!("{}'payload:xxxxxxxx'...", TRUNCATION_PREFIX))
        );
        assert_eq!(result.report.status, FieldStatus::Truncated);
        assert_eq!(result.report.rendered_length, 128);
    }

    #[test]
    fn long_callable_names_are_truncated() {
        let canonicalizer = Canonicalizer::new(100);
        let callable = CallableRef::new(
            "pipelines.transforms.normalization.stages",
            "normalize_incoming_records_for_downstream_consumers",
        );
        let result = canonicalizer.canonicalize_with_report(TemplateValue::object(callable), "f");
        assert_eq!(
            result.field,
            SerializedField::Text(format!("{}'<callable pipeli'...", TRUNCATION_PREFIX))
        );
        assert_eq!(result.report.status, FieldStatus::Truncated);
    }

    #[test]
    fn long_mappings_with_objects_are_truncated_after_sorting() {
        let canonicalizer = Canonicalizer::new(100);
        let first = TemplateValue::mapping([
            ("zeta", TemplateValue::object(Plain)),
            ("alpha", TemplateValue::from("a".repeat(100))),
        ]);
        let second = TemplateValue::mapping([
            ("alpha", TemplateValue::from("a".repeat(100))),
            ("zeta", TemplateValue::object(Plain)),
        ]);

        let result = canonicalizer.canonicalize_with_report(first, "f");
        assert_eq!(
            result.field,
            SerializedField::Text(format!(r#"{}'{{"alpha": "aaaaa'..."#, TRUNCATION_PREFIX))
        );
        assert_eq!(result.report.status, FieldStatus::Truncated);
        assert_eq!(canonicalizer.canonicalize(second, "f"), result.field);
    }

    #[test]
    fn serialized_objects_are_redacted_before_truncation() {
        let canonicalizer =
            Canonicalizer::new(100).with_redactor(SecretsMasker::new().with_secret("s3cr3t"));
        let value = TemplateValue::object(Payload(format!("token=s3cr3t;{}", "x".repeat(120))));
        let result = canonicalizer.canonicalize_with_report(value, "conn_uri");
        assert_eq!(
            result.field,
            SerializedField::Text(format!("{}'token=***;xxxxxx'...", TRUNCATION_PREFIX))
        );
        assert_eq!(result.report.status, FieldStatus::Truncated);
    }

    #[test]
    fn repeated_mapping_keys_do_not_depend_on_order() {
        let canonicalizer = Canonicalizer::new(4096);
        let last_two = TemplateValue::mapping([
            ("a", TemplateValue::from(1i64)),
            ("a", TemplateValue::from(2i64)),
        ]);
        assert_eq!(
            canonicalizer.canonicalize(last_two, "f"),
            SerializedField::Value(json!({"a": 2}))
        );

        let with_callable = TemplateValue::mapping([
            ("k", TemplateValue::object(CallableRef::new("m", "f"))),
            ("a", TemplateValue::from(1i64)),
            ("a", TemplateValue::from(2i64)),
        ]);
        assert_eq!(
            canonicalizer.canonicalize(with_callable, "f"),
            SerializedField::Text(r#"{"a": 2, "k": <callable m.f>}"#.into())
        );
    }

    #[test]
    fn non_finite_floats_are_stringified() {
        let canonicalizer = Canonicalizer::new(4096);
        assert_eq!(
            canonicalizer.canonicalize(TemplateValue::Float(f64::INFINITY), "f"),
            SerializedField::Text("Infinity".into())
        );
    }

    #[test]
    fn redaction_happens_before_truncation() {
        let canonicalizer = Canonicalizer::new(100).with_redactor(SecretsMasker::new());
        let field =
            canonicalizer.canonicalize(TemplateValue::from("hunter2".repeat(20)), "password");
        assert_eq!(
            field,
            SerializedField::Text(format!("{}'***'{}", TRUNCATION_PREFIX, TRUNCATION_SUFFIX))
        );
    }

    #[test]
    fn short_values_skip_redaction() {
        let canonicalizer = Canonicalizer::new(4096).with_redactor(SecretsMasker::new());
        assert_eq!(
            canonicalizer.canonicalize("hunter2".into(), "password"),
            SerializedField::Value(json!("hunter2"))
        );
    }

    #[test]
    fn non_positive_bound_yields_empty_text() {
        let canonicalizer = Canonicalizer::new(0);
        assert_eq!(
            canonicalizer.canonicalize("abc".into(), "f"),
            SerializedField::Text(String::new())
        );
    }

    #[test]
    fn digest_is_stable_across_insertion_order() {
        let canonicalizer = Canonicalizer::new(4096);
        let a = canonicalizer.canonicalize(TemplateValue::from(json!({"b": 1, "a": 2})), "f");
        let b = canonicalizer.canonicalize(TemplateValue::from(json!({"a": 2, "b": 1})), "f");
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    }
}
