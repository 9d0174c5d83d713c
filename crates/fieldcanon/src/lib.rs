//! Canonicalization and bounded truncation of templated field values.
//!
//! Arbitrary runtime values ([`TemplateValue`]) are turned into JSON-safe
//! data or display text ([`SerializedField`]). Mapping keys are sorted so the
//! same logical value always renders to the same text, and renderings longer
//! than `[core]max_templated_field_length` are redacted and truncated behind
//! a fixed notice.
//!
#![deny(missing_docs)]

/// Canonicalization of templated field values.
pub mod canonicalizer;
/// Integer settings and their sources.
pub mod config;
/// Digests of serialized fields.
pub mod digest;
/// Validated identifier newtypes.
pub mod identifiers;
/// Redaction applied before truncation.
pub mod redaction;
/// Plugin class registries.
pub mod registry;
/// Reports emitted during canonicalization.
pub mod report;
/// Bounded truncation with a leading notice.
pub mod truncation;
/// Validation helpers used by identifier types.
pub mod validation;
/// Template value model.
pub mod value;

pub use canonicalizer::{
    serialize_template_field, CanonicalizationResult, Canonicalizer, SerializedField,
};
pub use config::{ConfigError, ConfigSource, Settings, StaticConfig};
pub use digest::{Digest, DigestAlg, DigestError};
pub use identifiers::{FieldName, ImportPath};
pub use redaction::{NoopRedactor, Redactor, SecretsMasker};
pub use registry::{
    is_core_partition_mapper_import_path, is_core_timetable_import_path, PluginKind,
    PluginRegistries, PluginRegistry, RegistryError,
};
pub use report::{FieldReport, FieldStatus};
pub use truncation::{truncate_rendered_value, truncation_notice};
pub use validation::ValidationError;
pub use value::{CallableRef, TemplateMap, TemplateObject, TemplateValue};
