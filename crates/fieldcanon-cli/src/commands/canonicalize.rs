//! Canonicalize command implementation.

use crate::input::read_json;
use crate::output::{field_document, format_field, format_json};
use fieldcanon::{Canonicalizer, FieldName, SecretsMasker, Settings, TemplateValue};
use std::path::Path;
use tracing::debug;

/// Options of the `canonicalize` command.
pub struct Options {
    pub input: Option<String>,
    pub field: String,
    pub max_length: Option<i64>,
    pub config: Option<String>,
    pub masks: Vec<String>,
    pub report: bool,
    pub digest: bool,
}

pub fn run(options: Options) -> Result<(), Box<dyn std::error::Error>> {
    let field_name = FieldName::parse(options.field.as_str())
        .map_err(|e| format!("Invalid field name: {}", e))?;

    let max_length = match options.max_length {
        Some(max_length) => max_length,
        None => Settings::load(options.config.as_deref().map(Path::new))?
            .max_templated_field_length()?,
    };
    debug!(max_length, field = %field_name, "canonicalizing input");

    let masker = options
        .masks
        .into_iter()
        .fold(SecretsMasker::new(), |masker, secret| masker.with_secret(secret));
    let canonicalizer = Canonicalizer::new(max_length).with_redactor(masker);

    let value = TemplateValue::from(read_json(options.input.as_deref())?);
    let result = canonicalizer.canonicalize_with_report(value, field_name.as_ref());

    if options.report || options.digest {
        let digest = if options.digest {
            Some(result.field.digest()?)
        } else {
            None
        };
        let report = options.report.then_some(&result.report);
        println!(
            "{}",
            format_json(&field_document(&result.field, report, digest.as_ref()))
        );
    } else {
        println!("{}", format_field(&result.field));
    }
    Ok(())
}
