//! Redaction applied to rendered values before they are truncated.

use regex::Regex;
use tracing::debug;

/// Replacement text for masked content.
pub const MASK: &str = "***";

/// Field-name fragments that mark a field as sensitive.
pub const DEFAULT_SENSITIVE_FIELDS: &[&str] = &[
    "access_token",
    "api_key",
    "apikey",
    "authorization",
    "passphrase",
    "passwd",
    "password",
    "private_key",
    "secret",
    "token",
];

/// Masks sensitive content in a rendered field value.
pub trait Redactor: Send + Sync {
    /// Returns `text` with sensitive content masked. `field_name` names the
    /// field the text was rendered from.
    fn redact(&self, text: &str, field_name: &str) -> String;
}

/// Redactor that returns its input untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRedactor;

impl Redactor for NoopRedactor {
    fn redact(&self, text: &str, _field_name: &str) -> String {
        text.to_string()
    }
}

/// Redactor that masks sensitive fields, known secret values and pattern
/// matches.
#[derive(Debug, Clone)]
pub struct SecretsMasker {
    sensitive_fields: Vec<String>,
    secrets: Vec<String>,
    patterns: Vec<Regex>,
}

impl Default for SecretsMasker {
    fn default() -> Self {
        Self {
            sensitive_fields: DEFAULT_SENSITIVE_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            secrets: Vec::new(),
            patterns: Vec::new(),
        }
    }
}

impl SecretsMasker {
    /// Creates a masker with the default sensitive field names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field-name fragment that marks a field as sensitive.
    pub fn with_sensitive_field(mut self, fragment: impl Into<String>) -> Self {
        self.sensitive_fields.push(fragment.into().to_lowercase());
        self
    }

    /// Adds a literal secret value to mask wherever it appears.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
            // Longest first so a secret containing another is masked whole.
            self.secrets.sort_by(|a, b| b.len().cmp(&a.len()));
        }
        self
    }

    /// Adds a pattern whose matches are masked.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Whether the field name contains a sensitive fragment.
    pub fn is_sensitive_field(&self, field_name: &str) -> bool {
        let name = field_name.to_lowercase();
        self.sensitive_fields
            .iter()
            .any(|fragment| name.contains(fragment.as_str()))
    }
}

impl Redactor for SecretsMasker {
    fn redact(&self, text: &str, field_name: &str) -> String {
        if self.is_sensitive_field(field_name) {
            debug!(field = field_name, "masking sensitive field");
            return MASK.to_string();
        }

        let mut masked = text.to_string();
        for secret in &self.secrets {
            if masked.contains(secret.as_str()) {
                masked = masked.replace(secret.as_str(), MASK);
            }
        }
        for re in &self.patterns {
            masked = re.replace_all(&masked, MASK).into_owned();
        }
        masked
    }
}
