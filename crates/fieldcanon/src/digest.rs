use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

/// Supported digest algorithms for serialized fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlg {
    /// SHA-256.
    #[serde(rename = "sha-256")]
    Sha256,
}

/// Algorithm + bytes digest, encoded as base64url without padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    /// Digest algorithm (currently always `sha-256`).
    pub alg: DigestAlg,
    /// Base64URL (no padding) digest bytes.
    #[serde(rename = "b64")]
    pub b64: String,
}

/// Error returned when a digest cannot be computed.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The value could not be encoded as canonical JSON.
    #[error("canonical JSON encoding failed: {0}")]
    Encoding(String),
}

impl Digest {
    /// SHA-256 of `bytes`.
    pub fn sha256(bytes: &[u8]) -> Self {
        let hash = Sha256::digest(bytes);
        Digest {
            alg: DigestAlg::Sha256,
            b64: URL_SAFE_NO_PAD.encode(hash),
        }
    }

    /// SHA-256 of the RFC 8785 canonical JSON encoding of `value`.
    pub fn of_json(value: &serde_json::Value) -> Result<Self, DigestError> {
        let canonical = canonical_json::to_string(value)
            .map_err(|err| DigestError::Encoding(err.to_string()))?;
        Ok(Self::sha256(canonical.as_bytes()))
    }
}
