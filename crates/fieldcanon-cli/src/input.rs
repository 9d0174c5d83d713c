//! Reading command input from a file or stdin.

use std::io::{self, Read};
use thiserror::Error;

/// Errors raised while reading command input.
#[derive(Debug, Error)]
pub enum InputError {
    /// The input file could not be read.
    #[error("failed to read file {path}: {source}")]
    File {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Stdin could not be read.
    #[error("failed to read stdin: {0}")]
    Stdin(#[from] io::Error),
    /// The input is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads the whole input from `path`, or stdin when no path is given.
pub fn read_text(path: Option<&str>) -> Result<String, InputError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| InputError::File {
            path: path.to_string(),
            source,
        }),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Reads and parses a JSON document.
pub fn read_json(path: Option<&str>) -> Result<serde_json::Value, InputError> {
    let text = read_text(path)?;
    Ok(serde_json::from_str(&text)?)
}
