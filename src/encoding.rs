//! Binary-to-text transcoding for everything that crosses the boundary.
//!
//! Standard base64 alphabet with `=` padding. Surrounding ASCII whitespace
//! (form fields, pasted text) is ignored; anything else outside the alphabet
//! is rejected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Names the offending field, never its content.
    #[error("Malformed base64 in field `{field}`")]
    Malformed { field: String },
}

pub type Result<T> = std::result::Result<T, EncodingError>;

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>> {
    decode_field("input", text)
}

/// Decode a named boundary field.
pub fn decode_field(name: &str, text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim_matches(|c: char| c.is_ascii_whitespace()))
        .map_err(|_| EncodingError::Malformed {
            field: name.to_string(),
        })
}
