//! # pqseal
//!
//! **Post-quantum hybrid encryption for short text messages.**
//!
//! A recipient publishes an ML-KEM public key. A sender encapsulates a fresh
//! shared secret against it, derives a 256-bit key, and seals the message
//! with an AEAD. The recipient decapsulates with its private key and opens
//! the sealed message. All artifacts cross the text boundary as base64.
//!
//! - **ML-KEM-512 / 768 / 1024** key encapsulation (FIPS 203)
//! - **AES-256-GCM** or **ChaCha20-Poly1305** payload encryption
//! - Truncation or **HKDF-SHA256** shared-secret → key derivation
//! - Secrets zeroized on drop, never logged, never in error messages
//!
//! ## Quick Start
//!
//! ```rust
//! use pqseal::{Field, FieldMap, HybridCipher};
//!
//! let cipher = HybridCipher::default();
//! let keys = cipher.generate_keys().unwrap();
//!
//! let request = FieldMap::new()
//!     .with(Field::PublicKey, keys.field(Field::PublicKey).unwrap())
//!     .with(Field::Message, "hello world");
//! let encrypted = cipher.encrypt(&request).unwrap();
//!
//! let request = FieldMap::new()
//!     .with(Field::PrivateKey, keys.field(Field::PrivateKey).unwrap())
//!     .with(Field::KemCiphertext, encrypted.field(Field::KemCiphertext).unwrap())
//!     .with(Field::SealedMessage, encrypted.field(Field::SealedMessage).unwrap());
//! let decrypted = cipher.decrypt(&request).unwrap();
//! assert_eq!(decrypted.field(Field::Plaintext), Some("hello world"));
//! ```
//!
//! ## Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`crypto`] | ML-KEM wrapper, key derivation, AEAD sealing |
//! | [`encoding`] | Base64 text boundary |
//! | [`protocol`] | Field maps, orchestrator, error taxonomy |
//! | [`config`] | Algorithm selection and response echo settings |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `std` | Yes | Standard library support |

#![allow(clippy::empty_line_after_doc_comments, clippy::doc_lazy_continuation)]

// ── Public modules ──────────────────────────────────────────────────────────

/// Key encapsulation, key derivation, and authenticated encryption.
pub mod crypto;

/// Base64 conversion for keys, ciphertexts, and sealed messages.
pub mod encoding;

/// Text-boundary operations: generate keys, encrypt, decrypt.
pub mod protocol;

pub mod config;

// ── Re-exports for convenience ──────────────────────────────────────────────

pub use config::{ConfigError, SealConfig};

pub use crypto::{
    CipherSuite, KemAlgorithm, KemKeyPair, KeyDerivation, SealedMessage, SymmetricKey,
};

pub use protocol::{
    error_fields, Action, Envelope, ErrorKind, Field, FieldMap, HybridCipher, OperationBundle,
    ProtocolError,
};

// ── Library metadata ────────────────────────────────────────────────────────

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
pub fn version() -> &'static str {
    VERSION
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert!(version().contains('.'));
    }

    #[test]
    fn test_json_boundary_roundtrip() {
        let cipher = HybridCipher::default();
        let keys = cipher
            .respond(&FieldMap::from_json(r#"{"action":"generate_keys"}"#).unwrap());

        let request = FieldMap::new()
            .with(Field::Action, "encrypt")
            .with(Field::PublicKey, keys.field(Field::PublicKey).unwrap())
            .with(Field::Message, "over json");
        let encrypted = cipher.respond(&FieldMap::from_json(&request.to_json().unwrap()).unwrap());

        let bundle = OperationBundle::from_fields(&encrypted).unwrap();
        let bundle = OperationBundle::from_json(&bundle.to_json().unwrap()).unwrap();
        let request = bundle.to_decrypt_request(keys.field(Field::PrivateKey).unwrap());
        let decrypted = cipher.respond(&FieldMap::from_json(&request.to_json().unwrap()).unwrap());

        assert_eq!(decrypted.field(Field::Plaintext), Some("over json"));
        assert!(!decrypted.contains(Field::Error));
    }
}
