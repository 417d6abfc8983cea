use std::fmt;

use thiserror::Error;

use crate::crypto::{CipherError, KdfError, KemError};
use crate::encoding::EncodingError;

/// Errors surfaced at the text boundary.
///
/// Messages are safe to show to the caller: they never contain key, secret,
/// nonce, tag or plaintext bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid KEM ciphertext")]
    InvalidCiphertext,
    #[error("Malformed base64 in field `{field}`")]
    MalformedEncoding { field: String },
    #[error("Decryption failed: the message could not be authenticated")]
    AuthenticationFailed,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Message exceeds the cipher's length limit")]
    MessageTooLarge,
    #[error("Secure randomness unavailable")]
    EntropyUnavailable,
    #[error("Key derivation failed")]
    KeyDerivationFailed,
    #[error("Decrypted message is not valid UTF-8")]
    InvalidPlaintext,
    #[error("Unknown action")]
    UnknownAction,
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Stable, machine-readable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPublicKey,
    InvalidPrivateKey,
    InvalidCiphertext,
    MalformedEncoding,
    AuthenticationFailed,
    EmptyMessage,
    MessageTooLarge,
    EntropyUnavailable,
    KeyDerivationFailed,
    InvalidPlaintext,
    UnknownAction,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidPublicKey => "invalid_public_key",
            ErrorKind::InvalidPrivateKey => "invalid_private_key",
            ErrorKind::InvalidCiphertext => "invalid_ciphertext",
            ErrorKind::MalformedEncoding => "malformed_encoding",
            ErrorKind::AuthenticationFailed => "authentication_failed",
            ErrorKind::EmptyMessage => "empty_message",
            ErrorKind::MessageTooLarge => "message_too_large",
            ErrorKind::EntropyUnavailable => "entropy_unavailable",
            ErrorKind::KeyDerivationFailed => "key_derivation_failed",
            ErrorKind::InvalidPlaintext => "invalid_plaintext",
            ErrorKind::UnknownAction => "unknown_action",
        }
    }

    /// Whether the process cannot safely continue serving requests
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::EntropyUnavailable | ErrorKind::KeyDerivationFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProtocolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::InvalidPublicKey => ErrorKind::InvalidPublicKey,
            ProtocolError::InvalidPrivateKey => ErrorKind::InvalidPrivateKey,
            ProtocolError::InvalidCiphertext => ErrorKind::InvalidCiphertext,
            ProtocolError::MalformedEncoding { .. } => ErrorKind::MalformedEncoding,
            ProtocolError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            ProtocolError::EmptyMessage => ErrorKind::EmptyMessage,
            ProtocolError::MessageTooLarge => ErrorKind::MessageTooLarge,
            ProtocolError::EntropyUnavailable => ErrorKind::EntropyUnavailable,
            ProtocolError::KeyDerivationFailed => ErrorKind::KeyDerivationFailed,
            ProtocolError::InvalidPlaintext => ErrorKind::InvalidPlaintext,
            ProtocolError::UnknownAction => ErrorKind::UnknownAction,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

impl From<KemError> for ProtocolError {
    fn from(err: KemError) -> Self {
        match err {
            KemError::InvalidPublicKey { .. } => ProtocolError::InvalidPublicKey,
            KemError::InvalidPrivateKey { .. } => ProtocolError::InvalidPrivateKey,
            KemError::InvalidCiphertext { .. } => ProtocolError::InvalidCiphertext,
            KemError::EntropyUnavailable => ProtocolError::EntropyUnavailable,
        }
    }
}

impl From<CipherError> for ProtocolError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::AuthenticationFailed => ProtocolError::AuthenticationFailed,
            CipherError::EntropyUnavailable => ProtocolError::EntropyUnavailable,
            // Only reachable for plaintexts beyond the AEAD length limit
            CipherError::EncryptionFailed => ProtocolError::MessageTooLarge,
        }
    }
}

impl From<KdfError> for ProtocolError {
    fn from(_: KdfError) -> Self {
        ProtocolError::KeyDerivationFailed
    }
}

impl From<EncodingError> for ProtocolError {
    fn from(err: EncodingError) -> Self {
        match err {
            EncodingError::Malformed { field } => ProtocolError::MalformedEncoding { field },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KemAlgorithm;

    #[test]
    fn test_only_entropy_and_kdf_are_fatal() {
        assert!(ProtocolError::EntropyUnavailable.is_fatal());
        assert!(ProtocolError::KeyDerivationFailed.is_fatal());
        assert!(!ProtocolError::AuthenticationFailed.is_fatal());
        assert!(!ProtocolError::InvalidPublicKey.is_fatal());
        assert!(!ProtocolError::MalformedEncoding { field: "x".into() }.is_fatal());
    }

    #[test]
    fn test_kem_errors_map_to_kinds() {
        let err: ProtocolError = KemError::InvalidCiphertext {
            algorithm: KemAlgorithm::MlKem768,
            expected: 1088,
            actual: 3,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidCiphertext);

        let err: ProtocolError = KemError::InvalidPrivateKey {
            algorithm: KemAlgorithm::MlKem768,
        }
        .into();
        assert_eq!(err, ProtocolError::InvalidPrivateKey);
    }

    #[test]
    fn test_encoding_error_keeps_field_name() {
        let err: ProtocolError = EncodingError::Malformed {
            field: "kemCiphertext".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::MalformedEncoding);
        assert_eq!(err.to_string(), "Malformed base64 in field `kemCiphertext`");
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(ErrorKind::AuthenticationFailed.as_str(), "authentication_failed");
        assert_eq!(ProtocolError::EmptyMessage.kind().to_string(), "empty_message");
    }
}
