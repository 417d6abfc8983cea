//! Reduce a KEM shared secret to a fixed-length symmetric key.
//!
//! `Truncate` keeps the first 32 bytes of the secret. `HkdfSha256` runs the
//! secret through HKDF-SHA256 with a caller-chosen info label, for callers
//! that need domain separation.

use std::fmt;

use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::kem::SHARED_SECRET_BYTES;

/// AEAD key size in bytes (256-bit ciphers)
pub const SYMMETRIC_KEY_BYTES: usize = 32;

// Truncation is only sound while the KEM secret covers the cipher key.
const _: () = assert!(SHARED_SECRET_BYTES >= SYMMETRIC_KEY_BYTES);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KdfError {
    #[error("Shared secret too short: need {needed} bytes, have {available}")]
    SecretTooShort { needed: usize, available: usize },
    #[error("HKDF expansion failed")]
    ExpansionFailed,
}

pub type Result<T> = std::result::Result<T, KdfError>;

/// Return the first `length` bytes of `shared_secret`.
pub fn derive_key(shared_secret: &[u8], length: usize) -> Result<Zeroizing<Vec<u8>>> {
    let prefix = shared_secret
        .get(..length)
        .ok_or(KdfError::SecretTooShort {
            needed: length,
            available: shared_secret.len(),
        })?;
    Ok(Zeroizing::new(prefix.to_vec()))
}

/// Key derivation method applied to the KEM shared secret
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum KeyDerivation {
    /// First 32 bytes of the shared secret
    #[default]
    Truncate,
    /// HKDF-SHA256 (no salt) expanded with `info`
    HkdfSha256 { info: String },
}

impl KeyDerivation {
    pub fn derive(&self, shared_secret: &[u8]) -> Result<SymmetricKey> {
        let mut key = [0u8; SYMMETRIC_KEY_BYTES];
        match self {
            KeyDerivation::Truncate => {
                let prefix = derive_key(shared_secret, SYMMETRIC_KEY_BYTES)?;
                key.copy_from_slice(&prefix);
            }
            KeyDerivation::HkdfSha256 { info } => {
                let hkdf = Hkdf::<Sha256>::new(None, shared_secret);
                hkdf.expand(info.as_bytes(), &mut key)
                    .map_err(|_| KdfError::ExpansionFailed)?;
            }
        }
        let derived = SymmetricKey(key);
        key.zeroize();
        Ok(derived)
    }
}

/// 256-bit AEAD key. Zeroized on drop, compared in constant time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_BYTES]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; SYMMETRIC_KEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_BYTES] {
        &self.0
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SymmetricKey {}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_truncates() {
        let secret: Vec<u8> = (0u8..64).collect();
        let key = derive_key(&secret, 32).unwrap();
        assert_eq!(key.as_slice(), &secret[..32]);
    }

    #[test]
    fn test_derive_key_exact_length() {
        let secret = [9u8; 32];
        assert_eq!(derive_key(&secret, 32).unwrap().as_slice(), &secret);
    }

    #[test]
    fn test_derive_key_secret_too_short() {
        assert_eq!(
            derive_key(&[0u8; 16], 32).unwrap_err(),
            KdfError::SecretTooShort { needed: 32, available: 16 }
        );
    }

    #[test]
    fn test_truncate_matches_derive_key() {
        let secret = [0x5Au8; 32];
        let key = KeyDerivation::Truncate.derive(&secret).unwrap();
        assert_eq!(key.as_bytes(), &secret);
    }

    #[test]
    fn test_hkdf_domain_separation() {
        let secret = [0x11u8; 32];
        let a = KeyDerivation::HkdfSha256 { info: "app-a".into() }.derive(&secret).unwrap();
        let b = KeyDerivation::HkdfSha256 { info: "app-b".into() }.derive(&secret).unwrap();
        let truncated = KeyDerivation::Truncate.derive(&secret).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, truncated);

        // Deterministic for the same label
        let a2 = KeyDerivation::HkdfSha256 { info: "app-a".into() }.derive(&secret).unwrap();
        assert_eq!(a, a2);
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&KeyDerivation::Truncate).unwrap();
        assert_eq!(json, r#"{"method":"truncate"}"#);

        let parsed: KeyDerivation =
            serde_json::from_str(r#"{"method":"hkdf-sha256","info":"pqseal-v1"}"#).unwrap();
        assert_eq!(parsed, KeyDerivation::HkdfSha256 { info: "pqseal-v1".into() });
    }

    #[test]
    fn test_symmetric_key_debug_redacted() {
        let key = SymmetricKey::from_bytes([0xAB; 32]);
        assert_eq!(format!("{:?}", key), "SymmetricKey(<redacted>)");
    }
}
