use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::consts::{U12, U16};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::kdf::SymmetricKey;

/// AEAD nonce size in bytes
pub const NONCE_BYTES: usize = 12;
/// AEAD authentication tag size in bytes
pub const TAG_BYTES: usize = 16;
/// Fixed token prefix: nonce ‖ tag
pub const SEALED_OVERHEAD: usize = NONCE_BYTES + TAG_BYTES;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Secure randomness unavailable")]
    EntropyUnavailable,
}

pub type Result<T> = std::result::Result<T, CipherError>;

/// Authenticated cipher used for the message payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CipherSuite {
    #[serde(rename = "AES-256-GCM")]
    #[default]
    Aes256Gcm,
    #[serde(rename = "ChaCha20-Poly1305")]
    ChaCha20Poly1305,
}

impl CipherSuite {
    pub fn as_str(self) -> &'static str {
        match self {
            CipherSuite::Aes256Gcm => "AES-256-GCM",
            CipherSuite::ChaCha20Poly1305 => "ChaCha20-Poly1305",
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherSuite {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().replace('_', "-").as_str() {
            "AES-256-GCM" | "AES256GCM" => Ok(CipherSuite::Aes256Gcm),
            "CHACHA20-POLY1305" | "CHACHA20POLY1305" => Ok(CipherSuite::ChaCha20Poly1305),
            _ => Err(format!("unknown cipher suite: {}", s)),
        }
    }
}

/// Sealed message token.
///
/// Wire format: `[nonce: 12][tag: 16][ciphertext: N]`, N = plaintext length.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedMessage {
    pub nonce: [u8; NONCE_BYTES],
    pub tag: [u8; TAG_BYTES],
    pub ciphertext: Vec<u8>,
}

impl SealedMessage {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(SEALED_OVERHEAD + self.ciphertext.len());
        result.extend_from_slice(&self.nonce);
        result.extend_from_slice(&self.tag);
        result.extend_from_slice(&self.ciphertext);
        result
    }

    /// Split a token into its parts.
    ///
    /// A token shorter than nonce + tag cannot authenticate, so truncation is
    /// reported as `AuthenticationFailed` like any other tampering.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SEALED_OVERHEAD {
            return Err(CipherError::AuthenticationFailed);
        }
        let (nonce_bytes, rest) = bytes.split_at(NONCE_BYTES);
        let (tag_bytes, ciphertext) = rest.split_at(TAG_BYTES);

        let mut nonce = [0u8; NONCE_BYTES];
        let mut tag = [0u8; TAG_BYTES];
        nonce.copy_from_slice(nonce_bytes);
        tag.copy_from_slice(tag_bytes);

        Ok(Self {
            nonce,
            tag,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Total encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        SEALED_OVERHEAD + self.ciphertext.len()
    }
}

impl fmt::Debug for SealedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedMessage")
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// No associated data is bound.
pub fn seal(suite: CipherSuite, key: &SymmetricKey, plaintext: &[u8]) -> Result<SealedMessage> {
    let mut nonce = [0u8; NONCE_BYTES];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|_| CipherError::EntropyUnavailable)?;
    seal_with_nonce(suite, key, nonce, plaintext)
}

/// Nonce-explicit sealing; only for known-answer tests.
pub(crate) fn seal_with_nonce(
    suite: CipherSuite,
    key: &SymmetricKey,
    nonce: [u8; NONCE_BYTES],
    plaintext: &[u8],
) -> Result<SealedMessage> {
    let mut buffer = plaintext.to_vec();
    let tag = match suite {
        CipherSuite::Aes256Gcm => {
            let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
                .map_err(|_| CipherError::EncryptionFailed)?;
            encrypt_detached(&cipher, &nonce, &mut buffer)?
        }
        CipherSuite::ChaCha20Poly1305 => {
            let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
                .map_err(|_| CipherError::EncryptionFailed)?;
            encrypt_detached(&cipher, &nonce, &mut buffer)?
        }
    };

    Ok(SealedMessage {
        nonce,
        tag,
        ciphertext: buffer,
    })
}

/// Verify and decrypt a sealed message.
///
/// The tag is checked in constant time before any keystream is applied;
/// on failure no plaintext is released.
pub fn open(
    suite: CipherSuite,
    key: &SymmetricKey,
    sealed: &SealedMessage,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut buffer = Zeroizing::new(sealed.ciphertext.clone());
    match suite {
        CipherSuite::Aes256Gcm => {
            let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
                .map_err(|_| CipherError::AuthenticationFailed)?;
            decrypt_detached(&cipher, &sealed.nonce, &sealed.tag, &mut buffer)?;
        }
        CipherSuite::ChaCha20Poly1305 => {
            let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
                .map_err(|_| CipherError::AuthenticationFailed)?;
            decrypt_detached(&cipher, &sealed.nonce, &sealed.tag, &mut buffer)?;
        }
    }
    Ok(buffer)
}

fn encrypt_detached<C>(cipher: &C, nonce: &[u8; NONCE_BYTES], buffer: &mut [u8]) -> Result<[u8; TAG_BYTES]>
where
    C: AeadInPlace + AeadCore<NonceSize = U12, TagSize = U16>,
{
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(nonce), b"", buffer)
        .map_err(|_| CipherError::EncryptionFailed)?;
    let mut out = [0u8; TAG_BYTES];
    out.copy_from_slice(tag.as_slice());
    Ok(out)
}

fn decrypt_detached<C>(
    cipher: &C,
    nonce: &[u8; NONCE_BYTES],
    tag: &[u8; TAG_BYTES],
    buffer: &mut [u8],
) -> Result<()>
where
    C: AeadInPlace + AeadCore<NonceSize = U12, TagSize = U16>,
{
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            b"",
            buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CipherError::AuthenticationFailed)
}
