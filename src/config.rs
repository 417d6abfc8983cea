//! Explicit configuration handed to [`HybridCipher`](crate::HybridCipher).
//!
//! Nothing here is read from the environment. Both ends of an exchange must
//! agree on `kem`, `cipher` and `kdf`; none of them is carried in the tokens.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{CipherSuite, KemAlgorithm, KeyDerivation};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Config read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HKDF info label must not be empty")]
    EmptyKdfInfo,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SealConfig {
    /// ML-KEM parameter set
    pub kem: KemAlgorithm,
    /// Payload AEAD
    pub cipher: CipherSuite,
    /// Shared secret → AEAD key
    pub kdf: KeyDerivation,
    /// Echo the caller's `publicKey` back in encrypt/decrypt responses
    pub echo_public_key: bool,
    /// Echo the caller's `privateKey` back; off unless explicitly enabled
    pub echo_private_key: bool,
    /// Echo `kemCiphertext` back in decrypt responses
    pub echo_ciphertext: bool,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            kem: KemAlgorithm::default(),
            cipher: CipherSuite::default(),
            kdf: KeyDerivation::default(),
            echo_public_key: true,
            echo_private_key: false,
            echo_ciphertext: true,
        }
    }
}

impl SealConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if let KeyDerivation::HkdfSha256 { info } = &self.kdf {
            if info.is_empty() {
                return Err(ConfigError::EmptyKdfInfo);
            }
        }
        Ok(())
    }
}
