/// Protocol Orchestrator
///
/// Sequences KEM → key derivation → AEAD for the three boundary operations:
///
/// 1. `generate_keys`  → `{publicKey, privateKey}`
/// 2. `encrypt`        `{publicKey, message}` → `{kemCiphertext, sealedMessage}`
/// 3. `decrypt`        `{privateKey, kemCiphertext, sealedMessage}` → `{plaintext}`
///
/// The orchestrator holds only its configuration. Every call is independent,
/// so a single `HybridCipher` can serve any number of threads without locking.
/// The decrypt side obtains the shared secret exclusively by decapsulation.
use std::fmt;
use std::str::FromStr;

use zeroize::Zeroizing;

use crate::config::{ConfigError, SealConfig};
use crate::crypto::{aead, kem, KemKeyPair, SealedMessage};
use crate::encoding;
use crate::protocol::bundle::OperationBundle;
use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::fields::{Field, FieldMap};

/// Operation requested through the `action` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GenerateKeys,
    Encrypt,
    Decrypt,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::GenerateKeys => "generate_keys",
            Action::Encrypt => "encrypt",
            Action::Decrypt => "decrypt",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "generate_keys" | "generate-keys" | "generateKeys" => Ok(Action::GenerateKeys),
            "encrypt" => Ok(Action::Encrypt),
            "decrypt" => Ok(Action::Decrypt),
            _ => Err(ProtocolError::UnknownAction),
        }
    }
}

/// Binary output of encryption, before text encoding
#[derive(Debug, Clone)]
pub struct Envelope {
    pub kem_ciphertext: Vec<u8>,
    pub sealed: SealedMessage,
}

impl Envelope {
    pub fn to_bundle(&self) -> OperationBundle {
        OperationBundle {
            kem_ciphertext: encoding::encode(&self.kem_ciphertext),
            sealed_message: encoding::encode(&self.sealed.to_bytes()),
        }
    }
}

/// Stateless hybrid encryption front-end
#[derive(Debug, Clone, Default)]
pub struct HybridCipher {
    config: SealConfig,
}

impl HybridCipher {
    pub fn new(config: SealConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SealConfig {
        &self.config
    }

    // ── Byte-level operations ───────────────────────────────────────────

    pub fn generate_keypair(&self) -> Result<KemKeyPair> {
        Ok(kem::generate_keypair(self.config.kem)?)
    }

    /// Encrypt `plaintext` for the holder of `public_key`.
    pub fn seal_for(&self, public_key: &[u8], plaintext: &[u8]) -> Result<Envelope> {
        let kem::EncapsulatedSecret {
            kem_ciphertext,
            shared_secret,
        } = kem::encapsulate(self.config.kem, public_key)?;
        let key = self.config.kdf.derive(shared_secret.as_slice())?;
        let sealed = aead::seal(self.config.cipher, &key, plaintext)?;

        log::debug!(
            "sealed {} bytes with {} + {}",
            plaintext.len(),
            self.config.kem,
            self.config.cipher
        );
        Ok(Envelope {
            kem_ciphertext,
            sealed,
        })
    }

    /// Decapsulate with `private_key` and open `sealed`.
    ///
    /// A ciphertext or private key from a different exchange is not detected
    /// by the KEM; it fails here as `AuthenticationFailed`.
    pub fn open_as(
        &self,
        private_key: &[u8],
        kem_ciphertext: &[u8],
        sealed: &SealedMessage,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let shared_secret = kem::decapsulate(self.config.kem, kem_ciphertext, private_key)?;
        let key = self.config.kdf.derive(shared_secret.as_slice())?;
        let plaintext = aead::open(self.config.cipher, &key, sealed).map_err(|e| {
            log::warn!("open failed: {}", e);
            ProtocolError::from(e)
        })?;

        log::debug!("opened {} bytes", plaintext.len());
        Ok(plaintext)
    }

    // ── Boundary operations ─────────────────────────────────────────────

    pub fn generate_keys(&self) -> Result<FieldMap> {
        let keypair = self.generate_keypair()?;
        Ok(FieldMap::new()
            .with(Field::PublicKey, encoding::encode(keypair.public_key()))
            .with(Field::PrivateKey, encoding::encode(keypair.private_key())))
    }

    pub fn encrypt(&self, request: &FieldMap) -> Result<FieldMap> {
        let public_key = decode(request, Field::PublicKey)?;
        let message = request
            .field(Field::Message)
            .filter(|m| !m.is_empty())
            .ok_or(ProtocolError::EmptyMessage)?;

        let bundle = self.seal_for(&public_key, message.as_bytes())?.to_bundle();

        let mut response = FieldMap::new()
            .with(Field::KemCiphertext, bundle.kem_ciphertext)
            .with(Field::SealedMessage, bundle.sealed_message);
        self.echo(request, &mut response, false);
        Ok(response)
    }

    pub fn decrypt(&self, request: &FieldMap) -> Result<FieldMap> {
        let private_key = Zeroizing::new(decode(request, Field::PrivateKey)?);
        let kem_ciphertext = decode(request, Field::KemCiphertext)?;
        let sealed_bytes = decode(request, Field::SealedMessage)?;

        let shared_secret = kem::decapsulate(self.config.kem, &kem_ciphertext, &private_key)?;
        let key = self.config.kdf.derive(shared_secret.as_slice())?;
        let sealed = SealedMessage::from_bytes(&sealed_bytes)?;
        let plaintext = aead::open(self.config.cipher, &key, &sealed).map_err(|e| {
            log::warn!("decrypt: {}", e);
            ProtocolError::from(e)
        })?;
        let text = std::str::from_utf8(&plaintext).map_err(|_| ProtocolError::InvalidPlaintext)?;

        let mut response = FieldMap::new().with(Field::Plaintext, text);
        self.echo(request, &mut response, true);
        Ok(response)
    }

    /// Route on the request's `action` field.
    pub fn dispatch(&self, request: &FieldMap) -> Result<FieldMap> {
        let action: Action = request
            .field(Field::Action)
            .ok_or(ProtocolError::UnknownAction)?
            .parse()?;

        log::debug!("dispatch {}", action);
        let result = match action {
            Action::GenerateKeys => self.generate_keys(),
            Action::Encrypt => self.encrypt(request),
            Action::Decrypt => self.decrypt(request),
        };
        if let Err(err) = &result {
            if err.is_fatal() {
                log::error!("{} failed: {}", action, err.kind());
            } else {
                log::info!("{} rejected: {}", action, err.kind());
            }
        }
        result
    }

    /// Like [`dispatch`](Self::dispatch), but renders errors as `{error, errorKind}`.
    pub fn respond(&self, request: &FieldMap) -> FieldMap {
        self.dispatch(request)
            .unwrap_or_else(|err| error_fields(&err))
    }

    fn echo(&self, request: &FieldMap, response: &mut FieldMap, include_ciphertext: bool) {
        let mut echoed = Vec::with_capacity(3);
        if self.config.echo_public_key {
            echoed.push(Field::PublicKey);
        }
        if self.config.echo_private_key {
            echoed.push(Field::PrivateKey);
        }
        if include_ciphertext && self.config.echo_ciphertext {
            echoed.push(Field::KemCiphertext);
        }
        for field in echoed {
            if let Some(value) = request.field(field) {
                response.set(field, value);
            }
        }
    }
}

/// Render an error for the caller. Contains only the error message and kind.
pub fn error_fields(err: &ProtocolError) -> FieldMap {
    FieldMap::new()
        .with(Field::Error, err.to_string())
        .with(Field::ErrorKind, err.kind().as_str())
}

/// Absent fields decode as empty so the owning component reports the error.
fn decode(request: &FieldMap, field: Field) -> Result<Vec<u8>> {
    let text = request.field(field).unwrap_or_default();
    Ok(encoding::decode_field(field.name(), text)?)
}
