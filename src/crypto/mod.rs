pub mod aead;
pub mod kdf;
pub mod kem;

pub use aead::{open, seal, CipherError, CipherSuite, SealedMessage, NONCE_BYTES, TAG_BYTES};
pub use kdf::{derive_key, KdfError, KeyDerivation, SymmetricKey, SYMMETRIC_KEY_BYTES};
pub use kem::{
    decapsulate, encapsulate, generate_keypair, generate_keypair_from_seed, EncapsulatedSecret,
    KemAlgorithm, KemError, KemKeyPair, SharedSecret, SHARED_SECRET_BYTES,
};
