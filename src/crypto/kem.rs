/// Post-Quantum Key Encapsulation: ML-KEM (NIST FIPS 203)
///
/// Wraps the RustCrypto `ml-kem` crate behind a byte-oriented API so that keys
/// and ciphertexts can cross a text boundary after encoding.
///
/// Sizes per parameter set (bytes):
///
/// | Set         | Public key | Private key | Ciphertext | Shared secret |
/// |-------------|-----------:|------------:|-----------:|--------------:|
/// | ML-KEM-512  |        800 |        1632 |        768 |            32 |
/// | ML-KEM-768  |       1184 |        2400 |       1088 |            32 |
/// | ML-KEM-1024 |       1568 |        3168 |       1568 |            32 |
///
/// Decapsulation with a mismatched (ciphertext, private key) pair does NOT
/// return an error: ML-KEM's implicit rejection yields a pseudorandom secret
/// and the mismatch surfaces later as an AEAD authentication failure.
use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// ML-KEM shared secret size in bytes (all parameter sets)
pub const SHARED_SECRET_BYTES: usize = 32;

/// Size of the seed accepted by [`generate_keypair_from_seed`]
pub const KEYPAIR_SEED_BYTES: usize = 32;

/// ML-KEM modulus q
const ML_KEM_Q: u16 = 3329;

/// Bytes of one 12-bit-encoded polynomial (256 coefficients)
const ENCODED_POLY_BYTES: usize = 384;

/// A KEM shared secret; wiped from memory when dropped.
pub type SharedSecret = Zeroizing<[u8; SHARED_SECRET_BYTES]>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KemError {
    #[error("Invalid public key for {algorithm} (expected {expected} bytes, got {actual})")]
    InvalidPublicKey {
        algorithm: KemAlgorithm,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid private key for {algorithm}")]
    InvalidPrivateKey { algorithm: KemAlgorithm },
    #[error("Invalid KEM ciphertext for {algorithm} (expected {expected} bytes, got {actual})")]
    InvalidCiphertext {
        algorithm: KemAlgorithm,
        expected: usize,
        actual: usize,
    },
    #[error("Secure randomness unavailable")]
    EntropyUnavailable,
}

pub type Result<T> = std::result::Result<T, KemError>;

/// ML-KEM parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KemAlgorithm {
    #[serde(rename = "ML-KEM-512")]
    MlKem512,
    #[serde(rename = "ML-KEM-768")]
    #[default]
    MlKem768,
    #[serde(rename = "ML-KEM-1024")]
    MlKem1024,
}

impl KemAlgorithm {
    pub const ALL: [KemAlgorithm; 3] = [
        KemAlgorithm::MlKem512,
        KemAlgorithm::MlKem768,
        KemAlgorithm::MlKem1024,
    ];

    /// Module rank k
    fn rank(self) -> usize {
        match self {
            KemAlgorithm::MlKem512 => 2,
            KemAlgorithm::MlKem768 => 3,
            KemAlgorithm::MlKem1024 => 4,
        }
    }

    /// Encapsulation (public) key size in bytes
    pub fn public_key_len(self) -> usize {
        ENCODED_POLY_BYTES * self.rank() + 32
    }

    /// Decapsulation (private) key size in bytes
    pub fn private_key_len(self) -> usize {
        ENCODED_POLY_BYTES * self.rank() * 2 + 96
    }

    /// KEM ciphertext size in bytes
    pub fn ciphertext_len(self) -> usize {
        match self {
            KemAlgorithm::MlKem512 => 768,
            KemAlgorithm::MlKem768 => 1088,
            KemAlgorithm::MlKem1024 => 1568,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KemAlgorithm::MlKem512 => "ML-KEM-512",
            KemAlgorithm::MlKem768 => "ML-KEM-768",
            KemAlgorithm::MlKem1024 => "ML-KEM-1024",
        }
    }
}

impl fmt::Display for KemAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KemAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().replace('_', "-").as_str() {
            "ML-KEM-512" | "KYBER512" => Ok(KemAlgorithm::MlKem512),
            "ML-KEM-768" | "KYBER768" => Ok(KemAlgorithm::MlKem768),
            "ML-KEM-1024" | "KYBER1024" => Ok(KemAlgorithm::MlKem1024),
            _ => Err(format!("unknown KEM parameter set: {}", s)),
        }
    }
}

/// ML-KEM keypair. The private key is zeroized on drop.
#[derive(Clone)]
pub struct KemKeyPair {
    algorithm: KemAlgorithm,
    public_key: Vec<u8>,
    private_key: Vec<u8>,
}

impl KemKeyPair {
    pub fn algorithm(&self) -> KemAlgorithm {
        self.algorithm
    }

    /// Encapsulation key; safe to publish
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Decapsulation key; never log or transmit in the clear
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }
}

impl Drop for KemKeyPair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl fmt::Debug for KemKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KemKeyPair")
            .field("algorithm", &self.algorithm)
            .field("public_key_len", &self.public_key.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Result of encapsulating against a public key.
///
/// `kem_ciphertext` goes to the keypair owner; `shared_secret` stays local.
pub struct EncapsulatedSecret {
    pub kem_ciphertext: Vec<u8>,
    pub shared_secret: SharedSecret,
}

impl fmt::Debug for EncapsulatedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncapsulatedSecret")
            .field("kem_ciphertext_len", &self.kem_ciphertext.len())
            .field("shared_secret", &"<redacted>")
            .finish()
    }
}

fn shared_secret_from(bytes: &[u8]) -> SharedSecret {
    let mut secret = Zeroizing::new([0u8; SHARED_SECRET_BYTES]);
    secret.copy_from_slice(bytes);
    secret
}

// One backend module per parameter set; the ml-kem types are distinct per set.
macro_rules! ml_kem_backend {
    ($name:ident, $kem:ty, $params:ty) => {
        mod $name {
            use ml_kem::kem::{Decapsulate, DecapsulationKey, Encapsulate, EncapsulationKey};
            use ml_kem::{Encoded, EncodedSizeUser, KemCore};
            use rand_chacha::ChaCha20Rng;

            use super::{shared_secret_from, SharedSecret};

            pub(super) fn keypair(rng: &mut ChaCha20Rng) -> (Vec<u8>, Vec<u8>) {
                let (dk, ek) = <$kem>::generate(rng);
                (ek.as_bytes().to_vec(), dk.as_bytes().to_vec())
            }

            pub(super) fn encapsulate(
                public_key: &[u8],
                rng: &mut ChaCha20Rng,
            ) -> Option<(Vec<u8>, SharedSecret)> {
                let ek_encoded = Encoded::<EncapsulationKey<$params>>::try_from(public_key).ok()?;
                let ek = EncapsulationKey::<$params>::from_bytes(&ek_encoded);
                let (ct, ss) = ek.encapsulate(rng).ok()?;
                Some((ct.iter().copied().collect(), shared_secret_from(ss.as_ref())))
            }

            pub(super) fn decapsulate(kem_ciphertext: &[u8], private_key: &[u8]) -> Option<SharedSecret> {
                let dk_encoded = Encoded::<DecapsulationKey<$params>>::try_from(private_key).ok()?;
                let dk = DecapsulationKey::<$params>::from_bytes(&dk_encoded);
                let ct = ml_kem::Ciphertext::<$kem>::try_from(kem_ciphertext).ok()?;
                let ss = dk.decapsulate(&ct).ok()?;
                Some(shared_secret_from(ss.as_ref()))
            }
        }
    };
}

ml_kem_backend!(backend_512, ml_kem::MlKem512, ml_kem::MlKem512Params);
ml_kem_backend!(backend_768, ml_kem::MlKem768, ml_kem::MlKem768Params);
ml_kem_backend!(backend_1024, ml_kem::MlKem1024, ml_kem::MlKem1024Params);

/// Fresh per-call RNG seeded from the OS; no RNG state outlives the call.
fn fresh_rng() -> Result<ChaCha20Rng> {
    let mut seed = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut seed)
        .map_err(|_| KemError::EntropyUnavailable)?;
    let rng = ChaCha20Rng::from_seed(seed);
    seed.zeroize();
    Ok(rng)
}

/// Generate a keypair with fresh OS randomness
pub fn generate_keypair(algorithm: KemAlgorithm) -> Result<KemKeyPair> {
    let mut rng = fresh_rng()?;
    Ok(keypair_from_rng(algorithm, &mut rng))
}

/// Generate a keypair from a 32-byte seed (deterministic)
pub fn generate_keypair_from_seed(
    algorithm: KemAlgorithm,
    seed: &[u8; KEYPAIR_SEED_BYTES],
) -> KemKeyPair {
    let mut rng = ChaCha20Rng::from_seed(*seed);
    keypair_from_rng(algorithm, &mut rng)
}

fn keypair_from_rng(algorithm: KemAlgorithm, rng: &mut ChaCha20Rng) -> KemKeyPair {
    let (public_key, private_key) = match algorithm {
        KemAlgorithm::MlKem512 => backend_512::keypair(rng),
        KemAlgorithm::MlKem768 => backend_768::keypair(rng),
        KemAlgorithm::MlKem1024 => backend_1024::keypair(rng),
    };
    log::debug!(
        "{}: generated keypair (public {} bytes)",
        algorithm,
        public_key.len()
    );
    KemKeyPair {
        algorithm,
        public_key,
        private_key,
    }
}

/// Encapsulate a fresh shared secret under `public_key`.
///
/// Not a pure function: every call draws new randomness, so repeated calls
/// with the same key yield different ciphertexts and secrets.
pub fn encapsulate(algorithm: KemAlgorithm, public_key: &[u8]) -> Result<EncapsulatedSecret> {
    let invalid = || KemError::InvalidPublicKey {
        algorithm,
        expected: algorithm.public_key_len(),
        actual: public_key.len(),
    };

    if public_key.len() != algorithm.public_key_len() {
        return Err(invalid());
    }
    // FIPS 203 §7.2 modulus check: every encoded coefficient of t̂ must be < q
    let t_hat_len = ENCODED_POLY_BYTES * algorithm.rank();
    if !coefficients_reduced(&public_key[..t_hat_len]) {
        return Err(invalid());
    }

    let mut rng = fresh_rng()?;
    let encapsulated = match algorithm {
        KemAlgorithm::MlKem512 => backend_512::encapsulate(public_key, &mut rng),
        KemAlgorithm::MlKem768 => backend_768::encapsulate(public_key, &mut rng),
        KemAlgorithm::MlKem1024 => backend_1024::encapsulate(public_key, &mut rng),
    };
    let (kem_ciphertext, shared_secret) = encapsulated.ok_or_else(invalid)?;

    log::debug!(
        "{}: encapsulated (ciphertext {} bytes)",
        algorithm,
        kem_ciphertext.len()
    );
    Ok(EncapsulatedSecret {
        kem_ciphertext,
        shared_secret,
    })
}

/// Recover the shared secret from `kem_ciphertext` with `private_key`.
///
/// Malformed inputs (wrong length, inconsistent private key) are errors. A
/// well-formed ciphertext produced for a different keypair is not: it yields
/// an unrelated pseudorandom secret (implicit rejection).
pub fn decapsulate(
    algorithm: KemAlgorithm,
    kem_ciphertext: &[u8],
    private_key: &[u8],
) -> Result<SharedSecret> {
    if private_key.len() != algorithm.private_key_len()
        || !private_key_consistent(algorithm, private_key)
    {
        return Err(KemError::InvalidPrivateKey { algorithm });
    }
    let invalid_ciphertext = || KemError::InvalidCiphertext {
        algorithm,
        expected: algorithm.ciphertext_len(),
        actual: kem_ciphertext.len(),
    };
    if kem_ciphertext.len() != algorithm.ciphertext_len() {
        return Err(invalid_ciphertext());
    }

    let secret = match algorithm {
        KemAlgorithm::MlKem512 => backend_512::decapsulate(kem_ciphertext, private_key),
        KemAlgorithm::MlKem768 => backend_768::decapsulate(kem_ciphertext, private_key),
        KemAlgorithm::MlKem1024 => backend_1024::decapsulate(kem_ciphertext, private_key),
    };
    secret.ok_or_else(invalid_ciphertext)
}

/// Check that every 12-bit coefficient in a ByteEncode12 string is < q
fn coefficients_reduced(encoded: &[u8]) -> bool {
    encoded.chunks_exact(3).all(|c| {
        let a = u16::from(c[0]) | (u16::from(c[1] & 0x0f) << 8);
        let b = u16::from(c[1] >> 4) | (u16::from(c[2]) << 4);
        a < ML_KEM_Q && b < ML_KEM_Q
    })
}

/// FIPS 203 decapsulation key layout: dk_pke ‖ ek ‖ H(ek) ‖ z.
/// The embedded hash must match SHA3-256 of the embedded public key.
fn private_key_consistent(algorithm: KemAlgorithm, private_key: &[u8]) -> bool {
    let ek_start = ENCODED_POLY_BYTES * algorithm.rank();
    let ek_end = ek_start + algorithm.public_key_len();
    let (Some(ek), Some(stored_hash)) = (
        private_key.get(ek_start..ek_end),
        private_key.get(ek_end..ek_end + 32),
    ) else {
        return false;
    };
    let computed = Sha3_256::digest(ek);
    computed.as_slice().ct_eq(stored_hash).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_table() {
        assert_eq!(KemAlgorithm::MlKem512.public_key_len(), 800);
        assert_eq!(KemAlgorithm::MlKem512.private_key_len(), 1632);
        assert_eq!(KemAlgorithm::MlKem768.public_key_len(), 1184);
        assert_eq!(KemAlgorithm::MlKem768.private_key_len(), 2400);
        assert_eq!(KemAlgorithm::MlKem1024.public_key_len(), 1568);
        assert_eq!(KemAlgorithm::MlKem1024.private_key_len(), 3168);
    }

    #[test]
    fn test_keypair_sizes_all_sets() {
        for algorithm in KemAlgorithm::ALL {
            let kp = generate_keypair(algorithm).unwrap();
            assert_eq!(kp.public_key().len(), algorithm.public_key_len());
            assert_eq!(kp.private_key().len(), algorithm.private_key_len());
        }
    }

    #[test]
    fn test_keypair_from_seed_deterministic() {
        let seed = [42u8; 32];
        let kp1 = generate_keypair_from_seed(KemAlgorithm::MlKem768, &seed);
        let kp2 = generate_keypair_from_seed(KemAlgorithm::MlKem768, &seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.private_key(), kp2.private_key());

        let kp3 = generate_keypair_from_seed(KemAlgorithm::MlKem768, &[7u8; 32]);
        assert_ne!(kp1.public_key(), kp3.public_key());
    }

    #[test]
    fn test_keypair_random_independent() {
        let kp1 = generate_keypair(KemAlgorithm::MlKem768).unwrap();
        let kp2 = generate_keypair(KemAlgorithm::MlKem768).unwrap();
        assert_ne!(kp1.public_key(), kp2.public_key());
        assert_ne!(kp1.private_key(), kp2.private_key());
    }

    #[test]
    fn test_private_key_embeds_public_key() {
        let kp = generate_keypair(KemAlgorithm::MlKem768).unwrap();
        assert_eq!(&kp.private_key()[1152..2336], kp.public_key());
    }

    #[test]
    fn test_encapsulate_decapsulate_all_sets() {
        for algorithm in KemAlgorithm::ALL {
            let kp = generate_keypair(algorithm).unwrap();
            let enc = encapsulate(algorithm, kp.public_key()).unwrap();
            assert_eq!(enc.kem_ciphertext.len(), algorithm.ciphertext_len());

            let recovered = decapsulate(algorithm, &enc.kem_ciphertext, kp.private_key()).unwrap();
            assert_eq!(*enc.shared_secret, *recovered);
        }
    }

    #[test]
    fn test_encapsulate_is_randomized() {
        let kp = generate_keypair(KemAlgorithm::MlKem768).unwrap();
        let a = encapsulate(KemAlgorithm::MlKem768, kp.public_key()).unwrap();
        let b = encapsulate(KemAlgorithm::MlKem768, kp.public_key()).unwrap();
        assert_ne!(a.kem_ciphertext, b.kem_ciphertext);
        assert_ne!(*a.shared_secret, *b.shared_secret);
    }

    #[test]
    fn test_wrong_private_key_implicit_rejection() {
        let kp1 = generate_keypair(KemAlgorithm::MlKem768).unwrap();
        let kp2 = generate_keypair(KemAlgorithm::MlKem768).unwrap();
        let enc = encapsulate(KemAlgorithm::MlKem768, kp1.public_key()).unwrap();

        // No error, just an unrelated secret
        let wrong = decapsulate(KemAlgorithm::MlKem768, &enc.kem_ciphertext, kp2.private_key()).unwrap();
        assert_ne!(*enc.shared_secret, *wrong);

        // And deterministic for the same inputs
        let again = decapsulate(KemAlgorithm::MlKem768, &enc.kem_ciphertext, kp2.private_key()).unwrap();
        assert_eq!(*wrong, *again);
    }

    #[test]
    fn test_invalid_public_key_length() {
        let err = encapsulate(KemAlgorithm::MlKem768, &[0u8; 32]).unwrap_err();
        assert!(matches!(
            err,
            KemError::InvalidPublicKey { expected: 1184, actual: 32, .. }
        ));
    }

    #[test]
    fn test_public_key_for_other_set_rejected() {
        let kp = generate_keypair(KemAlgorithm::MlKem512).unwrap();
        assert!(matches!(
            encapsulate(KemAlgorithm::MlKem768, kp.public_key()),
            Err(KemError::InvalidPublicKey { .. })
        ));
    }

    #[test]
    fn test_unreduced_public_key_rejected() {
        // 0xFFF > q in every coefficient slot
        let pk = vec![0xFFu8; KemAlgorithm::MlKem768.public_key_len()];
        assert!(matches!(
            encapsulate(KemAlgorithm::MlKem768, &pk),
            Err(KemError::InvalidPublicKey { .. })
        ));
    }

    #[test]
    fn test_invalid_private_key() {
        let kp = generate_keypair(KemAlgorithm::MlKem768).unwrap();
        let enc = encapsulate(KemAlgorithm::MlKem768, kp.public_key()).unwrap();

        let short = &kp.private_key()[..100];
        assert_eq!(
            decapsulate(KemAlgorithm::MlKem768, &enc.kem_ciphertext, short).unwrap_err(),
            KemError::InvalidPrivateKey { algorithm: KemAlgorithm::MlKem768 }
        );

        // Corrupt the embedded H(ek)
        let mut corrupted = kp.private_key().to_vec();
        corrupted[2336] ^= 0x01;
        assert_eq!(
            decapsulate(KemAlgorithm::MlKem768, &enc.kem_ciphertext, &corrupted).unwrap_err(),
            KemError::InvalidPrivateKey { algorithm: KemAlgorithm::MlKem768 }
        );
    }

    #[test]
    fn test_invalid_ciphertext_length() {
        let kp = generate_keypair(KemAlgorithm::MlKem768).unwrap();
        let err = decapsulate(KemAlgorithm::MlKem768, &[0u8; 10], kp.private_key()).unwrap_err();
        assert!(matches!(
            err,
            KemError::InvalidCiphertext { expected: 1088, actual: 10, .. }
        ));
    }

    #[test]
    fn test_algorithm_names_roundtrip() {
        for algorithm in KemAlgorithm::ALL {
            assert_eq!(algorithm.as_str().parse::<KemAlgorithm>().unwrap(), algorithm);
        }
        assert_eq!("kyber768".parse::<KemAlgorithm>().unwrap(), KemAlgorithm::MlKem768);
        assert!("ML-KEM-2048".parse::<KemAlgorithm>().is_err());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let kp = generate_keypair(KemAlgorithm::MlKem512).unwrap();
        let shown = format!("{:?}", kp);
        assert!(shown.contains("<redacted>"));
        assert!(!shown.contains(&format!("{:?}", &kp.private_key()[..4])));
    }
}
