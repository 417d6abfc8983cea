#![no_main]
use libfuzzer_sys::fuzz_target;
use pqseal::crypto::{generate_keypair_from_seed, KemAlgorithm};
use pqseal::HybridCipher;

fuzz_target!(|data: &[u8]| {
    if data.len() < 32 {
        return;
    }

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&data[..32]);
    let plaintext = &data[32..];

    let cipher = HybridCipher::default();
    let keypair = generate_keypair_from_seed(KemAlgorithm::MlKem768, &seed);

    // Seal then open must round-trip
    let envelope = cipher
        .seal_for(keypair.public_key(), plaintext)
        .expect("Sealing for a valid public key must succeed");
    let opened = cipher
        .open_as(keypair.private_key(), &envelope.kem_ciphertext, &envelope.sealed)
        .expect("Opening a valid envelope must succeed");
    assert_eq!(opened.as_slice(), plaintext, "Round-trip mismatch");

    // Arbitrary public key bytes must not panic
    let _ = cipher.seal_for(plaintext, b"x");
});
