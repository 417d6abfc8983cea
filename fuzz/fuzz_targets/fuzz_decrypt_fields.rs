#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pqseal::{Field, FieldMap, HybridCipher};

#[derive(Debug, Arbitrary)]
struct Request {
    action: String,
    private_key: String,
    kem_ciphertext: String,
    sealed_message: String,
}

fuzz_target!(|input: Request| {
    let request = FieldMap::new()
        .with(Field::Action, input.action)
        .with(Field::PrivateKey, input.private_key)
        .with(Field::KemCiphertext, input.kem_ciphertext)
        .with(Field::SealedMessage, input.sealed_message);

    // Failures carry exactly an error message and kind, never key material
    let response = HybridCipher::default().respond(&request);
    if response.contains(Field::Error) {
        assert!(response.contains(Field::ErrorKind));
        assert_eq!(response.len(), 2);
    }
});
