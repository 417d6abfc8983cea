#![no_main]
use libfuzzer_sys::fuzz_target;
use pqseal::crypto::{open, CipherSuite, SealedMessage, SymmetricKey};

fuzz_target!(|data: &[u8]| {
    if data.len() < 32 {
        return;
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&data[..32]);
    let key = SymmetricKey::from_bytes(key);

    // Arbitrary tokens must be rejected without panicking
    if let Ok(sealed) = SealedMessage::from_bytes(&data[32..]) {
        assert_eq!(sealed.to_bytes(), &data[32..]);
        for suite in [CipherSuite::Aes256Gcm, CipherSuite::ChaCha20Poly1305] {
            assert!(open(suite, &key, &sealed).is_err(), "Forged token accepted");
        }
    }
});
