use serde::{Deserialize, Serialize};

use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::fields::{Field, FieldMap};

/// The encrypt-side artifacts that must travel together to the recipient.
///
/// Both values are base64 text. The recipient supplies its own private key
/// at decrypt time; it is never part of the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationBundle {
    pub kem_ciphertext: String,
    pub sealed_message: String,
}

impl OperationBundle {
    /// Extract the bundle from an encrypt response or a decrypt request.
    pub fn from_fields(fields: &FieldMap) -> Result<Self> {
        let kem_ciphertext = fields
            .field(Field::KemCiphertext)
            .ok_or(ProtocolError::InvalidCiphertext)?;
        let sealed_message = fields
            .field(Field::SealedMessage)
            .ok_or(ProtocolError::AuthenticationFailed)?;
        Ok(Self {
            kem_ciphertext: kem_ciphertext.to_string(),
            sealed_message: sealed_message.to_string(),
        })
    }

    /// Build decrypt request fields for the holder of `private_key`.
    pub fn to_decrypt_request(&self, private_key: &str) -> FieldMap {
        FieldMap::new()
            .with(Field::Action, "decrypt")
            .with(Field::PrivateKey, private_key)
            .with(Field::KemCiphertext, self.kem_ciphertext.as_str())
            .with(Field::SealedMessage, self.sealed_message.as_str())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OperationBundle {
        OperationBundle {
            kem_ciphertext: "Y3Q=".into(),
            sealed_message: "c20=".into(),
        }
    }

    #[test]
    fn test_json_shape() {
        assert_eq!(
            sample().to_json().unwrap(),
            r#"{"kemCiphertext":"Y3Q=","sealedMessage":"c20="}"#
        );
        assert_eq!(OperationBundle::from_json(&sample().to_json().unwrap()).unwrap(), sample());
    }

    #[test]
    fn test_rejects_extra_fields() {
        assert!(OperationBundle::from_json(
            r#"{"kemCiphertext":"a","sealedMessage":"b","sharedSecret":"c"}"#
        )
        .is_err());
    }

    #[test]
    fn test_from_fields_accepts_legacy_names() {
        let fields: FieldMap = [("ciphertext_kem", "Y3Q="), ("encrypted_message", "c20=")]
            .into_iter()
            .collect();
        assert_eq!(OperationBundle::from_fields(&fields).unwrap(), sample());
    }

    #[test]
    fn test_from_fields_missing_parts() {
        let only_sealed = FieldMap::new().with(Field::SealedMessage, "c20=");
        assert_eq!(
            OperationBundle::from_fields(&only_sealed).unwrap_err(),
            ProtocolError::InvalidCiphertext
        );
        let only_ct = FieldMap::new().with(Field::KemCiphertext, "Y3Q=");
        assert_eq!(
            OperationBundle::from_fields(&only_ct).unwrap_err(),
            ProtocolError::AuthenticationFailed
        );
    }

    #[test]
    fn test_decrypt_request() {
        let request = sample().to_decrypt_request("c2s=");
        assert_eq!(request.field(Field::Action), Some("decrypt"));
        assert_eq!(request.field(Field::PrivateKey), Some("c2s="));
        assert_eq!(request.field(Field::KemCiphertext), Some("Y3Q="));
        assert_eq!(request.field(Field::SealedMessage), Some("c20="));
    }
}
