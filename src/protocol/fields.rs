//! Named string fields exchanged with the presentation shell.
//!
//! Responses always use the canonical camelCase names. Requests may also use
//! the snake_case names of the legacy web form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Boundary field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Action,
    PublicKey,
    PrivateKey,
    Message,
    KemCiphertext,
    SealedMessage,
    Plaintext,
    Error,
    ErrorKind,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Action => "action",
            Field::PublicKey => "publicKey",
            Field::PrivateKey => "privateKey",
            Field::Message => "message",
            Field::KemCiphertext => "kemCiphertext",
            Field::SealedMessage => "sealedMessage",
            Field::Plaintext => "plaintext",
            Field::Error => "error",
            Field::ErrorKind => "errorKind",
        }
    }

    fn legacy_name(self) -> Option<&'static str> {
        match self {
            Field::PublicKey => Some("public_key"),
            Field::PrivateKey => Some("private_key"),
            Field::KemCiphertext => Some("ciphertext_kem"),
            Field::SealedMessage => Some("encrypted_message"),
            Field::Plaintext => Some("decrypted_message"),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Free-form set of named string fields.
///
/// Values may hold private keys or plaintext, so they are wiped on drop and
/// left out of `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if let Some(mut previous) = self.0.insert(name.into(), value.into()) {
            previous.zeroize();
        }
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.insert(field.name(), value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Look up a field by canonical name, falling back to its legacy name.
    pub fn field(&self, field: Field) -> Option<&str> {
        self.get(field.name())
            .or_else(|| field.legacy_name().and_then(|legacy| self.get(legacy)))
    }

    pub fn contains(&self, field: Field) -> bool {
        self.field(field).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Drop for FieldMap {
    fn drop(&mut self) {
        for value in self.0.values_mut() {
            value.zeroize();
        }
    }
}

impl fmt::Debug for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
