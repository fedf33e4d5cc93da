pub mod shared;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A secret string that can be serialized and deserialized.
///
/// Wraps [`SecretString`] so that secrets can travel through serde-based
/// configuration while staying redacted in debug output. The secret value is
/// only reachable through [`ExposeSecret::expose_secret`].
#[derive(Debug, Clone)]
pub struct SerializableSecretString(SecretString);

impl SerializableSecretString {
    pub fn new(secret: String) -> Self {
        Self(SecretString::new(secret))
    }
}

impl From<String> for SerializableSecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<SecretString> for SerializableSecretString {
    fn from(value: SecretString) -> Self {
        Self(value)
    }
}

impl ExposeSecret<String> for SerializableSecretString {
    fn expose_secret(&self) -> &String {
        self.0.expose_secret()
    }
}

impl Serialize for SerializableSecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.expose_secret())
    }
}

impl<'de> Deserialize<'de> for SerializableSecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;

        Ok(Self(SecretString::new(value)))
    }
}
