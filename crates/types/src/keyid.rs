//! OpenPGP key ids

use pkgsig_errors::{Error, SigningError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The 64-bit id of an OpenPGP key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId([u8; 8]);

impl KeyId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Build from the trailing eight bytes of a fingerprint or modulus
    ///
    /// Returns `None` if fewer than eight bytes are given.
    #[must_use]
    pub fn from_tail(bytes: &[u8]) -> Option<Self> {
        let start = bytes.len().checked_sub(8)?;
        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes[start..]);
        Some(Self(id))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Lowercase hex of the full 64-bit id
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Lowercase hex of the low 32 bits, as printed in signature messages
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[4..])
    }

    /// Parse a 16 hex digit key id
    ///
    /// # Errors
    /// Returns an error if the input is not exactly 16 hex digits.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| {
            SigningError::InvalidPublicKey(format!("invalid key id {s}: {e}"))
        })?;
        let id: [u8; 8] = bytes.try_into().map_err(|_| {
            SigningError::InvalidPublicKey(format!("key id must be 8 bytes: {s}"))
        })?;
        Ok(Self(id))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for KeyId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for KeyId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tail() {
        let fpr: Vec<u8> = (0u8..20).collect();
        let id = KeyId::from_tail(&fpr).unwrap();
        assert_eq!(id.to_hex(), "0c0d0e0f10111213");
        assert_eq!(id.short(), "10111213");
        assert!(KeyId::from_tail(&[1, 2, 3]).is_none());
    }

    #[test]
    fn test_hex_parse() {
        let id = KeyId::from_hex("0c0d0e0f10111213").unwrap();
        assert_eq!(id.to_string(), "0c0d0e0f10111213");
        assert!(KeyId::from_hex("1234").is_err());
        assert!(KeyId::from_hex("zz0d0e0f10111213").is_err());
    }

    #[test]
    fn test_serde() {
        let id = KeyId::from_bytes([0xde, 0xad, 0xbe, 0xef, 0, 1, 2, 3]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"deadbeef00010203\"");
        let back: KeyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
