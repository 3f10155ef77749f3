//! BLAKE3 content hashing
//!
//! Transaction identifiers are the BLAKE3 digest of a transaction's canonical
//! encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{CryptoError, CryptoResult};

/// Size of a hash output in bytes
pub const HASH_SIZE: usize = 32;

/// A 32-byte BLAKE3 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecureHash(pub [u8; HASH_SIZE]);

impl SecureHash {
    /// Hash arbitrary bytes
    pub fn of(data: &[u8]) -> Self {
        SecureHash(blake3::hash(data).into())
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: HASH_SIZE,
            actual: bytes.len(),
        })?;
        Ok(SecureHash(arr))
    }

    /// Hex form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the hex form
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s.trim()).map_err(|_| CryptoError::InvalidHash)?;
        Self::from_bytes(&bytes)
    }

    /// First twelve hex characters, enough to tell transactions apart in logs
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl std::fmt::Debug for SecureHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureHash({})", self.short())
    }
}

impl std::fmt::Display for SecureHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for SecureHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SecureHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(SecureHash::of(b"tx"), SecureHash::of(b"tx"));
        assert_ne!(SecureHash::of(b"tx-1"), SecureHash::of(b"tx-2"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let h = SecureHash::of(b"content");
        assert_eq!(h.to_hex().len(), 64);
        assert_eq!(SecureHash::from_hex(&h.to_hex()).unwrap(), h);
        assert_eq!(SecureHash::from_hex("zz"), Err(CryptoError::InvalidHash));
    }
}
