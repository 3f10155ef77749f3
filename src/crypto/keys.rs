//! Ed25519 signing keys
//!
//! The ledger treats signing as an opaque capability: anything implementing
//! [`Signer`] can take part in a transaction. [`KeyPair`] is the in-process
//! implementation backed by `ed25519-dalek`.

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::{CryptoError, CryptoResult};

/// Size of a public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of a secret seed in bytes
pub const SEED_SIZE: usize = 32;

/// Size of a signature in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// A party's owning key.
///
/// Ordered so that signer sets iterate deterministically.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; PUBLIC_KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: PUBLIC_KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(PublicKey(arr))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Hex form, as shown to operators and written to exports
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the hex form
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s.trim()).map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }

    /// Check `signature` over `message` against this key
    pub fn verify(&self, message: &[u8], signature: &SignatureBytes) -> CryptoResult<()> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        verifying_key
            .verify(message, &Signature::from_bytes(&signature.0))
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }

    /// First eight hex characters, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({}..)", self.short())
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A detached Ed25519 signature
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignatureBytes(pub [u8; SIGNATURE_SIZE]);

impl SignatureBytes {
    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; SIGNATURE_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureLength {
                    expected: SIGNATURE_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(SignatureBytes(arr))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Hex form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the hex form
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::SignatureVerificationFailed)?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..8]))
    }
}

// serde only derives arrays up to 32 elements
impl Serialize for SignatureBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SignatureBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Opaque signing capability.
///
/// Flows only ever see this trait, so a node can sign with a hardware token or
/// a remote signer without the protocol noticing.
pub trait Signer: Send + Sync {
    /// The key signatures from this signer verify against
    fn public_key(&self) -> PublicKey;

    /// Sign `message`
    fn sign(&self, message: &[u8]) -> SignatureBytes;
}

/// An Ed25519 key pair held in memory.
///
/// The seed is wiped when the pair is dropped.
#[derive(ZeroizeOnDrop)]
pub struct KeyPair {
    #[zeroize(skip)]
    public_key: PublicKey,
    seed: [u8; SEED_SIZE],
}

impl KeyPair {
    /// Generate a fresh random key pair
    pub fn generate() -> Self {
        let mut seed = super::random_bytes::<SEED_SIZE>();
        let pair = Self::from_seed(&seed);
        seed.zeroize();
        pair
    }

    /// Deterministic key pair from a 32-byte seed
    pub fn from_seed(seed: &[u8; SEED_SIZE]) -> Self {
        Self::from_signing_key(&SigningKey::from_bytes(seed))
    }

    fn from_signing_key(signing_key: &SigningKey) -> Self {
        KeyPair {
            public_key: PublicKey(signing_key.verifying_key().to_bytes()),
            seed: signing_key.to_bytes(),
        }
    }

    /// The owning key
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Seed followed by public key, for writing a key file.
    ///
    /// Exposes the secret; callers must protect the output.
    pub fn to_bytes(&self) -> [u8; SEED_SIZE + PUBLIC_KEY_SIZE] {
        let mut bytes = [0u8; SEED_SIZE + PUBLIC_KEY_SIZE];
        bytes[..SEED_SIZE].copy_from_slice(&self.seed);
        bytes[SEED_SIZE..].copy_from_slice(&self.public_key.0);
        bytes
    }

    /// Read back what [`KeyPair::to_bytes`] wrote, checking the public half
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != SEED_SIZE + PUBLIC_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: SEED_SIZE + PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }

        let mut seed = [0u8; SEED_SIZE];
        seed.copy_from_slice(&bytes[..SEED_SIZE]);
        let pair = Self::from_seed(&seed);
        seed.zeroize();

        if pair.public_key.0[..] != bytes[SEED_SIZE..] {
            return Err(CryptoError::InvalidSecretKey);
        }
        Ok(pair)
    }
}

impl Signer for KeyPair {
    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    fn sign(&self, message: &[u8]) -> SignatureBytes {
        let signing_key = SigningKey::from_bytes(&self.seed);
        SignatureBytes(signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_pairs_are_deterministic() {
        let a = KeyPair::from_seed(&[7u8; 32]);
        let b = KeyPair::from_seed(&[7u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(a.public_key(), KeyPair::generate().public_key());
    }

    #[test]
    fn test_sign_and_verify() {
        let pair = KeyPair::generate();
        let sig = pair.sign(b"loan approved");

        assert!(pair.public_key().verify(b"loan approved", &sig).is_ok());
        assert_eq!(
            pair.public_key().verify(b"loan rejected", &sig),
            Err(CryptoError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_signature_from_other_key_fails() {
        let pair = KeyPair::generate();
        let other = KeyPair::generate();
        let sig = other.sign(b"payload");
        assert!(pair.public_key().verify(b"payload", &sig).is_err());
    }

    #[test]
    fn test_key_file_roundtrip() {
        let pair = KeyPair::generate();
        let restored = KeyPair::from_bytes(&pair.to_bytes()).unwrap();
        assert_eq!(pair.public_key(), restored.public_key());

        let mut corrupted = pair.to_bytes();
        corrupted[40] ^= 0xFF;
        assert_eq!(
            KeyPair::from_bytes(&corrupted).unwrap_err(),
            CryptoError::InvalidSecretKey
        );
    }

    #[test]
    fn test_public_key_hex_and_serde() {
        let key = KeyPair::generate().public_key();
        assert_eq!(PublicKey::from_hex(&key.to_hex()).unwrap(), key);

        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key.to_hex()));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert_eq!(
            PublicKey::from_bytes(&[0u8; 31]).unwrap_err(),
            CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 31
            }
        );
        assert!(SignatureBytes::from_bytes(&[0u8; 63]).is_err());
    }
}
