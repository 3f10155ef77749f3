//! Cryptographic error types

use thiserror::Error;

/// Errors from key handling and signature checks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A key or digest had the wrong number of bytes
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// A signature had the wrong number of bytes
    #[error("Invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// The signature does not verify against the key and message
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// The bytes are not a valid Ed25519 public key
    #[error("Invalid public key format")]
    InvalidPublicKey,

    /// The seed does not match the stored public key
    #[error("Invalid secret key format")]
    InvalidSecretKey,

    /// The text is not a hex-encoded digest
    #[error("Invalid hash encoding")]
    InvalidHash,
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;
