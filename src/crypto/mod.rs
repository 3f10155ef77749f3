//! Cryptographic building blocks for the ledger
//!
//! - `keys`: Ed25519 key pairs and the [`Signer`] capability
//! - `hash`: BLAKE3 digests used as transaction identifiers

pub mod error;
pub mod hash;
pub mod keys;

pub use error::{CryptoError, CryptoResult};
pub use hash::SecureHash;
pub use keys::{KeyPair, PublicKey, SignatureBytes, Signer};

/// Generate cryptographically secure random bytes
pub fn random_bytes<const N: usize>() -> [u8; N] {
    use rand::RngCore;
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_sign_digest_flow() {
        // A party signs the digest of some content; a third party re-derives
        // the digest and checks the signature.
        let bank = KeyPair::from_seed(&random_bytes::<32>());
        let digest = SecureHash::of(b"cash-in 500 to wallet 0091");
        let signature = bank.sign(digest.as_bytes());

        let recomputed = SecureHash::of(b"cash-in 500 to wallet 0091");
        assert!(bank
            .public_key()
            .verify(recomputed.as_bytes(), &signature)
            .is_ok());

        let tampered = SecureHash::of(b"cash-in 900 to wallet 0091");
        assert!(bank
            .public_key()
            .verify(tampered.as_bytes(), &signature)
            .is_err());
    }
}
