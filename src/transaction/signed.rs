//! Signature accumulation over a fixed transaction

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use super::Transaction;
use crate::crypto::{CryptoError, PublicKey, SecureHash, SignatureBytes, Signer};

/// Problems with a transaction's signatures or its serialized form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// The key is neither a required signer nor the transaction's notary
    #[error("{0} is not a required signer of this transaction")]
    UnexpectedSigner(PublicKey),

    /// The key already signed
    #[error("{0} has already signed this transaction")]
    DuplicateSignature(PublicKey),

    /// The signature does not verify over this transaction's id
    #[error("Signature by {0} does not match the transaction content")]
    InvalidSignature(PublicKey),

    /// Required signers that have not signed yet
    #[error("Missing signatures from {} required signer(s)", .0.len())]
    MissingSignatures(Vec<PublicKey>),

    /// Could not encode or decode the transaction
    #[error("Malformed transaction: {0}")]
    Malformed(String),

    /// Underlying key or signature failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// One party's signature over a transaction id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    /// Key that produced the signature
    pub signer: PublicKey,
    /// Ed25519 signature over the transaction id bytes
    pub signature: SignatureBytes,
}

impl TransactionSignature {
    /// Check this signature against `id`
    pub fn verify(&self, id: &SecureHash) -> Result<(), TransactionError> {
        self.signer
            .verify(id.as_bytes(), &self.signature)
            .map_err(|_| TransactionError::InvalidSignature(self.signer))
    }
}

/// A transaction together with the signatures collected so far.
///
/// The transaction content never changes once wrapped; signatures only
/// accumulate. Each signature is checked on entry, so an accepted signature
/// always matches the content held here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The signed content
    pub tx: Transaction,
    /// Signatures in the order they were added
    pub signatures: Vec<TransactionSignature>,
}

impl SignedTransaction {
    /// Wrap a transaction with no signatures
    pub fn new(tx: Transaction) -> Self {
        SignedTransaction {
            tx,
            signatures: Vec::new(),
        }
    }

    /// Id of the wrapped transaction
    pub fn id(&self) -> SecureHash {
        self.tx.id()
    }

    /// Sign with `signer` and keep the signature
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<TransactionSignature, TransactionError> {
        let signature = TransactionSignature {
            signer: signer.public_key(),
            signature: signer.sign(self.id().as_bytes()),
        };
        self.add_signature(signature.clone())?;
        Ok(signature)
    }

    /// Accept a signature produced elsewhere.
    ///
    /// Only required signers and the named notary may sign, each once, and
    /// the signature must verify over this exact content.
    pub fn add_signature(&mut self, signature: TransactionSignature) -> Result<(), TransactionError> {
        self.check_signer(&signature.signer)?;
        if self.signed_by(&signature.signer) {
            return Err(TransactionError::DuplicateSignature(signature.signer));
        }
        signature.verify(&self.id())?;
        self.signatures.push(signature);
        Ok(())
    }

    fn check_signer(&self, key: &PublicKey) -> Result<(), TransactionError> {
        if self.tx.required_signers().contains(key) || self.tx.notary.owning_key == *key {
            Ok(())
        } else {
            Err(TransactionError::UnexpectedSigner(*key))
        }
    }

    /// Whether `key` has signed
    pub fn signed_by(&self, key: &PublicKey) -> bool {
        self.signatures.iter().any(|s| s.signer == *key)
    }

    /// Required signers that have not signed yet
    pub fn missing_signatures(&self) -> BTreeSet<PublicKey> {
        self.tx
            .required_signers()
            .into_iter()
            .filter(|key| !self.signed_by(key))
            .collect()
    }

    /// Every required signer has signed
    pub fn is_fully_signed(&self) -> bool {
        self.missing_signatures().is_empty()
    }

    /// The notary's signature, if present
    pub fn notary_signature(&self) -> Option<&TransactionSignature> {
        self.signatures
            .iter()
            .find(|s| s.signer == self.tx.notary.owning_key)
    }

    /// Fully signed and countersigned by the notary. Terminal.
    pub fn is_notarised(&self) -> bool {
        self.is_fully_signed() && self.notary_signature().is_some()
    }

    /// Re-check every signature held, e.g. after import
    pub fn verify_signatures(&self) -> Result<(), TransactionError> {
        let id = self.id();
        let mut seen = BTreeSet::new();
        for signature in &self.signatures {
            self.check_signer(&signature.signer)?;
            if !seen.insert(signature.signer) {
                return Err(TransactionError::DuplicateSignature(signature.signer));
            }
            signature.verify(&id)?;
        }
        Ok(())
    }

    /// All held signatures are valid and none is missing
    pub fn verify_required_signatures(&self) -> Result<(), TransactionError> {
        self.verify_signatures()?;
        let missing = self.missing_signatures();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TransactionError::MissingSignatures(missing.into_iter().collect()))
        }
    }

    /// Export as JSON for third-party verification
    pub fn export(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Import from JSON. Signatures are not checked here.
    pub fn import(json: &str) -> Result<Self, TransactionError> {
        serde_json::from_str(json).map_err(|e| TransactionError::Malformed(e.to_string()))
    }

    /// Compact form for session messages
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Read back [`SignedTransaction::to_bytes`]. Signatures are not checked here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        serde_json::from_slice(bytes).map_err(|e| TransactionError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{CashInCommand, CommandData};
    use crate::crypto::KeyPair;
    use crate::state::fixtures::*;
    use crate::transaction::TransactionBuilder;

    struct Fixture {
        wallet: KeyPair,
        bank: KeyPair,
        notary: KeyPair,
        stx: SignedTransaction,
    }

    fn fixture() -> Fixture {
        let (wallet, wallet_party) = party(1, "O=Wallet");
        let (bank, bank_party) = party(2, "O=Bank");
        let (notary, notary_party) = party(9, "O=Notary");
        let tx = TransactionBuilder::new(notary_party)
            .add_output_state(cash_in(&wallet_party, &bank_party))
            .add_command(
                CommandData::CashIn(CashInCommand::Send),
                vec![wallet_party.owning_key, bank_party.owning_key],
            )
            .to_transaction();
        Fixture {
            wallet,
            bank,
            notary,
            stx: SignedTransaction::new(tx),
        }
    }

    #[test]
    fn test_signing_progression() {
        let Fixture {
            wallet,
            bank,
            notary,
            mut stx,
        } = fixture();

        assert_eq!(stx.missing_signatures().len(), 2);
        stx.sign(&wallet).unwrap();
        assert!(!stx.is_fully_signed());
        stx.sign(&bank).unwrap();
        assert!(stx.is_fully_signed());
        assert!(!stx.is_notarised());

        stx.sign(&notary).unwrap();
        assert!(stx.is_notarised());
        assert!(stx.verify_required_signatures().is_ok());
    }

    #[test]
    fn test_duplicate_signature_rejected() {
        let Fixture { wallet, mut stx, .. } = fixture();
        stx.sign(&wallet).unwrap();
        assert_eq!(
            stx.sign(&wallet).unwrap_err(),
            TransactionError::DuplicateSignature(wallet.public_key())
        );
    }

    #[test]
    fn test_outsider_cannot_sign() {
        let Fixture { mut stx, .. } = fixture();
        let outsider = KeyPair::from_seed(&[7; 32]);
        assert!(matches!(
            stx.sign(&outsider),
            Err(TransactionError::UnexpectedSigner(_))
        ));
    }

    #[test]
    fn test_signature_over_altered_content_rejected() {
        let Fixture { wallet, mut stx, .. } = fixture();

        let mut altered = stx.clone();
        if let Some(crate::state::State::CashIn(record)) = altered.tx.outputs.first_mut() {
            record.amount = "999999".to_string();
        }
        let forged = altered.sign(&wallet).unwrap();

        assert_eq!(
            stx.add_signature(forged).unwrap_err(),
            TransactionError::InvalidSignature(wallet.public_key())
        );
    }

    #[test]
    fn test_export_import_preserves_signatures() {
        let Fixture {
            wallet, bank, mut stx, ..
        } = fixture();
        stx.sign(&wallet).unwrap();
        stx.sign(&bank).unwrap();

        let restored = SignedTransaction::import(&stx.export()).unwrap();
        assert_eq!(restored, stx);
        assert_eq!(restored.id(), stx.id());
        assert!(restored.verify_required_signatures().is_ok());

        let from_bytes = SignedTransaction::from_bytes(&stx.to_bytes()).unwrap();
        assert_eq!(from_bytes, stx);
    }

    #[test]
    fn test_tampered_import_fails_verification() {
        let Fixture { wallet, mut stx, .. } = fixture();
        stx.sign(&wallet).unwrap();

        let mut tampered = stx.clone();
        tampered.tx.notary.name = "O=Other Notary".to_string();
        assert!(matches!(
            tampered.verify_signatures(),
            Err(TransactionError::InvalidSignature(_))
        ));
        assert!(matches!(
            stx.verify_required_signatures(),
            Err(TransactionError::MissingSignatures(keys)) if keys.len() == 1
        ));
    }
}
