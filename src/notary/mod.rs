//! Notary: the single ordering authority
//!
//! The notary keeps one map from consumed record version to the transaction
//! that consumed it. A transaction is accepted iff none of its inputs has been
//! consumed by a *different* transaction; acceptance marks every input and
//! signs the transaction id. The check and the marking happen under one lock,
//! so two transactions racing for the same input can never both win.
//!
//! The notary does not run contract rules. It only checks that the
//! transaction names it and carries every required signature.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

use crate::crypto::{SecureHash, Signer};
use crate::identity::Party;
use crate::state::StateRef;
use crate::transaction::{SignedTransaction, TransactionError, TransactionSignature};

/// Reasons a notary refuses to sign
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotaryError {
    /// An input was already consumed by another transaction
    #[error("Input {state_ref} was already consumed by transaction {consumed_by}")]
    Conflict {
        /// The contested record version
        state_ref: StateRef,
        /// Transaction that consumed it first
        consumed_by: SecureHash,
    },

    /// The notary could not be reached or is not accepting requests
    #[error("Notary unavailable: {0}")]
    Unavailable(String),

    /// The transaction names a different notary
    #[error("Transaction is assigned to notary {0}")]
    WrongNotary(String),

    /// Signatures are missing or invalid
    #[error("Notarisation refused: {0}")]
    Transaction(#[from] TransactionError),
}

/// Something that can obtain a notary signature
#[async_trait]
pub trait NotaryClient: Send + Sync {
    /// Identity of the notary behind this client
    fn party(&self) -> Party;

    /// Ask for a signature over a fully signed transaction
    async fn notarise(&self, stx: &SignedTransaction) -> Result<TransactionSignature, NotaryError>;
}

/// In-process notary holding the consumed-input map
pub struct NotaryService {
    party: Party,
    signer: Arc<dyn Signer>,
    consumed: Mutex<HashMap<StateRef, SecureHash>>,
    available: AtomicBool,
}

impl NotaryService {
    /// Notary signing as `party` with `signer`
    pub fn new(party: Party, signer: Arc<dyn Signer>) -> Self {
        NotaryService {
            party,
            signer,
            consumed: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Stop or resume accepting requests. Refused requests leave no trace.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Transaction that consumed `state_ref`, if any
    pub fn consumed_by(&self, state_ref: &StateRef) -> Option<SecureHash> {
        self.consumed
            .lock()
            .ok()
            .and_then(|consumed| consumed.get(state_ref).copied())
    }

    /// Accept or refuse `stx` and, on acceptance, sign it
    pub fn process(&self, stx: &SignedTransaction) -> Result<TransactionSignature, NotaryError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(NotaryError::Unavailable(format!(
                "{} is not accepting requests",
                self.party
            )));
        }
        if stx.tx.notary != self.party {
            return Err(NotaryError::WrongNotary(stx.tx.notary.name.clone()));
        }
        stx.verify_required_signatures()?;

        let tx_id = stx.id();
        {
            let mut consumed = self
                .consumed
                .lock()
                .map_err(|_| NotaryError::Unavailable("notary state lock poisoned".to_string()))?;

            let conflict = stx.tx.inputs.iter().find_map(|input| {
                consumed
                    .get(&input.reference)
                    .filter(|by| **by != tx_id)
                    .map(|by| (input.reference, *by))
            });
            if let Some((state_ref, consumed_by)) = conflict {
                warn!(
                    tx_id = %tx_id.short(),
                    %state_ref,
                    consumed_by = %consumed_by.short(),
                    "double spend refused"
                );
                return Err(NotaryError::Conflict {
                    state_ref,
                    consumed_by,
                });
            }

            for input in &stx.tx.inputs {
                consumed.insert(input.reference, tx_id);
            }
        }

        info!(tx_id = %tx_id.short(), inputs = stx.tx.inputs.len(), "notarised");
        Ok(TransactionSignature {
            signer: self.signer.public_key(),
            signature: self.signer.sign(tx_id.as_bytes()),
        })
    }
}

#[async_trait]
impl NotaryClient for NotaryService {
    fn party(&self) -> Party {
        self.party.clone()
    }

    async fn notarise(&self, stx: &SignedTransaction) -> Result<TransactionSignature, NotaryError> {
        self.process(stx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{CommandData, LoanCommand};
    use crate::crypto::KeyPair;
    use crate::state::fixtures::*;
    use crate::state::{LoanDecision, LoanState, StateAndRef};
    use crate::transaction::TransactionBuilder;

    struct Net {
        wallet: KeyPair,
        bank: KeyPair,
        wallet_party: Party,
        bank_party: Party,
        notary_party: Party,
        notary: NotaryService,
    }

    fn net() -> Net {
        let (wallet, wallet_party) = party(1, "O=Wallet");
        let (bank, bank_party) = party(2, "O=Bank");
        let (notary_keys, notary_party) = party(9, "O=Notary");
        Net {
            wallet,
            bank,
            wallet_party,
            bank_party,
            notary: NotaryService::new(notary_party.clone(), Arc::new(notary_keys)),
            notary_party,
        }
    }

    fn decide(net: &Net, pending: &StateAndRef, remarks: &str) -> SignedTransaction {
        let loan: &LoanState = pending.state.as_loan().unwrap();
        let mut stx = TransactionBuilder::new(net.notary_party.clone())
            .add_input_state(pending.clone())
            .add_output_state(loan.decide(
                LoanDecision {
                    approve: true,
                    remarks: remarks.to_string(),
                    credit_score: None,
                },
                10,
            ))
            .add_command(
                CommandData::Loan(LoanCommand::Approve),
                vec![net.wallet_party.owning_key, net.bank_party.owning_key],
            )
            .sign_initial(&net.wallet)
            .unwrap();
        stx.sign(&net.bank).unwrap();
        stx
    }

    fn pending(net: &Net) -> StateAndRef {
        StateAndRef {
            state: pending_loan(&net.wallet_party, &net.bank_party).into(),
            reference: StateRef::new(SecureHash::of(b"request"), 0),
        }
    }

    #[test]
    fn test_conflicting_spend_refused() {
        let net = net();
        let input = pending(&net);
        let first = decide(&net, &input, "first");
        let second = decide(&net, &input, "second");
        assert_ne!(first.id(), second.id());

        let signature = net.notary.process(&first).unwrap();
        assert!(signature.verify(&first.id()).is_ok());

        assert_eq!(
            net.notary.process(&second).unwrap_err(),
            NotaryError::Conflict {
                state_ref: input.reference,
                consumed_by: first.id(),
            }
        );
        assert_eq!(net.notary.consumed_by(&input.reference), Some(first.id()));
    }

    #[test]
    fn test_resubmission_is_idempotent() {
        let net = net();
        let stx = decide(&net, &pending(&net), "ok");

        net.notary.process(&stx).unwrap();
        assert!(net.notary.process(&stx).is_ok());
    }

    #[test]
    fn test_unavailable_leaves_no_trace() {
        let net = net();
        let input = pending(&net);
        let stx = decide(&net, &input, "ok");

        net.notary.set_available(false);
        assert!(matches!(
            net.notary.process(&stx),
            Err(NotaryError::Unavailable(_))
        ));
        assert_eq!(net.notary.consumed_by(&input.reference), None);

        net.notary.set_available(true);
        assert!(net.notary.process(&stx).is_ok());
    }

    #[test]
    fn test_requires_full_signatures_and_right_notary() {
        let net = net();
        let input = pending(&net);
        let stx = decide(&net, &input, "ok");

        let mut half = SignedTransaction::new(stx.tx.clone());
        half.sign(&net.wallet).unwrap();
        assert!(matches!(
            net.notary.process(&half),
            Err(NotaryError::Transaction(TransactionError::MissingSignatures(_)))
        ));

        let (_, other) = party(8, "O=Other Notary");
        let mut misdirected = stx.clone();
        misdirected.tx.notary = other;
        misdirected.signatures.clear();
        assert!(matches!(
            net.notary.process(&misdirected),
            Err(NotaryError::WrongNotary(_))
        ));
    }

    #[tokio::test]
    async fn test_client_trait() {
        let net = net();
        let stx = decide(&net, &pending(&net), "ok");
        let client: &dyn NotaryClient = &net.notary;

        assert_eq!(client.party(), net.notary_party);
        assert!(client.notarise(&stx).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_spends_have_one_winner() {
        let net = net();
        let input = pending(&net);
        let contenders: Vec<SignedTransaction> = (0..32)
            .map(|i| decide(&net, &input, &format!("contender {i}")))
            .collect();
        let notary = Arc::new(net.notary);

        let handles: Vec<_> = contenders
            .into_iter()
            .map(|stx| {
                let notary = notary.clone();
                tokio::spawn(async move { notary.notarise(&stx).await.map(|_| stx.id()) })
            })
            .collect();

        let mut winners = Vec::new();
        let mut losers = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(id) => winners.push(id),
                Err(NotaryError::Conflict {
                    state_ref,
                    consumed_by,
                }) => {
                    assert_eq!(state_ref, input.reference);
                    losers.push(consumed_by);
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(winners.len(), 1);
        assert_eq!(losers.len(), 31);
        assert!(losers.iter().all(|by| *by == winners[0]));
        assert_eq!(notary.consumed_by(&input.reference), Some(winners[0]));
    }
}
