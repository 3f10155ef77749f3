//! Record store
//!
//! Each node keeps its own vault: the notarised transactions it took part in
//! and the record versions they produced that nothing has consumed yet.
//! Commits are all-or-nothing and idempotent, so a finality message that
//! arrives twice leaves the vault as it was after the first.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::crypto::SecureHash;
use crate::state::{ContractId, LinearId, State, StateAndRef, StateRef};
use crate::transaction::SignedTransaction;

/// Record store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// No live version of the record
    #[error("No unconsumed {contract} record with id {linear_id}")]
    NotFound {
        /// Record searched for
        linear_id: LinearId,
        /// Contract the record was expected under
        contract: ContractId,
    },

    /// More than one live version, which a correct ledger never produces
    #[error("{count} unconsumed {contract} records share id {linear_id}")]
    Ambiguous {
        /// Record searched for
        linear_id: LinearId,
        /// Contract the record was expected under
        contract: ContractId,
        /// Number of live versions found
        count: usize,
    },

    /// Only notarised transactions may be committed
    #[error("Transaction {tx_id} is not finalised: {reason}")]
    NotFinalised {
        /// Offending transaction
        tx_id: SecureHash,
        /// What is missing or invalid
        reason: String,
    },

    /// A previous holder of the lock panicked
    #[error("Vault lock poisoned")]
    LockPoisoned,
}

/// What [`Vault::commit`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Inputs consumed and outputs stored
    Recorded,
    /// The transaction was already in the vault; nothing changed
    AlreadyRecorded,
}

/// A party's record store
pub trait Vault: Send + Sync {
    /// The single live version of `linear_id` under `contract`
    fn find(&self, linear_id: LinearId, contract: ContractId) -> Result<StateAndRef, VaultError>;

    /// Every live record, optionally restricted to one contract, in
    /// [`StateRef`] order
    fn unconsumed(&self, contract: Option<ContractId>) -> Result<Vec<StateAndRef>, VaultError>;

    /// A committed transaction by id
    fn transaction(&self, tx_id: &SecureHash) -> Result<Option<SignedTransaction>, VaultError>;

    /// Record a notarised transaction: consume its inputs and store its
    /// outputs, atomically
    fn commit(&self, stx: &SignedTransaction) -> Result<CommitOutcome, VaultError>;
}

#[derive(Default)]
struct VaultInner {
    transactions: HashMap<SecureHash, SignedTransaction>,
    live: BTreeMap<StateRef, State>,
    consumed: HashMap<StateRef, SecureHash>,
}

/// In-memory [`Vault`]
#[derive(Default)]
pub struct MemoryVault {
    inner: RwLock<VaultInner>,
}

impl MemoryVault {
    /// Empty vault
    pub fn new() -> Self {
        Self::default()
    }

    /// Transaction that consumed `state_ref`, if this vault saw it happen
    pub fn consumed_by(&self, state_ref: &StateRef) -> Result<Option<SecureHash>, VaultError> {
        let inner = self.inner.read().map_err(|_| VaultError::LockPoisoned)?;
        Ok(inner.consumed.get(state_ref).copied())
    }

    /// Number of committed transactions
    pub fn transaction_count(&self) -> Result<usize, VaultError> {
        let inner = self.inner.read().map_err(|_| VaultError::LockPoisoned)?;
        Ok(inner.transactions.len())
    }
}

impl Vault for MemoryVault {
    fn find(&self, linear_id: LinearId, contract: ContractId) -> Result<StateAndRef, VaultError> {
        let inner = self.inner.read().map_err(|_| VaultError::LockPoisoned)?;
        let mut matches: Vec<StateAndRef> = inner
            .live
            .iter()
            .filter(|(_, state)| state.contract() == contract && state.linear_id() == linear_id)
            .map(|(reference, state)| StateAndRef {
                state: state.clone(),
                reference: *reference,
            })
            .collect();

        match matches.len() {
            0 => Err(VaultError::NotFound {
                linear_id,
                contract,
            }),
            1 => Ok(matches.remove(0)),
            count => Err(VaultError::Ambiguous {
                linear_id,
                contract,
                count,
            }),
        }
    }

    fn unconsumed(&self, contract: Option<ContractId>) -> Result<Vec<StateAndRef>, VaultError> {
        let inner = self.inner.read().map_err(|_| VaultError::LockPoisoned)?;
        Ok(inner
            .live
            .iter()
            .filter(|(_, state)| contract.map_or(true, |c| state.contract() == c))
            .map(|(reference, state)| StateAndRef {
                state: state.clone(),
                reference: *reference,
            })
            .collect())
    }

    fn transaction(&self, tx_id: &SecureHash) -> Result<Option<SignedTransaction>, VaultError> {
        let inner = self.inner.read().map_err(|_| VaultError::LockPoisoned)?;
        Ok(inner.transactions.get(tx_id).cloned())
    }

    fn commit(&self, stx: &SignedTransaction) -> Result<CommitOutcome, VaultError> {
        let tx_id = stx.id();
        let not_final = |reason: String| VaultError::NotFinalised { tx_id, reason };

        stx.verify_required_signatures()
            .map_err(|e| not_final(e.to_string()))?;
        if stx.notary_signature().is_none() {
            return Err(not_final("no notary signature".to_string()));
        }

        let mut inner = self.inner.write().map_err(|_| VaultError::LockPoisoned)?;
        if inner.transactions.contains_key(&tx_id) {
            debug!(tx_id = %tx_id.short(), "transaction already recorded");
            return Ok(CommitOutcome::AlreadyRecorded);
        }

        for input in &stx.tx.inputs {
            inner.live.remove(&input.reference);
            inner.consumed.insert(input.reference, tx_id);
        }
        for output in stx.tx.out_refs() {
            inner.live.insert(output.reference, output.state);
        }
        inner.transactions.insert(tx_id, stx.clone());

        debug!(
            tx_id = %tx_id.short(),
            consumed = stx.tx.inputs.len(),
            produced = stx.tx.outputs.len(),
            "transaction recorded"
        );
        Ok(CommitOutcome::Recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{CommandData, LoanCommand};
    use crate::crypto::KeyPair;
    use crate::identity::Party;
    use crate::state::fixtures::*;
    use crate::state::LoanDecision;
    use crate::transaction::TransactionBuilder;

    struct Keys {
        wallet: (KeyPair, Party),
        bank: (KeyPair, Party),
        notary: (KeyPair, Party),
    }

    fn keys() -> Keys {
        Keys {
            wallet: party(1, "O=Wallet"),
            bank: party(2, "O=Bank"),
            notary: party(9, "O=Notary"),
        }
    }

    fn notarise(k: &Keys, builder: TransactionBuilder) -> SignedTransaction {
        let mut stx = builder.sign_initial(&k.wallet.0).unwrap();
        stx.sign(&k.bank.0).unwrap();
        stx.sign(&k.notary.0).unwrap();
        stx
    }

    fn loan_request(k: &Keys) -> SignedTransaction {
        notarise(
            k,
            TransactionBuilder::new(k.notary.1.clone())
                .add_output_state(pending_loan(&k.wallet.1, &k.bank.1))
                .add_command(
                    CommandData::Loan(LoanCommand::Request),
                    vec![k.wallet.1.owning_key, k.bank.1.owning_key],
                ),
        )
    }

    #[test]
    fn test_commit_and_find() {
        let k = keys();
        let vault = MemoryVault::new();
        let stx = loan_request(&k);
        let linear_id = stx.tx.outputs[0].linear_id();

        assert_eq!(vault.commit(&stx).unwrap(), CommitOutcome::Recorded);
        let found = vault.find(linear_id, ContractId::Loan).unwrap();
        assert_eq!(found.reference, stx.tx.output_ref(0));
        assert_eq!(vault.transaction(&stx.id()).unwrap(), Some(stx));
        assert!(matches!(
            vault.find(linear_id, ContractId::CashIn),
            Err(VaultError::NotFound { .. })
        ));
    }

    #[test]
    fn test_commit_is_idempotent() {
        let k = keys();
        let vault = MemoryVault::new();
        let stx = loan_request(&k);

        vault.commit(&stx).unwrap();
        let before = vault.unconsumed(None).unwrap();
        assert_eq!(vault.commit(&stx).unwrap(), CommitOutcome::AlreadyRecorded);
        assert_eq!(vault.unconsumed(None).unwrap(), before);
        assert_eq!(vault.transaction_count().unwrap(), 1);
    }

    #[test]
    fn test_transition_replaces_live_version() {
        let k = keys();
        let vault = MemoryVault::new();
        let request = loan_request(&k);
        vault.commit(&request).unwrap();

        let pending = vault
            .find(request.tx.outputs[0].linear_id(), ContractId::Loan)
            .unwrap();
        let decided = pending.state.as_loan().unwrap().decide(
            LoanDecision {
                approve: true,
                remarks: "ok".to_string(),
                credit_score: None,
            },
            10,
        );
        let decision = notarise(
            &k,
            TransactionBuilder::new(k.notary.1.clone())
                .add_input_state(pending.clone())
                .add_output_state(decided)
                .add_command(
                    CommandData::Loan(LoanCommand::Approve),
                    vec![k.wallet.1.owning_key, k.bank.1.owning_key],
                ),
        );
        vault.commit(&decision).unwrap();

        let live = vault.find(pending.state.linear_id(), ContractId::Loan).unwrap();
        assert_eq!(live.reference, decision.tx.output_ref(0));
        assert!(live.state.as_loan().unwrap().approved);
        assert_eq!(
            vault.consumed_by(&pending.reference).unwrap(),
            Some(decision.id())
        );
        assert_eq!(vault.unconsumed(Some(ContractId::Loan)).unwrap().len(), 1);
    }

    #[test]
    fn test_unnotarised_commit_rejected() {
        let k = keys();
        let vault = MemoryVault::new();
        let mut stx = TransactionBuilder::new(k.notary.1.clone())
            .add_output_state(pending_loan(&k.wallet.1, &k.bank.1))
            .add_command(
                CommandData::Loan(LoanCommand::Request),
                vec![k.wallet.1.owning_key, k.bank.1.owning_key],
            )
            .sign_initial(&k.wallet.0)
            .unwrap();
        stx.sign(&k.bank.0).unwrap();

        assert!(matches!(
            vault.commit(&stx),
            Err(VaultError::NotFinalised { .. })
        ));
        assert!(vault.unconsumed(None).unwrap().is_empty());
    }

    #[test]
    fn test_ambiguous_find() {
        let k = keys();
        let vault = MemoryVault::new();
        let loan = pending_loan(&k.wallet.1, &k.bank.1);
        let signers = vec![k.wallet.1.owning_key, k.bank.1.owning_key];

        // Two unrelated transactions that (wrongly) reuse one linear id
        for purpose in ["first", "second"] {
            let mut copy = loan.clone();
            copy.purpose = purpose.to_string();
            let stx = notarise(
                &k,
                TransactionBuilder::new(k.notary.1.clone())
                    .add_output_state(copy)
                    .add_command(CommandData::Loan(LoanCommand::Request), signers.clone()),
            );
            vault.commit(&stx).unwrap();
        }

        assert!(matches!(
            vault.find(loan.linear_id, ContractId::Loan),
            Err(VaultError::Ambiguous { count: 2, .. })
        ));
    }
}
