//! Contract verification
//!
//! Every record type is governed by one contract. A transaction is valid when
//! the contract of each record it consumes or produces accepts it. Contracts
//! are pure: they look only at the transaction's inputs, outputs, command and
//! signer keys, never at storage, the network, or the clock, so every party
//! that checks the same transaction reaches the same verdict.
//!
//! Commands are a closed enum grouped per contract. Each contract matches
//! exhaustively over its own group, so adding a command forces a decision
//! about which rules it needs.
//!
//! # Example
//!
//! ```rust
//! use accord::contract::{self, CashInCommand, CommandData};
//! use accord::crypto::KeyPair;
//! use accord::identity::Party;
//! use accord::state::{CashInState, LinearId};
//! use accord::transaction::TransactionBuilder;
//!
//! let wallet = Party::new("O=Wallet", KeyPair::generate().public_key());
//! let bank = Party::new("O=Bank", KeyPair::generate().public_key());
//! let notary = Party::new("O=Notary", KeyPair::generate().public_key());
//!
//! let tx = TransactionBuilder::new(notary)
//!     .add_output_state(CashInState {
//!         linear_id: LinearId::generate(),
//!         affiliate_account: "AFF-1".into(),
//!         wallet_account: "WAL-1".into(),
//!         amount: "100".into(),
//!         sender: wallet.clone(),
//!         receiver: bank.clone(),
//!     })
//!     .add_command(
//!         CommandData::CashIn(CashInCommand::Send),
//!         vec![wallet.owning_key, bank.owning_key],
//!     )
//!     .to_transaction();
//!
//! assert!(contract::verify(&tx).is_ok());
//! ```

mod cash_in;
mod kyc;
mod loan;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::PublicKey;
use crate::encoding::{Canonical, CanonicalWriter};
use crate::identity::Party;
use crate::state::{ContractId, State};
use crate::transaction::Transaction;

/// Commands understood by [`ContractId::CashIn`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashInCommand {
    /// Record a new cash-in
    Send,
}

/// Commands understood by [`ContractId::Kyc`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KycCommand {
    /// Register a customer profile
    Submit,
}

/// Commands understood by [`ContractId::Loan`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanCommand {
    /// Open a pending loan
    Request,
    /// Approve or reject a pending loan
    Approve,
}

/// The intent of a transaction, tagged with the contract that owns it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandData {
    CashIn(CashInCommand),
    Kyc(KycCommand),
    Loan(LoanCommand),
}

impl Canonical for CommandData {
    fn encode(&self, out: &mut CanonicalWriter) {
        let (group, variant) = match self {
            CommandData::CashIn(CashInCommand::Send) => (0x01, 0x01),
            CommandData::Kyc(KycCommand::Submit) => (0x02, 0x01),
            CommandData::Loan(LoanCommand::Request) => (0x03, 0x01),
            CommandData::Loan(LoanCommand::Approve) => (0x03, 0x02),
        };
        out.tag(group).tag(variant);
    }
}

impl std::fmt::Display for CommandData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandData::CashIn(c) => write!(f, "CashIn.{:?}", c),
            CommandData::Kyc(c) => write!(f, "Kyc.{:?}", c),
            CommandData::Loan(c) => write!(f, "Loan.{:?}", c),
        }
    }
}

/// A command and the keys that must sign for it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub data: CommandData,
    pub signers: Vec<PublicKey>,
}

impl Canonical for Command {
    fn encode(&self, out: &mut CanonicalWriter) {
        out.value(&self.data).u32(self.signers.len() as u32);
        for key in &self.signers {
            out.key(key);
        }
    }
}

/// A contract refused the transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{contract} rejected the transaction: {reason}")]
pub struct ContractViolation {
    /// Contract whose rule failed
    pub contract: ContractId,
    /// The failed rule, in words
    pub reason: String,
}

/// Result of running contract rules
pub type VerifyResult = Result<(), ContractViolation>;

/// Run every applicable contract over `tx`.
///
/// Contracts run in [`ContractId`] order and the first failed rule is
/// reported. A transaction with no command, or whose command belongs to a
/// contract that has no records in the transaction, passes the other
/// contracts untouched: no rule group claims it.
pub fn verify(tx: &Transaction) -> VerifyResult {
    for contract in tx.contracts() {
        match contract {
            ContractId::CashIn => cash_in::verify(tx)?,
            ContractId::Kyc => kyc::verify(tx)?,
            ContractId::Loan => loan::verify(tx)?,
        }
    }
    Ok(())
}

/// Rule checker bound to one contract, in the style of `requireThat`
struct Requirements {
    contract: ContractId,
}

impl Requirements {
    fn new(contract: ContractId) -> Self {
        Requirements { contract }
    }

    fn violation(&self, reason: &str) -> ContractViolation {
        ContractViolation {
            contract: self.contract,
            reason: reason.to_string(),
        }
    }

    fn using(&self, reason: &str, holds: bool) -> VerifyResult {
        if holds {
            Ok(())
        } else {
            Err(self.violation(reason))
        }
    }

    fn present<T>(&self, reason: &str, value: Option<T>) -> Result<T, ContractViolation> {
        value.ok_or_else(|| self.violation(reason))
    }

    /// The only output of this contract's type
    fn single_output<'a, T: 'a>(
        &self,
        tx: &'a Transaction,
        pick: impl Fn(&'a State) -> Option<&'a T>,
    ) -> Result<&'a T, ContractViolation> {
        let mut matching = tx.outputs.iter().filter_map(pick);
        let first = matching.next();
        let extra = matching.next();
        match (first, extra) {
            (Some(output), None) => Ok(output),
            (None, _) => Err(self.violation("An output record of this contract must be created.")),
            (Some(_), Some(_)) => Err(self.violation("Only one output record should be created.")),
        }
    }

    /// Shared rules for commands that issue a brand-new record
    fn issuance(
        &self,
        tx: &Transaction,
        sender: &Party,
        receiver: &Party,
        signers: &[PublicKey],
    ) -> VerifyResult {
        self.using(
            "No inputs should be consumed when issuing a new record.",
            tx.inputs.is_empty(),
        )?;
        self.using(
            "The sender and the receiver cannot be the same entity.",
            !sender.same_entity(receiver),
        )?;
        self.using(
            "All of the participants must be signers.",
            [sender, receiver]
                .iter()
                .all(|p| signers.contains(&p.owning_key)),
        )
    }
}

/// The command, if it belongs to `contract`'s group
fn command_for(tx: &Transaction, contract: ContractId) -> Option<(&CommandData, &[PublicKey])> {
    let command = tx.command.as_ref()?;
    let owner = match command.data {
        CommandData::CashIn(_) => ContractId::CashIn,
        CommandData::Kyc(_) => ContractId::Kyc,
        CommandData::Loan(_) => ContractId::Loan,
    };
    (owner == contract).then_some((&command.data, command.signers.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::*;
    use crate::transaction::TransactionBuilder;

    #[test]
    fn test_no_command_is_accepted() {
        let (_, wallet) = party(1, "O=Wallet");
        let (_, notary) = party(9, "O=Notary");
        // Breaks every cash-in rule, but nothing claims it.
        let mut record = cash_in(&wallet, &wallet);
        record.wallet_account.clear();
        let tx = TransactionBuilder::new(notary)
            .add_output_state(record)
            .to_transaction();

        assert!(verify(&tx).is_ok());
    }

    #[test]
    fn test_foreign_command_is_ignored_by_other_contracts() {
        let (_, wallet) = party(1, "O=Wallet");
        let (_, notary) = party(9, "O=Notary");
        let record = cash_in(&wallet, &wallet);
        let tx = TransactionBuilder::new(notary)
            .add_output_state(record)
            .add_command(CommandData::Kyc(KycCommand::Submit), vec![])
            .to_transaction();

        // The KYC contract owns the command but has no records here.
        assert!(verify(&tx).is_ok());
    }

    #[test]
    fn test_violation_message() {
        let violation = ContractViolation {
            contract: ContractId::Loan,
            reason: "Remarks cannot be empty.".to_string(),
        };
        assert_eq!(
            violation.to_string(),
            "LoanContract rejected the transaction: Remarks cannot be empty."
        );
    }

    #[test]
    fn test_command_canonical_distinguishes_variants() {
        assert_ne!(
            CommandData::Loan(LoanCommand::Request).canonical_bytes(),
            CommandData::Loan(LoanCommand::Approve).canonical_bytes()
        );
    }
}
