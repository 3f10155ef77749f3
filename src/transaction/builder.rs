//! Assembling a transaction piece by piece

use super::{SignedTransaction, Transaction, TransactionError};
use crate::contract::{self, Command, CommandData, VerifyResult};
use crate::crypto::{PublicKey, Signer};
use crate::identity::Party;
use crate::state::{State, StateAndRef};

/// Mutable draft of a [`Transaction`].
///
/// Chain the `add_*` calls, then either take the finished content with
/// [`to_transaction`](Self::to_transaction) or sign it straight away with
/// [`sign_initial`](Self::sign_initial).
#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    notary: Party,
    inputs: Vec<StateAndRef>,
    outputs: Vec<State>,
    command: Option<Command>,
}

impl TransactionBuilder {
    /// Start a draft ordered by `notary`
    pub fn new(notary: Party) -> Self {
        TransactionBuilder {
            notary,
            inputs: Vec::new(),
            outputs: Vec::new(),
            command: None,
        }
    }

    /// Consume a record version
    pub fn add_input_state(mut self, input: StateAndRef) -> Self {
        self.inputs.push(input);
        self
    }

    /// Produce a record version
    pub fn add_output_state(mut self, output: impl Into<State>) -> Self {
        self.outputs.push(output.into());
        self
    }

    /// Set the command. A transaction carries at most one; a second call replaces the first.
    pub fn add_command(mut self, data: CommandData, signers: Vec<PublicKey>) -> Self {
        self.command = Some(Command { data, signers });
        self
    }

    /// Run the contract rules over the draft
    pub fn verify(&self) -> VerifyResult {
        contract::verify(&self.snapshot())
    }

    /// The finished content
    pub fn to_transaction(self) -> Transaction {
        Transaction {
            inputs: self.inputs,
            outputs: self.outputs,
            command: self.command,
            notary: self.notary,
        }
    }

    /// Finish and add the builder's own signature.
    ///
    /// Contract rules are not run here; call [`verify`](Self::verify) first.
    pub fn sign_initial(self, signer: &dyn Signer) -> Result<SignedTransaction, TransactionError> {
        let mut stx = SignedTransaction::new(self.to_transaction());
        stx.sign(signer)?;
        Ok(stx)
    }

    fn snapshot(&self) -> Transaction {
        self.clone().to_transaction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::LoanCommand;
    use crate::state::fixtures::*;

    #[test]
    fn test_verify_before_signing() {
        let (wallet_keys, wallet) = party(1, "O=Wallet");
        let (_, bank) = party(2, "O=Bank");
        let (_, notary) = party(9, "O=Notary");

        let mut loan = pending_loan(&wallet, &bank);
        loan.amount.clear();
        let builder = TransactionBuilder::new(notary)
            .add_output_state(loan)
            .add_command(
                CommandData::Loan(LoanCommand::Request),
                vec![wallet.owning_key, bank.owning_key],
            );

        assert!(builder.verify().is_err());

        // signing does not judge the content
        let stx = builder.sign_initial(&wallet_keys).unwrap();
        assert!(stx.signed_by(&wallet.owning_key));
        assert!(!stx.is_fully_signed());
    }

    #[test]
    fn test_second_command_replaces_first() {
        let (_, notary) = party(9, "O=Notary");
        let tx = TransactionBuilder::new(notary)
            .add_command(CommandData::Loan(LoanCommand::Request), vec![])
            .add_command(CommandData::Loan(LoanCommand::Approve), vec![])
            .to_transaction();

        assert_eq!(
            tx.command().map(|c| c.data),
            Some(CommandData::Loan(LoanCommand::Approve))
        );
    }
}
