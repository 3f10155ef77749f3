//! Third-party verification of an exported transaction
//!
//! Anyone holding the JSON export can check it without running a node: every
//! signature is re-verified against the content and the contract rules are
//! re-run.

use super::{SignedTransaction, TransactionError};
use crate::contract::{self, ContractViolation};
use crate::crypto::{PublicKey, SecureHash};
use crate::identity::Party;

/// Result of verifying an exported transaction
#[derive(Debug)]
pub struct VerificationReport {
    /// Transaction id recomputed from the content
    pub tx_id: SecureHash,
    /// Verdict of the contract rules
    pub contract_verdict: Result<(), ContractViolation>,
    /// Participants who have signed
    pub signed_parties: Vec<Party>,
    /// Participants who have not signed yet
    pub unsigned_parties: Vec<Party>,
    /// Required keys with no signature, including ones not bound to a participant
    pub missing_keys: Vec<PublicKey>,
    /// Countersigned by the notary
    pub is_notarised: bool,
}

impl VerificationReport {
    /// Valid under the contracts and carrying every required signature
    pub fn is_complete(&self) -> bool {
        self.contract_verdict.is_ok() && self.missing_keys.is_empty()
    }
}

/// Verify a JSON export.
///
/// Fails only when the export is malformed or a signature it carries is
/// invalid; contract violations and missing signatures are reported.
pub fn verify_transaction_standalone(json: &str) -> Result<VerificationReport, TransactionError> {
    let stx = SignedTransaction::import(json)?;
    stx.verify_signatures()?;

    let (signed_parties, unsigned_parties) = stx
        .tx
        .participants()
        .into_iter()
        .partition(|p| stx.signed_by(&p.owning_key));

    Ok(VerificationReport {
        tx_id: stx.id(),
        contract_verdict: contract::verify(&stx.tx),
        signed_parties,
        unsigned_parties,
        missing_keys: stx.missing_signatures().into_iter().collect(),
        is_notarised: stx.is_notarised(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{CashInCommand, CommandData};
    use crate::state::fixtures::*;
    use crate::transaction::TransactionBuilder;

    #[test]
    fn test_report_of_partially_signed_export() {
        let (wallet_keys, wallet) = party(1, "O=Wallet");
        let (_, bank) = party(2, "O=Bank");
        let (_, notary) = party(9, "O=Notary");
        let stx = TransactionBuilder::new(notary)
            .add_output_state(cash_in(&wallet, &bank))
            .add_command(
                CommandData::CashIn(CashInCommand::Send),
                vec![wallet.owning_key, bank.owning_key],
            )
            .sign_initial(&wallet_keys)
            .unwrap();

        let report = verify_transaction_standalone(&stx.export()).unwrap();
        assert_eq!(report.tx_id, stx.id());
        assert!(report.contract_verdict.is_ok());
        assert_eq!(report.signed_parties, vec![wallet]);
        assert_eq!(report.unsigned_parties, vec![bank.clone()]);
        assert_eq!(report.missing_keys, vec![bank.owning_key]);
        assert!(!report.is_notarised);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            verify_transaction_standalone("{ not json"),
            Err(TransactionError::Malformed(_))
        ));
    }
}
