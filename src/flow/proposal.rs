//! What a flow can be asked to do, and how each request becomes a draft
//! transaction

use super::{FlowError, ServiceHub};
use crate::contract::{CashInCommand, CommandData, KycCommand, LoanCommand};
use crate::crypto::PublicKey;
use crate::identity::Party;
use crate::state::{
    CashInState, ContractId, KycProfile, KycState, LinearId, LoanApplication, LoanDecision,
    LoanState,
};
use crate::transaction::TransactionBuilder;

/// A business request from this node
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Proposal {
    /// Record cash moved into a wallet; we are the sender
    CashIn {
        counterparty: String,
        affiliate_account: String,
        wallet_account: String,
        amount: String,
    },
    /// Register a customer profile with the counterparty
    Kyc {
        counterparty: String,
        account_id: u64,
        profile: KycProfile,
    },
    /// Ask the counterparty for a loan
    LoanRequest {
        counterparty: String,
        application: LoanApplication,
    },
    /// Approve or reject a pending loan held in our vault
    LoanDecision {
        linear_id: LinearId,
        decision: LoanDecision,
    },
}

impl Proposal {
    /// Draft the transaction for this request.
    ///
    /// Creations get a fresh linear id with us as sender. A loan decision
    /// consumes the single live version of the loan and produces its decided
    /// successor. `now` stamps any dates the request sets.
    pub fn build(&self, hub: &ServiceHub, now: u64) -> Result<TransactionBuilder, FlowError> {
        let notary = hub.notary_party();

        let builder = match self {
            Proposal::CashIn {
                counterparty,
                affiliate_account,
                wallet_account,
                amount,
            } => {
                let receiver = hub.resolve(counterparty)?;
                let signers = principal_keys(&hub.me, &receiver);
                TransactionBuilder::new(notary)
                    .add_output_state(CashInState {
                        linear_id: LinearId::generate(),
                        affiliate_account: affiliate_account.clone(),
                        wallet_account: wallet_account.clone(),
                        amount: amount.clone(),
                        sender: hub.me.clone(),
                        receiver,
                    })
                    .add_command(CommandData::CashIn(CashInCommand::Send), signers)
            }
            Proposal::Kyc {
                counterparty,
                account_id,
                profile,
            } => {
                let receiver = hub.resolve(counterparty)?;
                let signers = principal_keys(&hub.me, &receiver);
                TransactionBuilder::new(notary)
                    .add_output_state(KycState {
                        linear_id: LinearId::generate(),
                        account_id: *account_id,
                        profile: profile.clone(),
                        sender: hub.me.clone(),
                        receiver,
                    })
                    .add_command(CommandData::Kyc(KycCommand::Submit), signers)
            }
            Proposal::LoanRequest {
                counterparty,
                application,
            } => {
                let receiver = hub.resolve(counterparty)?;
                let signers = principal_keys(&hub.me, &receiver);
                TransactionBuilder::new(notary)
                    .add_output_state(LoanState::request(
                        application.clone(),
                        hub.me.clone(),
                        receiver,
                        now,
                    ))
                    .add_command(CommandData::Loan(LoanCommand::Request), signers)
            }
            Proposal::LoanDecision {
                linear_id,
                decision,
            } => {
                let current = hub.vault.find(*linear_id, ContractId::Loan)?;
                let Some(loan) = current.state.as_loan() else {
                    return Err(FlowError::NotFound {
                        linear_id: *linear_id,
                        contract: ContractId::Loan,
                    });
                };
                let decided = loan.decide(decision.clone(), now);
                let signers = principal_keys(&decided.sender, &decided.receiver);
                TransactionBuilder::new(notary)
                    .add_input_state(current)
                    .add_output_state(decided)
                    .add_command(CommandData::Loan(LoanCommand::Approve), signers)
            }
        };
        Ok(builder)
    }
}

fn principal_keys(sender: &Party, receiver: &Party) -> Vec<PublicKey> {
    if sender.same_entity(receiver) {
        vec![sender.owning_key]
    } else {
        vec![sender.owning_key, receiver.owning_key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use crate::crypto::KeyPair;
    use crate::node::Network;
    use crate::state::State;

    fn cash_in(counterparty: &str) -> Proposal {
        Proposal::CashIn {
            counterparty: counterparty.to_string(),
            affiliate_account: "AFF-0001".to_string(),
            wallet_account: "WAL-0091".to_string(),
            amount: "500.00".to_string(),
        }
    }

    #[test]
    fn test_creation_signed_by_both_principals() {
        let network = Network::new("O=Notary", KeyPair::from_seed(&[9; 32]), FlowConfig::default());
        let wallet = network.node("O=Wallet", KeyPair::from_seed(&[1; 32]));
        let bank = network.node("O=Bank", KeyPair::from_seed(&[2; 32]));

        let tx = cash_in("O=Bank").build(wallet.hub(), 0).unwrap().to_transaction();

        assert!(tx.inputs.is_empty());
        assert_eq!(tx.notary.name, "O=Notary");
        let State::CashIn(state) = &tx.outputs[0] else {
            panic!("expected a cash-in record");
        };
        assert_eq!(&state.sender, wallet.party());
        assert_eq!(&state.receiver, bank.party());
        let signers = tx.command().unwrap().signers.clone();
        assert_eq!(signers, vec![wallet.party().owning_key, bank.party().owning_key]);
    }

    #[test]
    fn test_self_dealing_lists_one_signer() {
        let network = Network::new("O=Notary", KeyPair::from_seed(&[9; 32]), FlowConfig::default());
        let wallet = network.node("O=Wallet", KeyPair::from_seed(&[1; 32]));

        let tx = cash_in("O=Wallet").build(wallet.hub(), 0).unwrap().to_transaction();
        assert_eq!(tx.command().unwrap().signers, vec![wallet.party().owning_key]);
    }

    #[test]
    fn test_unknown_counterparty() {
        let network = Network::new("O=Notary", KeyPair::from_seed(&[9; 32]), FlowConfig::default());
        let wallet = network.node("O=Wallet", KeyPair::from_seed(&[1; 32]));

        let err = cash_in("O=Nobody").build(wallet.hub(), 0).unwrap_err();
        assert_eq!(err, FlowError::UnknownParty("O=Nobody".to_string()));
    }

    #[test]
    fn test_decision_needs_a_live_loan() {
        let network = Network::new("O=Notary", KeyPair::from_seed(&[9; 32]), FlowConfig::default());
        let bank = network.node("O=Bank", KeyPair::from_seed(&[2; 32]));
        let linear_id = LinearId::generate();

        let err = Proposal::LoanDecision {
            linear_id,
            decision: LoanDecision {
                approve: true,
                remarks: "ok".to_string(),
                credit_score: None,
            },
        }
        .build(bank.hub(), 0)
        .unwrap_err();

        assert_eq!(
            err,
            FlowError::NotFound {
                linear_id,
                contract: ContractId::Loan,
            }
        );
    }
}
