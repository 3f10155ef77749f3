//! The counterparty side of a flow
//!
//! A responder waits for a proposal, checks it on its own terms, signs or
//! declines, and then waits for the notarised transaction to record.

use tracing::{info, warn};

use super::{FlowError, FlowSession, Phase, ServiceHub};
use crate::contract;
use crate::state::ContractId;
use crate::transaction::SignedTransaction;
use crate::transport::FlowMessage;

/// How a responder's part ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderOutcome {
    /// Signed, then recorded the notarised transaction
    Recorded(SignedTransaction),
    /// Refused to sign
    Declined { reason: String },
    /// The initiator gave up
    Abandoned { reason: String },
}

/// Answers one proposal on one session
pub struct Responder<'a> {
    hub: &'a ServiceHub,
    expected: Option<ContractId>,
}

impl<'a> Responder<'a> {
    /// Responder that accepts any transaction its contracts accept
    pub fn new(hub: &'a ServiceHub) -> Self {
        Responder {
            hub,
            expected: None,
        }
    }

    /// Only sign transactions whose outputs belong to `contract`
    pub fn expecting(mut self, contract: ContractId) -> Self {
        self.expected = Some(contract);
        self
    }

    /// Serve one proposal from `session`
    pub async fn respond(&self, session: &mut FlowSession) -> Result<ResponderOutcome, FlowError> {
        let wait = self.hub.config.responder_wait();
        let proposal = match session.receive(Phase::AwaitProposal, wait).await? {
            FlowMessage::Proposal(stx) => stx,
            FlowMessage::Close { reason } => return Ok(ResponderOutcome::Abandoned { reason }),
            other => return Err(session.unexpected(&other, Phase::AwaitProposal)),
        };
        let tx_id = proposal.id();

        let mut signed = proposal;
        let signature = match self
            .check(&signed)
            .and_then(|()| signed.sign(self.hub.signer.as_ref()).map_err(|e| e.to_string()))
        {
            Ok(signature) => signature,
            Err(reason) => {
                warn!(tx_id = %tx_id.short(), from = %session.counterparty(), %reason, "declining");
                session
                    .send(&FlowMessage::Decline {
                        reason: reason.clone(),
                    })
                    .await?;
                return Ok(ResponderOutcome::Declined { reason });
            }
        };
        session.send(&FlowMessage::Signature(signature)).await?;
        info!(tx_id = %tx_id.short(), for_party = %session.counterparty(), "signed proposal");

        match session.receive(Phase::AwaitFinality, wait).await? {
            FlowMessage::Finalised(stx) => {
                if stx.tx != signed.tx {
                    return Err(FlowError::Protocol {
                        party: session.counterparty().name.clone(),
                        reason: format!("finalised {} differs from the signed proposal", stx.id()),
                    });
                }
                self.hub.vault.commit(&stx)?;
                session.send(&FlowMessage::Recorded { tx_id }).await?;
                info!(tx_id = %tx_id.short(), party = %self.hub.me, "recorded");
                Ok(ResponderOutcome::Recorded(stx))
            }
            FlowMessage::Close { reason } => Ok(ResponderOutcome::Abandoned { reason }),
            other => Err(session.unexpected(&other, Phase::AwaitFinality)),
        }
    }

    /// Our own verdict on a proposal, as a decline reason
    fn check(&self, stx: &SignedTransaction) -> Result<(), String> {
        let tx = &stx.tx;
        if !self.hub.identities.is_notary(&tx.notary) {
            return Err(format!("{} is not a known notary.", tx.notary));
        }
        if !tx.required_signers().contains(&self.hub.me.owning_key) {
            return Err("We are not a required signer of this transaction.".to_string());
        }
        stx.verify_signatures().map_err(|e| e.to_string())?;
        if let Some(expected) = self.expected {
            let matches = !tx.outputs.is_empty() && tx.outputs.iter().all(|o| o.contract() == expected);
            if !matches {
                return Err(format!("This must be a {} transaction.", expected));
            }
        }
        contract::verify(tx).map_err(|violation| violation.to_string())
    }
}
