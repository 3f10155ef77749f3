//! The initiating side of a flow

use tracing::info;

use super::{collect_signatures, finalise, Committed, FlowError, Proposal, ServiceHub, Sessions};
use crate::state::current_timestamp;
use crate::transaction::SignedTransaction;

/// Drives one proposal from draft to commitment over a set of sessions.
///
/// Sessions are abandoned (sent a close message) whenever the attempt cannot
/// continue. The exception is a notary that is unavailable or slow: the
/// counterparties keep waiting so that [`Initiator::finalise`] can be
/// retried with the same signed transaction.
pub struct Initiator<'a> {
    hub: &'a ServiceHub,
    sessions: Sessions,
}

impl<'a> Initiator<'a> {
    pub fn new(hub: &'a ServiceHub, sessions: Sessions) -> Self {
        Initiator { hub, sessions }
    }

    /// Build, verify and sign `proposal`, then collect every counterparty
    /// signature
    pub async fn negotiate(&mut self, proposal: &Proposal) -> Result<SignedTransaction, FlowError> {
        self.negotiate_at(proposal, current_timestamp()).await
    }

    /// [`negotiate`](Self::negotiate) with an explicit clock reading
    pub async fn negotiate_at(
        &mut self,
        proposal: &Proposal,
        now: u64,
    ) -> Result<SignedTransaction, FlowError> {
        let result = match proposal.build(self.hub, now) {
            Ok(builder) => {
                collect_signatures(self.hub, builder.to_transaction(), &mut self.sessions).await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            self.sessions.close_all(&format!("abandoned: {}", e)).await;
        }
        result
    }

    /// Notarise, record and distribute a fully signed transaction
    pub async fn finalise(&mut self, stx: SignedTransaction) -> Result<Committed, FlowError> {
        let result = finalise(self.hub, stx, &mut self.sessions).await;
        match &result {
            Ok(committed) => {
                info!(
                    tx_id = %committed.transaction.id().short(),
                    undelivered = committed.undelivered.len(),
                    "flow complete"
                );
            }
            Err(e) if e.is_transient() => {}
            Err(e) => self.sessions.close_all(&format!("abandoned: {}", e)).await,
        }
        result
    }

    /// [`negotiate`](Self::negotiate) then [`finalise`](Self::finalise)
    pub async fn run(&mut self, proposal: &Proposal) -> Result<Committed, FlowError> {
        let stx = self.negotiate(proposal).await?;
        self.finalise(stx).await
    }
}
