//! Notarisation and distribution
//!
//! Once the notary signs, the transaction is committed: our vault records it
//! and each other participant is sent a copy. A participant that cannot be
//! reached does not undo anything; it is reported in
//! [`Committed::undelivered`].

use tokio::time::timeout;
use tracing::{info, warn};

use super::{FlowError, FlowStep, Phase, ServiceHub, Sessions};
use crate::identity::Party;
use crate::notary::NotaryError;
use crate::transaction::SignedTransaction;
use crate::transport::FlowMessage;
use crate::vault::CommitOutcome;

/// A participant that did not acknowledge the finalised transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Undelivered {
    pub party: Party,
    pub error: FlowError,
}

/// A notarised transaction recorded in our vault
#[derive(Debug, Clone)]
pub struct Committed {
    /// Carries the notary's signature
    pub transaction: SignedTransaction,
    /// Participants still missing the transaction
    pub undelivered: Vec<Undelivered>,
}

impl Committed {
    /// Every participant acknowledged
    pub fn fully_distributed(&self) -> bool {
        self.undelivered.is_empty()
    }
}

/// Notarise a fully signed transaction, record it and distribute it.
///
/// A transaction that already carries a valid notary signature skips the
/// notary, so retrying after a failed distribution is safe. On
/// [`FlowError::NotaryUnavailable`] or a notary timeout nothing has changed
/// anywhere and the same transaction may be passed in again.
pub async fn finalise(
    hub: &ServiceHub,
    mut stx: SignedTransaction,
    sessions: &mut Sessions,
) -> Result<Committed, FlowError> {
    let tx_id = stx.id();
    stx.verify_required_signatures()?;

    if stx.notary_signature().is_none() {
        let notary = hub.notary.party();
        if notary != stx.tx.notary {
            return Err(FlowError::Notary(NotaryError::WrongNotary(
                stx.tx.notary.name.clone(),
            )));
        }
        let signature = timeout(hub.config.notary_timeout(), hub.notary.notarise(&stx))
            .await
            .map_err(|_| FlowError::Timeout {
                phase: Phase::Notarise,
                party: notary.name.clone(),
            })??;
        stx.add_signature(signature)?;
        info!(tx_id = %tx_id.short(), notary = %notary, "notarised");
    }
    hub.progress.emit(tx_id, FlowStep::Notarised);

    if hub.vault.commit(&stx)? == CommitOutcome::Recorded {
        info!(tx_id = %tx_id.short(), party = %hub.me, "recorded");
    }
    hub.progress.emit(tx_id, FlowStep::Recorded);

    let mut undelivered = Vec::new();
    for party in stx.tx.participants() {
        if hub.is_me(&party) {
            continue;
        }
        match deliver(hub, &stx, &party, sessions).await {
            Ok(()) => hub.progress.emit(tx_id, FlowStep::Distributed(party.name.clone())),
            Err(error) => {
                warn!(tx_id = %tx_id.short(), party = %party, %error, "distribution failed");
                undelivered.push(Undelivered { party, error });
            }
        }
    }

    Ok(Committed {
        transaction: stx,
        undelivered,
    })
}

async fn deliver(
    hub: &ServiceHub,
    stx: &SignedTransaction,
    party: &Party,
    sessions: &mut Sessions,
) -> Result<(), FlowError> {
    let session = sessions
        .get_mut(&party.owning_key)
        .ok_or_else(|| FlowError::NoSession(party.name.clone()))?;

    session.send(&FlowMessage::Finalised(stx.clone())).await?;
    match session
        .receive(Phase::Distribute, hub.config.distribution_timeout())
        .await?
    {
        FlowMessage::Recorded { tx_id } if tx_id == stx.id() => Ok(()),
        other => Err(session.unexpected(&other, Phase::Distribute)),
    }
}
