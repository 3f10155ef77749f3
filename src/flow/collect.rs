//! Signature collection
//!
//! ```text
//! Built ──verify+sign──► LocalSigned ──► Collecting ──all signed──► FullySigned
//!   │                                       │
//!   └──────────── any failure ──────────────┴──► Rejected
//! ```
//!
//! Counterparties are asked one after another, in participant order, so a
//! decline stops the proposal before later parties ever see it. A decline is
//! final for this attempt.

use tracing::{debug, info, warn};

use super::{FlowError, FlowStep, Phase, ServiceHub, Sessions};
use crate::contract;
use crate::crypto::SecureHash;
use crate::identity::Party;
use crate::transaction::{SignedTransaction, Transaction};
use crate::transport::FlowMessage;

/// Where a collection attempt stands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectState {
    Built,
    LocalSigned,
    Collecting,
    FullySigned,
    Rejected,
}

struct Collection<'a> {
    hub: &'a ServiceHub,
    tx_id: SecureHash,
    state: CollectState,
}

impl<'a> Collection<'a> {
    fn advance(&mut self, next: CollectState) {
        debug!(tx_id = %self.tx_id.short(), from = ?self.state, to = ?next, "collection");
        self.state = next;
    }

    fn reject(&mut self, error: FlowError) -> FlowError {
        self.advance(CollectState::Rejected);
        warn!(tx_id = %self.tx_id.short(), kind = error.kind(), %error, "collection rejected");
        self.hub.progress.emit(self.tx_id, FlowStep::Rejected(error.kind()));
        error
    }
}

/// Required signers other than us, in the order they are contacted
pub fn counterparties(hub: &ServiceHub, tx: &Transaction) -> Result<Vec<Party>, FlowError> {
    let required = tx.required_signers();
    let mut parties: Vec<Party> = tx
        .participants()
        .into_iter()
        .filter(|p| required.contains(&p.owning_key) && !hub.is_me(p))
        .collect();

    // command signers that hold no stake in any record
    for key in &required {
        if *key == hub.me.owning_key || parties.iter().any(|p| p.owning_key == *key) {
            continue;
        }
        let party = hub
            .identities
            .party_from_key(key)
            .ok_or_else(|| FlowError::NoSession(key.short()))?;
        parties.push(party);
    }
    Ok(parties)
}

/// Verify `tx`, sign it, and gather every other required signature.
///
/// Nothing is sent when local verification fails. The returned transaction
/// is fully signed over exactly the content of `tx`.
pub async fn collect_signatures(
    hub: &ServiceHub,
    tx: Transaction,
    sessions: &mut Sessions,
) -> Result<SignedTransaction, FlowError> {
    let mut collection = Collection {
        hub,
        tx_id: tx.id(),
        state: CollectState::Built,
    };

    if let Err(violation) = contract::verify(&tx) {
        return Err(collection.reject(violation.into()));
    }
    hub.progress.emit(collection.tx_id, FlowStep::Verified);

    let mut stx = SignedTransaction::new(tx);
    if let Err(e) = stx.sign(hub.signer.as_ref()) {
        return Err(collection.reject(e.into()));
    }
    collection.advance(CollectState::LocalSigned);
    hub.progress.emit(collection.tx_id, FlowStep::LocalSigned);

    let parties = match counterparties(hub, &stx.tx) {
        Ok(parties) => parties,
        Err(e) => return Err(collection.reject(e)),
    };

    collection.advance(CollectState::Collecting);
    for party in &parties {
        if let Err(e) = request_signature(hub, &mut stx, party, sessions).await {
            return Err(collection.reject(e));
        }
        hub.progress.emit(
            collection.tx_id,
            FlowStep::CounterpartySigned(party.name.clone()),
        );
    }

    if let Err(e) = stx.verify_required_signatures() {
        return Err(collection.reject(e.into()));
    }
    collection.advance(CollectState::FullySigned);
    hub.progress.emit(collection.tx_id, FlowStep::FullySigned);
    info!(tx_id = %collection.tx_id.short(), signers = stx.signatures.len(), "fully signed");
    Ok(stx)
}

async fn request_signature(
    hub: &ServiceHub,
    stx: &mut SignedTransaction,
    party: &Party,
    sessions: &mut Sessions,
) -> Result<(), FlowError> {
    let session = sessions
        .get_mut(&party.owning_key)
        .ok_or_else(|| FlowError::NoSession(party.name.clone()))?;

    session.send(&FlowMessage::Proposal(stx.clone())).await?;
    let reply = session
        .receive(Phase::CollectSignatures, hub.config.counterparty_timeout())
        .await?;

    match reply {
        FlowMessage::Signature(signature) => {
            let invalid = |reason: String| FlowError::InvalidCounterpartySignature {
                party: party.name.clone(),
                reason,
            };
            if signature.signer != party.owning_key {
                return Err(invalid(format!("signed with foreign key {}", signature.signer.short())));
            }
            stx.add_signature(signature).map_err(|e| invalid(e.to_string()))
        }
        FlowMessage::Decline { reason } => Err(FlowError::CounterpartyDeclined {
            party: party.name.clone(),
            reason,
        }),
        other => Err(session.unexpected(&other, Phase::CollectSignatures)),
    }
}
