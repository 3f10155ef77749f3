//! The collaborators a flow runs against

use std::sync::Arc;

use super::{FlowError, Progress};
use crate::config::FlowConfig;
use crate::crypto::Signer;
use crate::identity::{IdentityService, Party};
use crate::notary::NotaryClient;
use crate::vault::Vault;

/// Everything a flow may touch on behalf of one node.
///
/// Flows receive this explicitly; there is no global service locator.
#[derive(Clone)]
pub struct ServiceHub {
    /// The node's own identity
    pub me: Party,
    /// Signs with the key behind `me`
    pub signer: Arc<dyn Signer>,
    /// The node's record store
    pub vault: Arc<dyn Vault>,
    /// Name and key resolution
    pub identities: Arc<dyn IdentityService>,
    /// Route to the notary
    pub notary: Arc<dyn NotaryClient>,
    /// Timeouts
    pub config: FlowConfig,
    /// Step events
    pub progress: Progress,
}

impl ServiceHub {
    /// Resolve a counterparty by legal name
    pub fn resolve(&self, name: &str) -> Result<Party, FlowError> {
        self.identities
            .well_known_party(name)
            .ok_or_else(|| FlowError::UnknownParty(name.to_string()))
    }

    /// Notary for new transactions: the first one advertised, else the one
    /// our client talks to
    pub fn notary_party(&self) -> Party {
        self.identities
            .notaries()
            .into_iter()
            .next()
            .unwrap_or_else(|| self.notary.party())
    }

    /// Whether `party` is this node
    pub fn is_me(&self, party: &Party) -> bool {
        self.me.same_entity(party)
    }
}

impl std::fmt::Debug for ServiceHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHub")
            .field("me", &self.me.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
