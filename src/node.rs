//! Wiring nodes together in one process
//!
//! A [`Network`] owns the network map and the notary; each [`Node`] gets its
//! own key, vault and [`ServiceHub`]. [`connect`] opens an in-memory session
//! pair between two nodes.

use std::sync::Arc;

use crate::config::FlowConfig;
use crate::crypto::KeyPair;
use crate::flow::{FlowSession, Initiator, Progress, Responder, ServiceHub, Sessions};
use crate::identity::{NetworkMap, Party};
use crate::notary::NotaryService;
use crate::transport::memory::create_pair;
use crate::vault::MemoryVault;

/// The shared parts of a deployment: who is who, and the notary
pub struct Network {
    map: Arc<NetworkMap>,
    notary: Arc<NotaryService>,
    config: FlowConfig,
}

impl Network {
    /// New network whose notary signs with `notary_keys`
    pub fn new(notary_name: &str, notary_keys: KeyPair, config: FlowConfig) -> Self {
        let party = Party::new(notary_name, notary_keys.public_key());
        let map = Arc::new(NetworkMap::new());
        map.register_notary(party.clone());
        Network {
            map,
            notary: Arc::new(NotaryService::new(party, Arc::new(notary_keys))),
            config,
        }
    }

    /// Register a node under `name`
    pub fn node(&self, name: &str, keys: KeyPair) -> Node {
        let me = Party::new(name, keys.public_key());
        self.map.register(me.clone());
        let vault = Arc::new(MemoryVault::new());
        Node {
            hub: ServiceHub {
                me,
                signer: Arc::new(keys),
                vault: vault.clone(),
                identities: self.map.clone(),
                notary: self.notary.clone(),
                config: self.config.clone(),
                progress: Progress::new(),
            },
            vault,
        }
    }

    pub fn notary(&self) -> &NotaryService {
        &self.notary
    }

    pub fn map(&self) -> &NetworkMap {
        &self.map
    }
}

/// One party's runtime
pub struct Node {
    hub: ServiceHub,
    vault: Arc<MemoryVault>,
}

impl Node {
    pub fn party(&self) -> &Party {
        &self.hub.me
    }

    pub fn hub(&self) -> &ServiceHub {
        &self.hub
    }

    pub fn vault(&self) -> &MemoryVault {
        &self.vault
    }

    /// Start a flow over `sessions`
    pub fn initiator(&self, sessions: Sessions) -> Initiator<'_> {
        Initiator::new(&self.hub, sessions)
    }

    /// Answer a flow started by someone else
    pub fn responder(&self) -> Responder<'_> {
        Responder::new(&self.hub)
    }
}

/// Session pair: `from`'s end (talking to `to`) and `to`'s end (talking to `from`)
pub fn connect(from: &Node, to: &Node) -> (FlowSession, FlowSession) {
    let (ours, theirs) = create_pair();
    (
        FlowSession::new(to.party().clone(), ours),
        FlowSession::new(from.party().clone(), theirs),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityService;

    #[test]
    fn test_nodes_are_registered() {
        let network = Network::new("O=Notary", KeyPair::from_seed(&[9; 32]), FlowConfig::default());
        let wallet = network.node("O=Wallet", KeyPair::from_seed(&[1; 32]));

        assert_eq!(network.map().well_known_party("O=Wallet"), Some(wallet.party().clone()));
        assert_eq!(network.map().notaries().len(), 1);
        assert_eq!(wallet.hub().notary_party().name, "O=Notary");
    }

    #[test]
    fn test_connect_names_the_other_side() {
        let network = Network::new("O=Notary", KeyPair::from_seed(&[9; 32]), FlowConfig::default());
        let wallet = network.node("O=Wallet", KeyPair::from_seed(&[1; 32]));
        let bank = network.node("O=Bank", KeyPair::from_seed(&[2; 32]));

        let (to_bank, to_wallet) = connect(&wallet, &bank);
        assert_eq!(to_bank.counterparty(), bank.party());
        assert_eq!(to_wallet.counterparty(), wallet.party());
    }
}
