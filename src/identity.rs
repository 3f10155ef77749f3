//! Parties and identity resolution
//!
//! A [`Party`] is a legal name bound to an owning key. Flows resolve
//! counterparty names and notaries through an [`IdentityService`] handed to
//! them explicitly; nothing is looked up ambiently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::crypto::PublicKey;
use crate::encoding::{Canonical, CanonicalWriter};

/// A well-known identity on the network
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    /// Legal name, e.g. "O=Koala Wallet, L=Manila, C=PH"
    pub name: String,
    /// Key that signs on this party's behalf
    pub owning_key: PublicKey,
}

impl Party {
    /// Bind a name to a key
    pub fn new(name: impl Into<String>, owning_key: PublicKey) -> Self {
        Party {
            name: name.into(),
            owning_key,
        }
    }

    /// Two parties are the same entity when they sign with the same key
    pub fn same_entity(&self, other: &Party) -> bool {
        self.owning_key == other.owning_key
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl Canonical for Party {
    fn encode(&self, out: &mut CanonicalWriter) {
        out.str(&self.name).key(&self.owning_key);
    }
}

/// Resolves logical party names to their current keys
pub trait IdentityService: Send + Sync {
    /// Look up a party by legal name
    fn well_known_party(&self, name: &str) -> Option<Party>;

    /// Look up the party owning `key`
    fn party_from_key(&self, key: &PublicKey) -> Option<Party>;

    /// Notaries advertised on the network, in registration order
    fn notaries(&self) -> Vec<Party>;

    /// Whether `party` is an advertised notary
    fn is_notary(&self, party: &Party) -> bool {
        self.notaries().iter().any(|n| n == party)
    }
}

/// In-memory network map shared by every node of a deployment
#[derive(Default)]
pub struct NetworkMap {
    parties: RwLock<BTreeMap<String, Party>>,
    notaries: RwLock<Vec<Party>>,
}

impl NetworkMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-key) an ordinary party
    pub fn register(&self, party: Party) {
        if let Ok(mut parties) = self.parties.write() {
            parties.insert(party.name.clone(), party);
        }
    }

    /// Register a notary. Notaries are also resolvable by name.
    pub fn register_notary(&self, party: Party) {
        self.register(party.clone());
        if let Ok(mut notaries) = self.notaries.write() {
            if !notaries.contains(&party) {
                notaries.push(party);
            }
        }
    }
}

impl IdentityService for NetworkMap {
    fn well_known_party(&self, name: &str) -> Option<Party> {
        self.parties.read().ok()?.get(name).cloned()
    }

    fn party_from_key(&self, key: &PublicKey) -> Option<Party> {
        self.parties
            .read()
            .ok()?
            .values()
            .find(|p| &p.owning_key == key)
            .cloned()
    }

    fn notaries(&self) -> Vec<Party> {
        self.notaries
            .read()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_resolve_by_name_and_key() {
        let map = NetworkMap::new();
        let bank = Party::new("O=Bank", KeyPair::generate().public_key());
        map.register(bank.clone());

        assert_eq!(map.well_known_party("O=Bank"), Some(bank.clone()));
        assert_eq!(map.party_from_key(&bank.owning_key), Some(bank));
        assert_eq!(map.well_known_party("O=Nobody"), None);
    }

    #[test]
    fn test_notaries_are_listed_once() {
        let map = NetworkMap::new();
        let notary = Party::new("O=Notary", KeyPair::generate().public_key());
        map.register_notary(notary.clone());
        map.register_notary(notary.clone());

        assert_eq!(map.notaries(), vec![notary.clone()]);
        assert!(map.is_notary(&notary));
        assert_eq!(map.well_known_party("O=Notary"), Some(notary));
    }

    #[test]
    fn test_same_entity_compares_keys() {
        let key = KeyPair::generate().public_key();
        let a = Party::new("O=A", key);
        let a_alias = Party::new("O=A Holdings", key);
        let b = Party::new("O=B", KeyPair::generate().public_key());

        assert!(a.same_entity(&a_alias));
        assert!(!a.same_entity(&b));
    }
}
