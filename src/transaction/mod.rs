//! Transactions
//!
//! A [`Transaction`] proposes consuming some record versions and producing
//! new ones under a single command. Its identifier is the BLAKE3 digest of its
//! canonical encoding, so every signature over the id commits to the exact
//! content. [`SignedTransaction`] accumulates those signatures until the
//! notary's closes it.

pub mod builder;
pub mod signed;
pub mod verify;

pub use builder::TransactionBuilder;
pub use signed::{SignedTransaction, TransactionError, TransactionSignature};
pub use verify::{verify_transaction_standalone, VerificationReport};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::contract::Command;
use crate::crypto::{PublicKey, SecureHash};
use crate::encoding::{Canonical, CanonicalWriter};
use crate::identity::Party;
use crate::state::{ContractId, State, StateAndRef, StateRef};

/// A proposed ledger update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Record versions consumed, with their provenance
    pub inputs: Vec<StateAndRef>,
    /// Record versions produced
    pub outputs: Vec<State>,
    /// The intent and its required signers
    pub command: Option<Command>,
    /// Ordering authority that must see the inputs unconsumed
    pub notary: Party,
}

impl Transaction {
    /// Content identifier
    pub fn id(&self) -> SecureHash {
        SecureHash::of(&self.canonical_bytes())
    }

    /// The command, if any
    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }

    /// Command signers plus the owning key of every output participant
    pub fn required_signers(&self) -> BTreeSet<PublicKey> {
        let mut keys: BTreeSet<PublicKey> = self
            .command
            .iter()
            .flat_map(|c| c.signers.iter().copied())
            .collect();
        for state in &self.outputs {
            keys.extend(state.participants().into_iter().map(|p| p.owning_key));
        }
        keys
    }

    /// Contracts governing any input or output, in a fixed order
    pub fn contracts(&self) -> BTreeSet<ContractId> {
        self.inputs
            .iter()
            .map(|i| i.state.contract())
            .chain(self.outputs.iter().map(State::contract))
            .collect()
    }

    /// Everyone holding a stake in an output or input, first appearance
    /// first, one entry per owning key
    pub fn participants(&self) -> Vec<Party> {
        let mut seen = BTreeSet::new();
        let mut parties = Vec::new();
        let states = self
            .outputs
            .iter()
            .chain(self.inputs.iter().map(|i| &i.state));
        for state in states {
            for party in state.participants() {
                if seen.insert(party.owning_key) {
                    parties.push(party.clone());
                }
            }
        }
        parties
    }

    /// Reference to output `index` of this transaction
    pub fn output_ref(&self, index: u32) -> StateRef {
        StateRef::new(self.id(), index)
    }

    /// Every output paired with its reference
    pub fn out_refs(&self) -> Vec<StateAndRef> {
        let id = self.id();
        self.outputs
            .iter()
            .enumerate()
            .map(|(index, state)| StateAndRef {
                state: state.clone(),
                reference: StateRef::new(id, index as u32),
            })
            .collect()
    }
}

impl Canonical for Transaction {
    fn encode(&self, out: &mut CanonicalWriter) {
        out.seq(&self.inputs).seq(&self.outputs);
        match &self.command {
            Some(command) => out.tag(1).value(command),
            None => out.tag(0),
        };
        out.value(&self.notary);
    }
}
