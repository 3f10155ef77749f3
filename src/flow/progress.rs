//! Flow progress events
//!
//! Flows announce each step they complete. Events are for observers only;
//! nothing in a flow waits on or reacts to them, and an event with no
//! subscriber is dropped.

use tokio::sync::broadcast;

use crate::crypto::SecureHash;

const EVENT_BUFFER: usize = 256;

/// A completed step
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowStep {
    /// Contract rules passed locally
    Verified,
    /// Our own signature is attached
    LocalSigned,
    /// Named counterparty returned a valid signature
    CounterpartySigned(String),
    /// Every required signer has signed
    FullySigned,
    /// The notary ordered the transaction
    Notarised,
    /// Committed to our vault
    Recorded,
    /// Named participant acknowledged the finalised transaction
    Distributed(String),
    /// The attempt ended with the given error kind
    Rejected(&'static str),
}

/// Step completed for one transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowEvent {
    pub tx_id: SecureHash,
    pub step: FlowStep,
}

/// Broadcast point for [`FlowEvent`]s
#[derive(Clone, Debug)]
pub struct Progress {
    sender: broadcast::Sender<FlowEvent>,
}

impl Default for Progress {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Progress { sender }
    }
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, tx_id: SecureHash, step: FlowStep) {
        let _ = self.sender.send(FlowEvent { tx_id, step });
    }
}
