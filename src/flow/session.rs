//! Sessions with counterparties
//!
//! A [`FlowSession`] pairs a counterparty with a transport and turns frames
//! into [`FlowMessage`]s. Every receive is bounded: running out of time
//! surfaces as [`FlowError::Timeout`] naming the phase and the party.

use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use super::{FlowError, Phase};
use crate::crypto::PublicKey;
use crate::identity::Party;
use crate::transport::{FlowMessage, Transport};

/// One end of a conversation with a counterparty
pub struct FlowSession {
    counterparty: Party,
    transport: Box<dyn Transport>,
}

impl FlowSession {
    /// Talk to `counterparty` over `transport`
    pub fn new(counterparty: Party, transport: impl Transport + 'static) -> Self {
        FlowSession {
            counterparty,
            transport: Box::new(transport),
        }
    }

    /// Who is on the other end
    pub fn counterparty(&self) -> &Party {
        &self.counterparty
    }

    /// Send one message
    pub async fn send(&mut self, message: &FlowMessage) -> Result<(), FlowError> {
        debug!(party = %self.counterparty, kind = message.kind(), "send");
        self.transport.send(&message.to_bytes()).await?;
        Ok(())
    }

    /// Wait up to `wait` for the next message
    pub async fn receive(&mut self, phase: Phase, wait: Duration) -> Result<FlowMessage, FlowError> {
        let frame = timeout(wait, self.transport.receive())
            .await
            .map_err(|_| FlowError::Timeout {
                phase,
                party: self.counterparty.name.clone(),
            })??;
        let message = FlowMessage::from_bytes(&frame)?;
        debug!(party = %self.counterparty, kind = message.kind(), %phase, "receive");
        Ok(message)
    }

    /// Tell the peer the conversation is over. Best effort.
    pub async fn close(&mut self, reason: &str) {
        if !self.transport.is_connected() {
            return;
        }
        let _ = self
            .send(&FlowMessage::Close {
                reason: reason.to_string(),
            })
            .await;
        let _ = self.transport.close().await;
    }

    /// Build a protocol violation naming this session's counterparty
    pub fn unexpected(&self, message: &FlowMessage, phase: Phase) -> FlowError {
        FlowError::Protocol {
            party: self.counterparty.name.clone(),
            reason: format!("unexpected {} message in {}", message.kind(), phase),
        }
    }
}

impl std::fmt::Debug for FlowSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowSession")
            .field("counterparty", &self.counterparty.name)
            .field("connected", &self.transport.is_connected())
            .finish()
    }
}

/// The initiator's open sessions, looked up by counterparty key
#[derive(Debug, Default)]
pub struct Sessions {
    sessions: Vec<FlowSession>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session, replacing any earlier one with the same counterparty
    pub fn insert(&mut self, session: FlowSession) {
        self.sessions
            .retain(|s| !s.counterparty.same_entity(&session.counterparty));
        self.sessions.push(session);
    }

    /// Session with the owner of `key`
    pub fn get_mut(&mut self, key: &PublicKey) -> Option<&mut FlowSession> {
        self.sessions
            .iter_mut()
            .find(|s| s.counterparty.owning_key == *key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every session
    pub async fn close_all(&mut self, reason: &str) {
        for session in &mut self.sessions {
            session.close(reason).await;
        }
    }
}

impl FromIterator<FlowSession> for Sessions {
    fn from_iter<I: IntoIterator<Item = FlowSession>>(iter: I) -> Self {
        let mut sessions = Sessions::new();
        for session in iter {
            sessions.insert(session);
        }
        sessions
    }
}
