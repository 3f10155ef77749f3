//! Multi-party flows
//!
//! An initiator turns a [`Proposal`] into a transaction, verifies and signs it
//! locally, collects the counterparties' signatures one session at a time,
//! has the notary order it and finally distributes the notarised result.
//! Every counterparty runs a [`Responder`] on its end of the session.
//!
//! ```text
//!   Proposal::build ──► collect ──────────────► finality
//!     (vault, ids)      Built                    notary.notarise
//!                       LocalSigned              vault.commit
//!                       Collecting ◄─► sessions  distribute ◄─► sessions
//!                       FullySigned              Committed
//! ```
//!
//! Nothing is read ambiently: the node's collaborators travel in a
//! [`ServiceHub`].

pub mod collect;
pub mod finality;
pub mod hub;
pub mod initiator;
pub mod progress;
pub mod proposal;
pub mod responder;
pub mod session;

pub use collect::{collect_signatures, CollectState};
pub use finality::{finalise, Committed, Undelivered};
pub use hub::ServiceHub;
pub use initiator::Initiator;
pub use progress::{FlowEvent, FlowStep, Progress};
pub use proposal::Proposal;
pub use responder::{Responder, ResponderOutcome};
pub use session::{FlowSession, Sessions};

use thiserror::Error;

use crate::contract::ContractViolation;
use crate::crypto::SecureHash;
use crate::notary::NotaryError;
use crate::state::{ContractId, LinearId, StateRef};
use crate::transaction::TransactionError;
use crate::transport::TransportError;
use crate::vault::VaultError;

/// Suspend points a flow can time out at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Initiator waiting for a signature or decline
    CollectSignatures,
    /// Initiator waiting for the notary
    Notarise,
    /// Initiator waiting for a recorded acknowledgement
    Distribute,
    /// Responder waiting for a proposal
    AwaitProposal,
    /// Responder waiting for the finalised transaction
    AwaitFinality,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::CollectSignatures => "collect-signatures",
            Phase::Notarise => "notarise",
            Phase::Distribute => "distribute",
            Phase::AwaitProposal => "await-proposal",
            Phase::AwaitFinality => "await-finality",
        })
    }
}

/// Why a flow stopped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A contract rule failed; fix the proposal
    #[error("Validation rejected: {0}")]
    ValidationRejected(#[from] ContractViolation),

    /// The record to transition has no live version
    #[error("No unconsumed {contract} record with id {linear_id}")]
    NotFound {
        linear_id: LinearId,
        contract: ContractId,
    },

    /// The record to transition has several live versions
    #[error("{count} unconsumed {contract} records share id {linear_id}")]
    Ambiguous {
        linear_id: LinearId,
        contract: ContractId,
        count: usize,
    },

    /// A counterparty name did not resolve
    #[error("Unknown party: {0}")]
    UnknownParty(String),

    /// A counterparty refused to sign
    #[error("{party} declined: {reason}")]
    CounterpartyDeclined { party: String, reason: String },

    /// A counterparty returned a signature that does not fit the proposal
    #[error("Invalid signature from {party}: {reason}")]
    InvalidCounterpartySignature { party: String, reason: String },

    /// The notary saw an input consumed by another transaction; rebuild
    #[error("Double spend: {state_ref} already consumed by {consumed_by}")]
    DoubleSpendConflict {
        state_ref: StateRef,
        consumed_by: SecureHash,
    },

    /// A suspend point ran out of time
    #[error("Timed out in {phase} waiting for {party}")]
    Timeout { phase: Phase, party: String },

    /// The notary could not be reached; retry with the same transaction
    #[error("Notary unavailable: {0}")]
    NotaryUnavailable(String),

    /// No session is open with a party that must take part
    #[error("No session with {0}")]
    NoSession(String),

    /// A peer sent something the protocol does not allow at this point
    #[error("Protocol violation by {party}: {reason}")]
    Protocol { party: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("Vault error: {0}")]
    Vault(VaultError),

    #[error("Notary refused: {0}")]
    Notary(NotaryError),
}

impl FlowError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::ValidationRejected(_) => "validation-rejected",
            FlowError::NotFound { .. } => "not-found",
            FlowError::Ambiguous { .. } => "ambiguous",
            FlowError::UnknownParty(_) => "unknown-party",
            FlowError::CounterpartyDeclined { .. } => "counterparty-declined",
            FlowError::InvalidCounterpartySignature { .. } => "invalid-counterparty-signature",
            FlowError::DoubleSpendConflict { .. } => "double-spend-conflict",
            FlowError::Timeout { .. } => "timeout",
            FlowError::NotaryUnavailable(_) => "notary-unavailable",
            FlowError::NoSession(_) => "no-session",
            FlowError::Protocol { .. } => "protocol",
            FlowError::Transport(_) => "transport",
            FlowError::Transaction(_) => "transaction",
            FlowError::Vault(_) => "vault",
            FlowError::Notary(_) => "notary",
        }
    }

    /// Worth retrying with the same content
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FlowError::NotaryUnavailable(_) | FlowError::Timeout { .. }
        )
    }
}

impl From<VaultError> for FlowError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::NotFound {
                linear_id,
                contract,
            } => FlowError::NotFound {
                linear_id,
                contract,
            },
            VaultError::Ambiguous {
                linear_id,
                contract,
                count,
            } => FlowError::Ambiguous {
                linear_id,
                contract,
                count,
            },
            other => FlowError::Vault(other),
        }
    }
}

impl From<NotaryError> for FlowError {
    fn from(e: NotaryError) -> Self {
        match e {
            NotaryError::Conflict {
                state_ref,
                consumed_by,
            } => FlowError::DoubleSpendConflict {
                state_ref,
                consumed_by,
            },
            NotaryError::Unavailable(reason) => FlowError::NotaryUnavailable(reason),
            other => FlowError::Notary(other),
        }
    }
}
