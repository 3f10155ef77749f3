//! # Accord-Lite
//!
//! Multi-party ledger transactions: shared records, contracts that decide
//! whether a change is legal, and a flow protocol that takes a change from
//! draft to a notarised, conflict-free commit on every participant.
//!
//! ## Features
//!
//! - **Pure contract verification** over a closed set of commands
//! - **Canonical encoding** so independently computed signatures match
//! - **Notarised finality** with double-spend exclusion
//! - **Pluggable sessions** (in-memory channels out of the box)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use accord::config::FlowConfig;
//! use accord::crypto::KeyPair;
//! use accord::flow::{Proposal, Sessions};
//! use accord::node::{connect, Network};
//!
//! # async fn demo() -> Result<(), accord::flow::FlowError> {
//! let network = Network::new("O=Notary", KeyPair::generate(), FlowConfig::default());
//! let wallet = network.node("O=Wallet", KeyPair::generate());
//! let bank = network.node("O=Bank", KeyPair::generate());
//!
//! let (to_bank, mut to_wallet) = connect(&wallet, &bank);
//! let proposal = Proposal::CashIn {
//!     counterparty: "O=Bank".into(),
//!     affiliate_account: "AFF-1".into(),
//!     wallet_account: "WAL-1".into(),
//!     amount: "100.00".into(),
//! };
//!
//! let responder = bank.responder();
//! let mut initiator = wallet.initiator(Sessions::from_iter([to_bank]));
//! let (committed, _) = tokio::join!(initiator.run(&proposal), responder.respond(&mut to_wallet));
//! println!("committed {}", committed?.transaction.id());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 FLOW LAYER                  │
//! │  Proposal | Collect | Finality | Responder  │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │                LEDGER LAYER                 │
//! │  State | Contract | Transaction | Vault     │
//! │  Notary | Identity                          │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │               CRYPTO LAYER                  │
//! │  Ed25519 | BLAKE3 | Canonical encoding      │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │             TRANSPORT LAYER                 │
//! │   In-memory sessions | FlowMessage codec    │
//! └─────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod contract;
pub mod crypto;
pub mod encoding;
pub mod flow;
pub mod identity;
pub mod node;
pub mod notary;
pub mod state;
pub mod transaction;
pub mod transport;
pub mod vault;

// Re-export main types at crate root
pub use crypto::{CryptoError, CryptoResult, KeyPair, PublicKey, SecureHash, SignatureBytes, Signer};
pub use flow::FlowError;
pub use identity::Party;
pub use transaction::{SignedTransaction, Transaction};
