//! Frames exchanged during signature collection and finality
//!
//! Wire layout: one tag byte, then the payload. Transactions travel as
//! length-prefixed (u32) serialized [`SignedTransaction`]s; short fields use a
//! u16 length prefix.

use super::{TransportError, TransportResult};
use crate::crypto::{PublicKey, SecureHash, SignatureBytes};
use crate::transaction::{SignedTransaction, TransactionSignature};

const TAG_PROPOSAL: u8 = 0x20;
const TAG_SIGNATURE: u8 = 0x21;
const TAG_DECLINE: u8 = 0x22;
const TAG_FINALISED: u8 = 0x30;
const TAG_RECORDED: u8 = 0x31;
const TAG_CLOSE: u8 = 0xFF;

/// A protocol message on a flow session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowMessage {
    /// Initiator asks the counterparty to check and sign
    Proposal(SignedTransaction),

    /// Counterparty's signature over the proposal
    Signature(TransactionSignature),

    /// Counterparty refuses to sign
    Decline {
        /// Why
        reason: String,
    },

    /// The notarised transaction, for recording
    Finalised(SignedTransaction),

    /// Counterparty has recorded the finalised transaction
    Recorded {
        /// The recorded transaction
        tx_id: SecureHash,
    },

    /// Initiator abandoned the negotiation
    Close {
        /// Reason for closing
        reason: String,
    },
}

impl FlowMessage {
    /// Short name of the message kind, for logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            FlowMessage::Proposal(_) => "proposal",
            FlowMessage::Signature(_) => "signature",
            FlowMessage::Decline { .. } => "decline",
            FlowMessage::Finalised(_) => "finalised",
            FlowMessage::Recorded { .. } => "recorded",
            FlowMessage::Close { .. } => "close",
        }
    }

    /// Serialize message to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        match self {
            FlowMessage::Proposal(stx) => {
                bytes.push(TAG_PROPOSAL);
                write_vec32(&mut bytes, &stx.to_bytes());
            }
            FlowMessage::Signature(signature) => {
                bytes.push(TAG_SIGNATURE);
                write_vec16(&mut bytes, signature.signer.as_bytes());
                write_vec16(&mut bytes, signature.signature.as_bytes());
            }
            FlowMessage::Decline { reason } => {
                bytes.push(TAG_DECLINE);
                write_str16(&mut bytes, reason);
            }
            FlowMessage::Finalised(stx) => {
                bytes.push(TAG_FINALISED);
                write_vec32(&mut bytes, &stx.to_bytes());
            }
            FlowMessage::Recorded { tx_id } => {
                bytes.push(TAG_RECORDED);
                write_vec16(&mut bytes, tx_id.as_bytes());
            }
            FlowMessage::Close { reason } => {
                bytes.push(TAG_CLOSE);
                write_str16(&mut bytes, reason);
            }
        }

        bytes
    }

    /// Deserialize message from bytes
    pub fn from_bytes(bytes: &[u8]) -> TransportResult<Self> {
        let Some((&tag, rest)) = bytes.split_first() else {
            return Err(TransportError::InvalidData("Empty message".to_string()));
        };

        match tag {
            TAG_PROPOSAL => Ok(FlowMessage::Proposal(read_transaction(rest)?)),
            TAG_SIGNATURE => {
                let (signer, rest) = read_vec16(rest)?;
                let (signature, _) = read_vec16(rest)?;
                Ok(FlowMessage::Signature(TransactionSignature {
                    signer: PublicKey::from_bytes(&signer).map_err(invalid)?,
                    signature: SignatureBytes::from_bytes(&signature).map_err(invalid)?,
                }))
            }
            TAG_DECLINE => Ok(FlowMessage::Decline {
                reason: read_string(rest)?,
            }),
            TAG_FINALISED => Ok(FlowMessage::Finalised(read_transaction(rest)?)),
            TAG_RECORDED => {
                let (tx_id, _) = read_vec16(rest)?;
                Ok(FlowMessage::Recorded {
                    tx_id: SecureHash::from_bytes(&tx_id).map_err(invalid)?,
                })
            }
            TAG_CLOSE => Ok(FlowMessage::Close {
                reason: read_string(rest)?,
            }),
            _ => Err(TransportError::InvalidData(format!(
                "Unknown message type: {:#x}",
                tag
            ))),
        }
    }
}

fn invalid(e: impl std::fmt::Display) -> TransportError {
    TransportError::InvalidData(e.to_string())
}

fn read_transaction(bytes: &[u8]) -> TransportResult<SignedTransaction> {
    let (payload, _) = read_vec32(bytes)?;
    SignedTransaction::from_bytes(&payload).map_err(invalid)
}

fn read_string(bytes: &[u8]) -> TransportResult<String> {
    let (raw, _) = read_vec16(bytes)?;
    String::from_utf8(raw).map_err(invalid)
}

fn write_vec16(out: &mut Vec<u8>, data: &[u8]) {
    let data = &data[..data.len().min(u16::MAX as usize)];
    out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    out.extend_from_slice(data);
}

/// Reasons longer than a u16 prefix allows are cut at a char boundary
fn write_str16(out: &mut Vec<u8>, s: &str) {
    let mut end = s.len().min(u16::MAX as usize);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    write_vec16(out, &s.as_bytes()[..end]);
}

fn write_vec32(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
}

/// Helper: read a length-prefixed vector (16-bit length)
fn read_vec16(bytes: &[u8]) -> TransportResult<(Vec<u8>, &[u8])> {
    if bytes.len() < 2 {
        return Err(TransportError::InvalidData("Not enough data".to_string()));
    }

    let len = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
    let rest = &bytes[2..];

    if rest.len() < len {
        return Err(TransportError::InvalidData("Not enough data".to_string()));
    }

    Ok((rest[..len].to_vec(), &rest[len..]))
}

/// Helper: read a length-prefixed vector (32-bit length)
fn read_vec32(bytes: &[u8]) -> TransportResult<(Vec<u8>, &[u8])> {
    if bytes.len() < 4 {
        return Err(TransportError::InvalidData("Not enough data".to_string()));
    }

    let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let rest = &bytes[4..];

    if rest.len() < len {
        return Err(TransportError::InvalidData("Not enough data".to_string()));
    }

    Ok((rest[..len].to_vec(), &rest[len..]))
}
