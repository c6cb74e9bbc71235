// bridge-core/src/lib.rs

//! Core bridge data structures shared by the hub, the vaults and the transport
//!
//! This crate provides:
//! - Amount and identifier types
//! - Decimal normalization between remote and hub precision
//! - Interchain wire messages and their codec
//! - The transport and message-handler seams
//! - A multi-token ledger used as the custody / mint-burn primitive
//! - Role-based access control

pub mod access;
pub mod decimals;
pub mod ledger;
pub mod message;
pub mod transport;
pub mod types;

pub use access::{AccessControl, Role};
pub use decimals::{decimals_delta, to_hub, to_remote, trim_dust, DecimalsDelta};
pub use ledger::TokenLedger;
pub use message::{Asset, DepositMessage, LinkEntry, LinkMessage, Payload, ReleaseMessage};
pub use transport::{MessageHandler, MessagingFee, MessagingReceipt, Origin, Transport, TransportOptions};
pub use types::*;

use bridge_crypto::Address;

/// Result type for shared bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised by the shared primitives
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Unauthorized: {caller} lacks {role:?} capability")]
    Unauthorized { caller: Address, role: Role },

    #[error("Untrusted origin: chain {chain_id} sender {sender}")]
    UntrustedPeer { chain_id: ChainId, sender: Address },

    #[error("Insufficient balance of {token} for {holder}: required {required}, available {available}")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Unknown token: {0}")]
    UnknownToken(Address),

    #[error("Decimals out of range: synthetic {synthetic}, remote {remote}")]
    DecimalsOutOfRange { synthetic: u8, remote: u8 },

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
