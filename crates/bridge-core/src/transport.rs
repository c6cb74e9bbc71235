// bridge-core/src/transport.rs

//! The seam between bridge endpoints and whatever carries their messages.
//!
//! Guarantees expected from an implementation: at-least-once delivery,
//! ordering per (source, destination) pair, and a quotable fee. Nothing is
//! assumed about ordering across different pairs.

use crate::types::{Amount, ChainId};
use crate::BridgeResult;
use bridge_crypto::{Address, Hash};
use serde::{Deserialize, Serialize};

/// Default gas budget requested for executing a message on the destination
pub const DEFAULT_GAS_LIMIT: u64 = 500_000;

/// Per-message execution options forwarded to the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportOptions {
    pub gas_limit: u64,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self { gas_limit: DEFAULT_GAS_LIMIT }
    }
}

/// Fee charged by the transport for one message
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessagingFee {
    pub native_fee: Amount,
}

/// Proof that a message was accepted for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingReceipt {
    pub guid: Hash,
    pub nonce: u64,
    pub fee: MessagingFee,
}

/// Where a delivered message came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub src_chain: ChainId,
    pub sender: Address,
    pub nonce: u64,
    pub guid: Hash,
}

/// Outbound half: what an endpoint uses to talk to other chains
pub trait Transport {
    /// Chain this endpoint lives on
    fn local_chain(&self) -> ChainId;

    /// Address the endpoint sends from (checked by the receiver's peer table)
    fn local_address(&self) -> Address;

    /// Fee that `send` would charge for this payload
    fn quote(&self, dest: ChainId, payload: &[u8], options: &TransportOptions) -> BridgeResult<MessagingFee>;

    /// Accept a message for delivery to the endpoint on `dest`
    fn send(&mut self, dest: ChainId, payload: Vec<u8>, options: &TransportOptions) -> BridgeResult<MessagingReceipt>;
}

/// Inbound half: implemented by the hub and by every vault.
///
/// A handler must either apply the whole message or nothing; the transport
/// keeps failed messages for a later retry.
pub trait MessageHandler {
    type Error: std::error::Error;

    fn on_receive(&mut self, origin: &Origin, payload: &[u8]) -> Result<(), Self::Error>;
}
