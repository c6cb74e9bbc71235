// bridge-core/src/message.rs

use crate::decimals::DecimalsDelta;
use crate::types::Amount;
use crate::{BridgeError, BridgeResult};
use bridge_crypto::Address;
use serde::{Deserialize, Serialize};

/// A token and an amount, in the precision of the chain the token lives on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub token: Address,
    pub amount: Amount,
}

impl Asset {
    pub fn new(token: Address, amount: Amount) -> Self {
        Self { token, amount }
    }
}

/// Interchain payloads exchanged between vaults and the hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Vault → hub: register or update bridgeable assets
    Link(LinkMessage),
    /// Vault → hub: assets locked in custody for `recipient`
    Deposit(DepositMessage),
    /// Hub → vault: release custody to `recipient`
    Release(ReleaseMessage),
}

/// One bridgeable asset configuration as announced by a vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub remote_token: Address,
    pub remote_decimals: u8,
    pub synthetic_token: Address,
    pub synthetic_decimals: u8,
    pub decimals_delta: DecimalsDelta,
    pub min_bridge_amount: Amount,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMessage {
    pub entries: Vec<LinkEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositMessage {
    pub recipient: Address,
    /// Remote token addresses and raw remote amounts
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMessage {
    pub recipient: Address,
    /// Remote token addresses and net remote amounts
    pub assets: Vec<Asset>,
}

impl Payload {
    /// Encode for the wire
    pub fn encode(&self) -> BridgeResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| BridgeError::Codec(e.to_string()))
    }

    /// Decode a wire payload
    pub fn decode(bytes: &[u8]) -> BridgeResult<Self> {
        bincode::deserialize(bytes).map_err(|e| BridgeError::Codec(e.to_string()))
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Link(_) => "link",
            Payload::Deposit(_) => "deposit",
            Payload::Release(_) => "release",
        }
    }
}
