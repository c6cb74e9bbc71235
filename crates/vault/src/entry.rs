// vault/src/entry.rs

use bridge_core::{Amount, DecimalsDelta, LinkEntry};
use bridge_crypto::Address;
use serde::{Deserialize, Serialize};

/// Admin input for registering a token with the vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    /// Token contract on this chain
    pub remote_token: Address,
    /// Synthetic token on the hub it backs
    pub synthetic_token: Address,
    pub synthetic_decimals: u8,
    #[serde(default)]
    pub min_bridge_amount: Amount,
    #[serde(default)]
    pub paused: bool,
}

/// A bridgeable token as the vault sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    pub remote_token: Address,
    pub remote_decimals: u8,
    pub synthetic_token: Address,
    pub synthetic_decimals: u8,
    pub decimals_delta: DecimalsDelta,
    /// Smallest deposit accepted, in this chain's precision
    pub min_bridge_amount: Amount,
    pub paused: bool,
    /// Custody attributed to bridged deposits
    pub vault_balance: Amount,
}

impl VaultEntry {
    /// Wire form announced to the hub
    pub fn to_link_entry(&self) -> LinkEntry {
        LinkEntry {
            remote_token: self.remote_token,
            remote_decimals: self.remote_decimals,
            synthetic_token: self.synthetic_token,
            synthetic_decimals: self.synthetic_decimals,
            decimals_delta: self.decimals_delta,
            min_bridge_amount: self.min_bridge_amount.clone(),
            paused: self.paused,
        }
    }
}
