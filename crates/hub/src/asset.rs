// hub/src/asset.rs

use bridge_core::{Amount, AssetIndex, ChainId, DecimalsDelta};
use bridge_crypto::Address;
use serde::{Deserialize, Serialize};

/// A fungible hub balance backed by custody on remote chains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticAsset {
    /// 1-based, never reused
    pub index: AssetIndex,
    pub symbol: String,
    pub decimals: u8,
    pub address: Address,
    pub paused: bool,
    /// Linked chains, sorted and unique; only grows
    pub chain_list: Vec<ChainId>,
}

impl SyntheticAsset {
    /// Deterministic token address for an asset created by `hub`
    pub fn derive_address(hub: &Address, index: AssetIndex, symbol: &str) -> Address {
        Address::derive(&[b"synthetic", hub.as_bytes(), &index.to_be_bytes(), symbol.as_bytes()])
    }

    /// Insert `chain_id` keeping the list sorted; returns false if present
    pub fn add_chain(&mut self, chain_id: ChainId) -> bool {
        match self.chain_list.binary_search(&chain_id) {
            Ok(_) => false,
            Err(position) => {
                self.chain_list.insert(position, chain_id);
                true
            }
        }
    }
}

/// State of one (synthetic asset, remote chain) pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteLink {
    pub remote_token: Address,
    /// `synthetic decimals − remote decimals`
    pub decimals_delta: DecimalsDelta,
    /// Custody backing hub supply, in remote precision
    pub total_locked: Amount,
    /// Banked penalties, in hub precision
    pub bonus_pool: Amount,
    pub paused: bool,
}
