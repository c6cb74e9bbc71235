// query/src/types.rs

use bridge_core::{Amount, AssetIndex, ChainId, DecimalsDelta};
use bridge_crypto::Address;
use hub::RemoteLink;
use serde::{Deserialize, Serialize};

/// Snapshot of one (asset, chain) link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLinkInfo {
    pub chain_id: ChainId,
    pub remote_token: Address,
    pub decimals_delta: DecimalsDelta,
    pub total_locked: Amount,
    pub bonus_pool: Amount,
    pub paused: bool,
}

impl RemoteLinkInfo {
    pub fn from_link(chain_id: ChainId, link: &RemoteLink) -> Self {
        Self {
            chain_id,
            remote_token: link.remote_token,
            decimals_delta: link.decimals_delta,
            total_locked: link.total_locked.clone(),
            bonus_pool: link.bonus_pool.clone(),
            paused: link.paused,
        }
    }

    /// All-zero view returned for pairs that were never linked
    pub fn empty(chain_id: ChainId) -> Self {
        Self::from_link(chain_id, &RemoteLink::default())
    }
}

/// Asset metadata together with every linked chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub index: AssetIndex,
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub paused: bool,
    pub total_supply: Amount,
    pub chain_list: Vec<ChainId>,
    pub links: Vec<RemoteLinkInfo>,
}
