// hub/src/events.rs

use bridge_core::{Amount, AssetIndex, ChainId};
use bridge_crypto::Address;
use serde::{Deserialize, Serialize};

/// State transitions recorded by the hub, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HubEvent {
    AssetCreated {
        index: AssetIndex,
        address: Address,
        symbol: String,
        decimals: u8,
    },
    Linked {
        asset: Address,
        chain_id: ChainId,
        remote_token: Address,
        gateway: Address,
    },
    Minted {
        asset: Address,
        chain_id: ChainId,
        recipient: Address,
        amount: Amount,
        bonus: Amount,
    },
    BridgedOut {
        asset: Address,
        chain_id: ChainId,
        holder: Address,
        recipient: Address,
        burned: Amount,
        penalty: Amount,
        net_remote: Amount,
    },
    PauseChanged {
        asset: Address,
        /// `None` for the asset-wide flag
        chain_id: Option<ChainId>,
        paused: bool,
    },
}
