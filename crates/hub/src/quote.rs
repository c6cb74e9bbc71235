// hub/src/quote.rs

use bridge_core::{Amount, MessagingFee, MessagingReceipt};
use bridge_crypto::Address;
use serde::{Deserialize, Serialize};

/// Pricing of one asset of a bridge-out batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQuote {
    pub synthetic_token: Address,
    pub remote_token: Address,
    /// Hub amount burned from the holder (requested amount minus dust)
    pub burned: Amount,
    /// Hub amount withheld and banked in the bonus pool
    pub penalty: Amount,
    /// Custody leaving `total_locked`, in remote precision
    pub remote_amount: Amount,
    /// What the recipient receives on the destination chain
    pub net_remote: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeOutQuote {
    pub assets: Vec<AssetQuote>,
    pub fee: MessagingFee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeOutReceipt {
    pub assets: Vec<AssetQuote>,
    pub receipt: MessagingReceipt,
}
