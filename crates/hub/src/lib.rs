// hub/src/lib.rs

//! Hub-chain accounting for bridged assets
//!
//! The hub is the single source of truth for synthetic balances:
//! - Synthetic asset registry with stable 1-based indices
//! - Links between synthetic assets and remote-chain tokens
//! - Minting on deposit reports, burning on bridge-out
//! - Penalty and bonus pricing through the balancer
//! - Release messages back to remote vaults

pub mod asset;
pub mod events;
pub mod ledger;
pub mod quote;

pub use asset::{RemoteLink, SyntheticAsset};
pub use events::HubEvent;
pub use ledger::HubLedger;
pub use quote::{AssetQuote, BridgeOutQuote, BridgeOutReceipt};

use balancer::BalancerError;
use bridge_core::{Amount, AssetIndex, BridgeError, ChainId};
use bridge_crypto::Address;

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;

/// Errors that can occur in hub operations
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Balancer error: {0}")]
    Balancer(#[from] BalancerError),

    #[error("Synthetic asset not found: {0}")]
    AssetNotFound(Address),

    #[error("Synthetic asset index not found: {0}")]
    AssetIndexNotFound(AssetIndex),

    #[error("Synthetic asset is paused: {0}")]
    AssetPaused(Address),

    #[error("Asset {asset} is not linked to chain {chain_id}")]
    LinkNotFound { asset: Address, chain_id: ChainId },

    #[error("Link of {asset} to chain {chain_id} is paused")]
    LinkPaused { asset: Address, chain_id: ChainId },

    #[error("Remote token {token} on chain {chain_id} is not linked")]
    RemoteTokenNotLinked { chain_id: ChainId, token: Address },

    #[error("Remote token {token} on chain {chain_id} already backs another asset")]
    RemoteTokenInUse { chain_id: ChainId, token: Address },

    #[error("Decimals mismatch for {asset}: asset has {expected}, link says {actual}")]
    DecimalsMismatch { asset: Address, expected: u8, actual: u8 },

    #[error("Invalid link entry for {asset}: {reason}")]
    InvalidLinkEntry { asset: Address, reason: String },

    #[error("Link of {asset} to chain {chain_id} still has locked assets")]
    LinkLocked { asset: Address, chain_id: ChainId },

    #[error("Duplicate asset in batch: {0}")]
    DuplicateAsset(Address),

    #[error("Empty batch")]
    EmptyBatch,

    #[error("Amount too small: {amount} of {asset}")]
    AmountTooSmall { asset: Address, amount: Amount },

    #[error("Insufficient balance on destination chain {chain_id} for {asset}: required {required}, locked {available}")]
    InsufficientBalanceOnDestChain {
        asset: Address,
        chain_id: ChainId,
        required: Amount,
        available: Amount,
    },

    #[error("Unexpected {0} message")]
    UnexpectedPayload(&'static str),
}
