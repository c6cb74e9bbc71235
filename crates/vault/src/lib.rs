// vault/src/lib.rs

//! Remote-chain custody for bridged assets
//!
//! One vault lives on every remote chain. It:
//! - keeps the registry of bridgeable tokens and announces it to the hub
//! - locks deposits and reports them to the hub
//! - releases custody when the hub says so
//! - offers admins a break-glass rescue path

pub mod entry;
pub mod vault;

pub use entry::{LinkRequest, VaultEntry};
pub use vault::RemoteVault;

use bridge_core::{Amount, BridgeError};
use bridge_crypto::Address;

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors that can occur in vault operations
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Vault is paused")]
    VaultPaused,

    #[error("Asset not registered: {0}")]
    UnknownAsset(Address),

    #[error("Asset is paused: {0}")]
    AssetPaused(Address),

    #[error("Zero amount for {0}")]
    ZeroAmount(Address),

    #[error("Amount {amount} of {token} is below minimum bridge amount {minimum}")]
    BelowMinimum {
        token: Address,
        amount: Amount,
        minimum: Amount,
    },

    #[error("Duplicate asset in batch: {0}")]
    DuplicateAsset(Address),

    #[error("Empty batch")]
    EmptyBatch,

    #[error("Insufficient custody of {token}: required {required}, tracked {available}")]
    InsufficientCustody {
        token: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Unexpected {0} message")]
    UnexpectedPayload(&'static str),
}
