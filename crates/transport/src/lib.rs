// transport/src/lib.rs

//! In-process interchain transport
//!
//! This crate implements the message layer the bridge endpoints talk over
//! when everything runs in one process:
//! - One FIFO channel per (source, destination) chain pair
//! - Per-pair nonces and globally unique packet ids
//! - Fee quotes from a configurable schedule
//! - At-least-once delivery with replay detection
//! - Parking of packets whose handler failed, with operator retry

pub mod fees;
pub mod network;
pub mod packet;

pub use fees::FeeSchedule;
pub use network::{LocalEndpoint, LocalNetwork};
pub use packet::{Delivery, Packet, ParkedPacket};

use bridge_core::{BridgeError, ChainId};
use bridge_crypto::Hash;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur while moving packets
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("No endpoint registered for chain {0}")]
    UnknownEndpoint(ChainId),

    #[error("Endpoint for chain {0} already registered")]
    DuplicateEndpoint(ChainId),

    #[error("Packet not found: {0}")]
    PacketNotFound(Hash),

    #[error("Packet {guid} is addressed to chain {expected}, not {actual}")]
    WrongDestination {
        guid: Hash,
        expected: ChainId,
        actual: ChainId,
    },
}

impl From<TransportError> for BridgeError {
    fn from(err: TransportError) -> Self {
        BridgeError::Transport(err.to_string())
    }
}
