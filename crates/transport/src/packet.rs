// transport/src/packet.rs

use bridge_core::{ChainId, Origin};
use bridge_crypto::{Address, Hash};
use serde::{Deserialize, Serialize};

/// One message in flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Source chain, sender, per-pair nonce and guid
    pub origin: Origin,
    pub dst_chain: ChainId,
    pub receiver: Address,
    pub payload: Vec<u8>,
    pub gas_limit: u64,
}

impl Packet {
    /// `keccak(nonce ‖ src ‖ sender ‖ dst ‖ receiver)`
    pub fn compute_guid(
        nonce: u64,
        src_chain: ChainId,
        sender: &Address,
        dst_chain: ChainId,
        receiver: &Address,
    ) -> Hash {
        Hash::keccak_concat(&[
            &nonce.to_be_bytes(),
            &src_chain.to_be_bytes(),
            sender.as_bytes(),
            &dst_chain.to_be_bytes(),
            receiver.as_bytes(),
        ])
    }

    pub fn guid(&self) -> Hash {
        self.origin.guid
    }

    pub fn pair(&self) -> (ChainId, ChainId) {
        (self.origin.src_chain, self.dst_chain)
    }
}

/// A delivered packet whose handler returned an error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkedPacket {
    pub packet: Packet,
    /// Handler error of the last attempt
    pub reason: String,
    pub attempts: u32,
}

/// Outcome of handing one packet to a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Handler applied the message
    Executed(Hash),
    /// Handler failed; the packet is parked for retry
    Parked { guid: Hash, reason: String },
    /// Guid was already executed; the copy was dropped
    Replayed(Hash),
}

impl Delivery {
    pub fn guid(&self) -> Hash {
        match self {
            Delivery::Executed(guid) | Delivery::Replayed(guid) => *guid,
            Delivery::Parked { guid, .. } => *guid,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, Delivery::Executed(_))
    }
}
