// bridge-core/src/access.rs

//! Capability checks evaluated before any mutation.
//!
//! The owner manages the admin set. Admins hold the privileged surface
//! (asset creation, linking, pause flags, curve parameters, rescue). Inbound
//! messages pass only when their origin matches the trusted peer for the
//! source chain.

use crate::transport::Origin;
use crate::types::ChainId;
use crate::{BridgeError, BridgeResult};
use bridge_crypto::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Address,
    admins: BTreeSet<Address>,
    peers: BTreeMap<ChainId, Address>,
}

impl AccessControl {
    pub fn new(owner: Address) -> Self {
        let mut admins = BTreeSet::new();
        admins.insert(owner);
        Self {
            owner,
            admins,
            peers: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn require_admin(&self, caller: &Address) -> BridgeResult<()> {
        if self.admins.contains(caller) {
            Ok(())
        } else {
            Err(BridgeError::Unauthorized {
                caller: *caller,
                role: Role::Admin,
            })
        }
    }

    /// Only the owner manages the admin set; the owner can never be removed
    pub fn grant_admin(&mut self, caller: &Address, admin: Address) -> BridgeResult<()> {
        self.require_owner(caller)?;
        if self.admins.insert(admin) {
            info!(%admin, "Admin granted");
        }
        Ok(())
    }

    pub fn revoke_admin(&mut self, caller: &Address, admin: &Address) -> BridgeResult<()> {
        self.require_owner(caller)?;
        if *admin != self.owner && self.admins.remove(admin) {
            info!(%admin, "Admin revoked");
        }
        Ok(())
    }

    fn require_owner(&self, caller: &Address) -> BridgeResult<()> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(BridgeError::Unauthorized {
                caller: *caller,
                role: Role::Owner,
            })
        }
    }

    pub fn set_peer(&mut self, caller: &Address, chain_id: ChainId, peer: Address) -> BridgeResult<()> {
        self.require_admin(caller)?;
        self.peers.insert(chain_id, peer);
        Ok(())
    }

    pub fn peer(&self, chain_id: ChainId) -> Option<Address> {
        self.peers.get(&chain_id).copied()
    }

    /// Transport-tier check for an inbound message
    pub fn require_peer(&self, origin: &Origin) -> BridgeResult<()> {
        match self.peers.get(&origin.src_chain) {
            Some(peer) if *peer == origin.sender => Ok(()),
            _ => {
                warn!(chain_id = origin.src_chain, sender = %origin.sender, "Untrusted origin");
                Err(BridgeError::UntrustedPeer {
                    chain_id: origin.src_chain,
                    sender: origin.sender,
                })
            }
        }
    }
}
