// query/src/query.rs

use crate::types::{AssetInfo, RemoteLinkInfo};
use crate::{QueryError, QueryResult};
use bridge_core::{Amount, AssetIndex, ChainId, Transport};
use bridge_crypto::Address;
use hub::{HubLedger, SyntheticAsset};

/// Borrowed read view of a hub
pub struct HubQuery<'a, T: Transport> {
    hub: &'a HubLedger<T>,
}

impl<'a, T: Transport> HubQuery<'a, T> {
    pub fn new(hub: &'a HubLedger<T>) -> Self {
        Self { hub }
    }

    pub fn asset_count(&self) -> usize {
        self.hub.asset_count()
    }

    fn info(&self, asset: &SyntheticAsset) -> AssetInfo {
        let links = asset
            .chain_list
            .iter()
            .map(|chain_id| match self.hub.link(asset.index, *chain_id) {
                Some(link) => RemoteLinkInfo::from_link(*chain_id, link),
                None => RemoteLinkInfo::empty(*chain_id),
            })
            .collect();

        AssetInfo {
            index: asset.index,
            address: asset.address,
            symbol: asset.symbol.clone(),
            decimals: asset.decimals,
            paused: asset.paused,
            total_supply: self.hub.tokens().total_supply(&asset.address),
            chain_list: asset.chain_list.clone(),
            links,
        }
    }

    pub fn asset_info(&self, index: AssetIndex) -> QueryResult<AssetInfo> {
        self.hub
            .asset(index)
            .map(|asset| self.info(asset))
            .ok_or_else(|| QueryError::NotFound(format!("asset index {index}")))
    }

    /// Info for each index; an empty list means every asset
    pub fn assets_info(&self, indices: &[AssetIndex]) -> QueryResult<Vec<AssetInfo>> {
        if indices.is_empty() {
            return Ok(self.hub.assets().iter().map(|asset| self.info(asset)).collect());
        }
        indices.iter().map(|index| self.asset_info(*index)).collect()
    }

    /// Link snapshot, zeroed when the pair is unknown
    pub fn remote_link_info(&self, synthetic: &Address, chain_id: ChainId) -> RemoteLinkInfo {
        let index = self.hub.asset_index_of(synthetic);
        match self.hub.link(index, chain_id) {
            Some(link) => RemoteLinkInfo::from_link(chain_id, link),
            None => RemoteLinkInfo::empty(chain_id),
        }
    }

    pub fn remote_address_for(&self, chain_id: ChainId, synthetic: &Address) -> Address {
        self.hub
            .remote_for_synthetic(chain_id, synthetic)
            .unwrap_or_default()
    }

    pub fn synthetic_address_for(&self, chain_id: ChainId, remote: &Address) -> Address {
        self.hub
            .synthetic_for_remote(chain_id, remote)
            .unwrap_or_default()
    }

    /// 0 when the address is not a synthetic asset
    pub fn asset_index_of(&self, address: &Address) -> AssetIndex {
        self.hub.asset_index_of(address)
    }

    pub fn synthetic_asset_index(&self, address: &Address) -> QueryResult<AssetIndex> {
        match self.hub.asset_index_of(address) {
            0 => Err(QueryError::NotFound(format!("synthetic asset {address}"))),
            index => Ok(index),
        }
    }

    pub fn is_registered(&self, address: &Address) -> bool {
        self.hub.asset_index_of(address) != 0
    }

    pub fn gateway_vault_for(&self, chain_id: ChainId) -> Address {
        self.hub.gateway_vault(chain_id).unwrap_or_default()
    }

    pub fn bonus_balance(&self, synthetic: &Address, chain_id: ChainId) -> Amount {
        self.remote_link_info(synthetic, chain_id).bonus_pool
    }

    pub fn balance_of(&self, synthetic: &Address, holder: &Address) -> Amount {
        self.hub.tokens().balance_of(synthetic, holder)
    }

    pub fn total_supply(&self, synthetic: &Address) -> Amount {
        self.hub.tokens().total_supply(synthetic)
    }

    pub fn chain_list(&self, index: AssetIndex) -> QueryResult<Vec<ChainId>> {
        self.hub
            .asset(index)
            .map(|asset| asset.chain_list.clone())
            .ok_or_else(|| QueryError::NotFound(format!("asset index {index}")))
    }
}
