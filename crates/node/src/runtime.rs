// node/src/runtime.rs
use crate::config::BridgeConfig;
use balancer::BalancerConfig;
use bridge_core::{Amount, Asset, ChainId, TokenLedger, TransportOptions};
use bridge_crypto::Address;
use hub::{BridgeOutReceipt, HubEvent, HubLedger};
use query::{AssetInfo, HubQuery};
use serde::Serialize;
use std::collections::BTreeMap;
use transport::{Delivery, LocalEndpoint, LocalNetwork, ParkedPacket};
use vault::{LinkRequest, RemoteVault, VaultEntry};

/// One hub and its remote vaults wired over an in-process network
pub struct Devnet {
    config: BridgeConfig,
    network: LocalNetwork,
    hub: HubLedger<LocalEndpoint>,
    vaults: BTreeMap<ChainId, RemoteVault<LocalEndpoint>>,
    /// Synthetic addresses by symbol
    synthetics: BTreeMap<String, Address>,
    options: TransportOptions,
}

/// Serializable picture of the whole devnet
#[derive(Debug, Clone, Serialize)]
pub struct DevnetStatus {
    pub hub_chain: ChainId,
    pub assets: Vec<AssetInfo>,
    pub vaults: Vec<VaultStatus>,
    pub pending_packets: usize,
    pub executed_packets: usize,
    pub parked: Vec<ParkedSummary>,
    pub fees_collected: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultStatus {
    pub chain_id: ChainId,
    pub address: Address,
    pub paused: bool,
    pub entries: Vec<VaultEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParkedSummary {
    pub guid: String,
    pub src_chain: ChainId,
    pub dst_chain: ChainId,
    pub reason: String,
    pub attempts: u32,
}

impl From<&ParkedPacket> for ParkedSummary {
    fn from(parked: &ParkedPacket) -> Self {
        Self {
            guid: parked.packet.guid().to_string(),
            src_chain: parked.packet.origin.src_chain,
            dst_chain: parked.packet.dst_chain,
            reason: parked.reason.clone(),
            attempts: parked.attempts,
        }
    }
}

impl Devnet {
    pub fn new(config: BridgeConfig) -> anyhow::Result<Self> {
        config.validate()?;
        tracing::info!(
            hub_chain = config.hub.chain_id,
            chains = config.chains.len(),
            assets = config.assets.len(),
            "Initializing devnet"
        );

        let owner = config.hub.owner;
        let network = LocalNetwork::new(config.transport.fees.clone());
        let hub_endpoint = network.register(config.hub.chain_id, config.hub.address)?;
        let mut hub = HubLedger::new(owner, hub_endpoint);

        let mut vaults = BTreeMap::new();
        for chain in &config.chains {
            let mut tokens = TokenLedger::new();
            for token in &chain.tokens {
                tokens.register(token.address, token.symbol.clone(), token.decimals);
            }
            let endpoint = network.register(chain.chain_id, chain.vault_address)?;
            let vault = RemoteVault::new(owner, config.hub.chain_id, config.hub.address, tokens, endpoint)?;
            hub.set_peer(&owner, chain.chain_id, chain.vault_address)?;
            vaults.insert(chain.chain_id, vault);
        }

        let mut synthetics = BTreeMap::new();
        for asset in &config.assets {
            let address = hub.create_asset(&owner, &asset.symbol, asset.decimals)?;
            synthetics.insert(asset.symbol.clone(), address);
        }

        for entry in &config.balancer {
            let synthetic = synthetics
                .get(&entry.synthetic)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("unknown asset {}", entry.synthetic))?;
            let curve = BalancerConfig::new(entry.threshold_weight, entry.curve_flattener)?;
            hub.set_balancer_config(&owner, &synthetic, entry.chain_id, curve)?;
        }

        let options = TransportOptions {
            gas_limit: config.transport.gas_limit,
        };
        let mut devnet = Self {
            config,
            network,
            hub,
            vaults,
            synthetics,
            options,
        };
        devnet.log_events();
        tracing::info!("✓ Devnet initialized");
        Ok(devnet)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn owner(&self) -> Address {
        self.config.hub.owner
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    pub fn network(&self) -> &LocalNetwork {
        &self.network
    }

    pub fn hub(&self) -> &HubLedger<LocalEndpoint> {
        &self.hub
    }

    pub fn hub_mut(&mut self) -> &mut HubLedger<LocalEndpoint> {
        &mut self.hub
    }

    pub fn query(&self) -> HubQuery<'_, LocalEndpoint> {
        HubQuery::new(&self.hub)
    }

    pub fn vault(&self, chain_id: ChainId) -> anyhow::Result<&RemoteVault<LocalEndpoint>> {
        self.vaults
            .get(&chain_id)
            .ok_or_else(|| anyhow::anyhow!("no vault on chain {chain_id}"))
    }

    pub fn vault_mut(&mut self, chain_id: ChainId) -> anyhow::Result<&mut RemoteVault<LocalEndpoint>> {
        self.vaults
            .get_mut(&chain_id)
            .ok_or_else(|| anyhow::anyhow!("no vault on chain {chain_id}"))
    }

    pub fn synthetic(&self, symbol: &str) -> anyhow::Result<Address> {
        self.synthetics
            .get(symbol)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown synthetic asset {symbol}"))
    }

    /// Send every configured link and deliver the messages
    pub fn link_all(&mut self) -> anyhow::Result<Vec<Delivery>> {
        let owner = self.owner();
        let mut per_chain: BTreeMap<ChainId, Vec<LinkRequest>> = BTreeMap::new();
        for link in &self.config.links {
            let synthetic = self.synthetic(&link.synthetic)?;
            let decimals = self
                .hub
                .asset_by_address(&synthetic)
                .map(|asset| asset.decimals)
                .ok_or_else(|| anyhow::anyhow!("asset {} missing on hub", link.synthetic))?;
            per_chain.entry(link.chain_id).or_default().push(LinkRequest {
                remote_token: link.remote_token,
                synthetic_token: synthetic,
                synthetic_decimals: decimals,
                min_bridge_amount: link.min_bridge_amount.clone(),
                paused: link.paused,
            });
        }

        for (chain_id, requests) in per_chain {
            let options = self.options.clone();
            self.vault_mut(chain_id)?.link(&owner, &requests, &options)?;
        }
        Ok(self.pump())
    }

    /// Mint native tokens to `holder` on a remote chain
    pub fn fund(&mut self, chain_id: ChainId, token: &Address, holder: &Address, amount: &Amount) -> anyhow::Result<()> {
        self.vault_mut(chain_id)?.tokens_mut().mint(token, holder, amount)?;
        tracing::debug!(chain_id, %token, %holder, %amount, "Funded account");
        Ok(())
    }

    /// Lock assets on `chain_id` and deliver the deposit to the hub
    pub fn deposit(
        &mut self,
        chain_id: ChainId,
        depositor: &Address,
        recipient: &Address,
        assets: &[Asset],
    ) -> anyhow::Result<Vec<Delivery>> {
        let options = self.options.clone();
        self.vault_mut(chain_id)?
            .deposit(depositor, recipient, assets, &options)?;
        Ok(self.pump())
    }

    /// Burn synthetic balance on the hub and deliver the release
    pub fn bridge_out(
        &mut self,
        holder: &Address,
        recipient: &Address,
        assets: &[Asset],
        dest_chain: ChainId,
    ) -> anyhow::Result<(BridgeOutReceipt, Vec<Delivery>)> {
        let receipt = self
            .hub
            .bridge_out(holder, recipient, assets, dest_chain, &self.options)?;
        let deliveries = self.pump();
        Ok((receipt, deliveries))
    }

    /// Deliver queued packets until every channel is empty
    pub fn pump(&mut self) -> Vec<Delivery> {
        let hub_chain = self.config.hub.chain_id;
        let mut deliveries = Vec::new();

        while self.network.pending_count() > 0 {
            let destinations: Vec<ChainId> = self
                .network
                .pending_pairs()
                .into_iter()
                .map(|(_, dst)| dst)
                .collect();
            let before = deliveries.len();

            for dst in destinations {
                if dst == hub_chain {
                    deliveries.extend(self.network.deliver_all_to(dst, &mut self.hub));
                } else if let Some(vault) = self.vaults.get_mut(&dst) {
                    deliveries.extend(self.network.deliver_all_to(dst, vault));
                }
            }
            if deliveries.len() == before {
                tracing::warn!(pending = self.network.pending_count(), "Packets queued for unknown chains");
                break;
            }
        }

        self.log_events();
        deliveries
    }

    /// Run every parked packet through its handler once more
    pub fn retry_parked(&mut self) -> anyhow::Result<Vec<Delivery>> {
        let hub_chain = self.config.hub.chain_id;
        let mut deliveries = Vec::new();

        for guid in self.network.parked_for(hub_chain) {
            deliveries.push(self.network.retry(&guid, hub_chain, &mut self.hub)?);
        }
        for (chain_id, vault) in self.vaults.iter_mut() {
            for guid in self.network.parked_for(*chain_id) {
                deliveries.push(self.network.retry(&guid, *chain_id, vault)?);
            }
        }

        self.log_events();
        Ok(deliveries)
    }

    fn log_events(&mut self) {
        for event in self.hub.drain_events() {
            match &event {
                HubEvent::AssetCreated { .. } | HubEvent::Linked { .. } => {
                    tracing::info!(event = ?event, "Hub event");
                }
                _ => tracing::debug!(event = ?event, "Hub event"),
            }
        }
    }

    pub fn status(&self) -> anyhow::Result<DevnetStatus> {
        let vaults = self
            .vaults
            .iter()
            .map(|(chain_id, vault)| VaultStatus {
                chain_id: *chain_id,
                address: vault.address(),
                paused: vault.is_paused(),
                entries: vault
                    .available_assets()
                    .iter()
                    .filter_map(|token| vault.entry(token).cloned())
                    .collect(),
            })
            .collect();

        Ok(DevnetStatus {
            hub_chain: self.config.hub.chain_id,
            assets: self.query().assets_info(&[])?,
            vaults,
            pending_packets: self.network.pending_count(),
            executed_packets: self.network.executed_count(),
            parked: self.network.parked().iter().map(ParkedSummary::from).collect(),
            fees_collected: self.network.fees_collected(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devnet_wires_every_chain() {
        let devnet = Devnet::new(BridgeConfig::default()).unwrap();
        assert_eq!(devnet.hub().asset_count(), 2);
        assert!(devnet.vault(1).is_ok());
        assert!(devnet.vault(2).is_ok());
        assert!(devnet.vault(7).is_err());
        assert_eq!(devnet.hub().gateway_vault(1), None);
        assert_eq!(devnet.hub().access().peer(2), Some(Address::from_low_u64(0x1002)));
    }

    #[test]
    fn test_link_all_registers_links() {
        let mut devnet = Devnet::new(BridgeConfig::default()).unwrap();
        let deliveries = devnet.link_all().unwrap();
        assert_eq!(deliveries.len(), 2);
        assert!(deliveries.iter().all(Delivery::is_executed));

        let susdt = devnet.synthetic("sUSDT").unwrap();
        assert_eq!(devnet.hub().asset_by_address(&susdt).unwrap().chain_list, vec![1, 2]);
        assert_eq!(devnet.vault(1).unwrap().available_asset_count(), 2);
        assert!(devnet.network().fees_collected() > Amount::zero());
    }

    #[test]
    fn test_status_serializes() {
        let mut devnet = Devnet::new(BridgeConfig::default()).unwrap();
        devnet.link_all().unwrap();
        let status = devnet.status().unwrap();
        assert_eq!(status.assets.len(), 2);
        assert_eq!(status.pending_packets, 0);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["vaults"][0]["chain_id"], serde_json::json!(1));
    }
}
