// hub/src/ledger.rs

use crate::asset::{RemoteLink, SyntheticAsset};
use crate::events::HubEvent;
use crate::quote::{AssetQuote, BridgeOutQuote, BridgeOutReceipt};
use crate::{HubError, HubResult};
use balancer::{Balancer, BalancerConfig};
use bridge_core::{
    decimals_delta, to_hub, to_remote, AccessControl, Amount, Asset, AssetIndex, BridgeError,
    ChainId, DepositMessage, LinkEntry, LinkMessage, MessageHandler, Origin, Payload,
    ReleaseMessage, TokenLedger, Transport, TransportOptions,
};
use bridge_crypto::Address;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, info, warn};

/// Undrained events kept before the oldest are dropped
pub const EVENT_BUFFER: usize = 4096;

/// Authoritative accounting of synthetic assets on the hub chain
pub struct HubLedger<T: Transport> {
    access: AccessControl,
    /// Position `i` holds the asset with index `i + 1`
    assets: Vec<SyntheticAsset>,
    by_address: BTreeMap<Address, AssetIndex>,
    links: BTreeMap<(AssetIndex, ChainId), RemoteLink>,
    /// (chain, remote token) → synthetic token
    remote_to_synthetic: BTreeMap<(ChainId, Address), Address>,
    /// (chain, synthetic token) → remote token
    synthetic_to_remote: BTreeMap<(ChainId, Address), Address>,
    /// Vault that announced each chain's links
    gateways: BTreeMap<ChainId, Address>,
    balancer: Balancer,
    tokens: TokenLedger,
    events: VecDeque<HubEvent>,
    transport: T,
}

impl<T: Transport> HubLedger<T> {
    pub fn new(owner: Address, transport: T) -> Self {
        Self {
            access: AccessControl::new(owner),
            assets: Vec::new(),
            by_address: BTreeMap::new(),
            links: BTreeMap::new(),
            remote_to_synthetic: BTreeMap::new(),
            synthetic_to_remote: BTreeMap::new(),
            gateways: BTreeMap::new(),
            balancer: Balancer::new(),
            tokens: TokenLedger::new(),
            events: VecDeque::new(),
            transport,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.transport.local_chain()
    }

    pub fn address(&self) -> Address {
        self.transport.local_address()
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Synthetic balances and supplies
    pub fn tokens(&self) -> &TokenLedger {
        &self.tokens
    }

    pub fn balancer(&self) -> &Balancer {
        &self.balancer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn assets(&self) -> &[SyntheticAsset] {
        &self.assets
    }

    pub fn asset(&self, index: AssetIndex) -> Option<&SyntheticAsset> {
        let position = usize::try_from(index).ok()?.checked_sub(1)?;
        self.assets.get(position)
    }

    /// Index of a synthetic token, 0 when unknown
    pub fn asset_index_of(&self, address: &Address) -> AssetIndex {
        self.by_address.get(address).copied().unwrap_or(0)
    }

    pub fn asset_by_address(&self, address: &Address) -> Option<&SyntheticAsset> {
        self.by_address
            .get(address)
            .and_then(|index| self.asset(*index))
    }

    pub fn link(&self, index: AssetIndex, chain_id: ChainId) -> Option<&RemoteLink> {
        self.links.get(&(index, chain_id))
    }

    pub fn synthetic_for_remote(&self, chain_id: ChainId, remote: &Address) -> Option<Address> {
        self.remote_to_synthetic.get(&(chain_id, *remote)).copied()
    }

    pub fn remote_for_synthetic(&self, chain_id: ChainId, synthetic: &Address) -> Option<Address> {
        self.synthetic_to_remote.get(&(chain_id, *synthetic)).copied()
    }

    pub fn gateway_vault(&self, chain_id: ChainId) -> Option<Address> {
        self.gateways.get(&chain_id).copied()
    }

    pub fn events(&self) -> impl Iterator<Item = &HubEvent> {
        self.events.iter()
    }

    pub fn drain_events(&mut self) -> Vec<HubEvent> {
        self.events.drain(..).collect()
    }

    fn record(&mut self, event: HubEvent) {
        if self.events.len() == EVENT_BUFFER {
            self.events.pop_front();
            debug!("Event buffer full, dropping oldest");
        }
        self.events.push_back(event);
    }

    fn resolve(&self, synthetic: &Address) -> HubResult<&SyntheticAsset> {
        self.asset_by_address(synthetic)
            .ok_or(HubError::AssetNotFound(*synthetic))
    }

    /// Register a new synthetic asset and return its token address
    pub fn create_asset(&mut self, caller: &Address, symbol: &str, decimals: u8) -> HubResult<Address> {
        self.access.require_admin(caller)?;

        let index = self.assets.len() as AssetIndex + 1;
        let address = SyntheticAsset::derive_address(&self.address(), index, symbol);
        self.tokens.register(address, symbol, decimals);
        self.assets.push(SyntheticAsset {
            index,
            symbol: symbol.to_string(),
            decimals,
            address,
            paused: false,
            chain_list: Vec::new(),
        });
        self.by_address.insert(address, index);

        info!(index, %address, symbol, decimals, "Synthetic asset created");
        self.record(HubEvent::AssetCreated {
            index,
            address,
            symbol: symbol.to_string(),
            decimals,
        });
        Ok(address)
    }

    fn handle_link(&mut self, origin: &Origin, message: LinkMessage) -> HubResult<()> {
        let chain_id = origin.src_chain;
        let mut seen_assets = BTreeSet::new();
        let mut seen_remotes = BTreeSet::new();
        let mut plan = Vec::with_capacity(message.entries.len());

        for entry in &message.entries {
            let asset = self.resolve(&entry.synthetic_token)?;
            if !seen_assets.insert(asset.index) {
                return Err(HubError::DuplicateAsset(asset.address));
            }
            if !seen_remotes.insert(entry.remote_token) {
                return Err(HubError::DuplicateAsset(entry.remote_token));
            }
            if asset.decimals != entry.synthetic_decimals {
                return Err(HubError::DecimalsMismatch {
                    asset: asset.address,
                    expected: asset.decimals,
                    actual: entry.synthetic_decimals,
                });
            }
            let delta = decimals_delta(entry.synthetic_decimals, entry.remote_decimals)?;
            if delta != entry.decimals_delta {
                return Err(HubError::InvalidLinkEntry {
                    asset: asset.address,
                    reason: format!("decimals delta {} should be {}", entry.decimals_delta, delta),
                });
            }
            if let Some(owner) = self.remote_to_synthetic.get(&(chain_id, entry.remote_token)) {
                if *owner != asset.address {
                    return Err(HubError::RemoteTokenInUse {
                        chain_id,
                        token: entry.remote_token,
                    });
                }
            }
            if let Some(existing) = self.links.get(&(asset.index, chain_id)) {
                let changes = existing.remote_token != entry.remote_token
                    || existing.decimals_delta != entry.decimals_delta;
                if changes && !existing.total_locked.is_zero() {
                    return Err(HubError::LinkLocked {
                        asset: asset.address,
                        chain_id,
                    });
                }
            }
            plan.push(asset.index);
        }

        for (entry, index) in message.entries.into_iter().zip(plan) {
            self.apply_link(chain_id, origin.sender, index, entry);
        }
        Ok(())
    }

    fn apply_link(&mut self, chain_id: ChainId, gateway: Address, index: AssetIndex, entry: LinkEntry) {
        let synthetic = entry.synthetic_token;
        let link = self.links.entry((index, chain_id)).or_insert_with(|| RemoteLink {
            paused: entry.paused,
            ..RemoteLink::default()
        });
        // A relink never lifts a pause set on the hub
        let previous = std::mem::replace(&mut link.remote_token, entry.remote_token);
        link.decimals_delta = entry.decimals_delta;

        if previous != entry.remote_token && !previous.is_zero() {
            self.remote_to_synthetic.remove(&(chain_id, previous));
        }
        self.remote_to_synthetic
            .insert((chain_id, entry.remote_token), synthetic);
        self.synthetic_to_remote
            .insert((chain_id, synthetic), entry.remote_token);
        self.gateways.insert(chain_id, gateway);

        let position = (index as usize).saturating_sub(1);
        if let Some(asset) = self.assets.get_mut(position) {
            asset.add_chain(chain_id);
        }

        info!(
            asset = %synthetic,
            chain_id,
            remote_token = %entry.remote_token,
            delta = entry.decimals_delta,
            "Remote asset linked"
        );
        self.record(HubEvent::Linked {
            asset: synthetic,
            chain_id,
            remote_token: entry.remote_token,
            gateway,
        });
    }

    fn handle_deposit(&mut self, chain_id: ChainId, message: DepositMessage) -> HubResult<()> {
        let DepositMessage { recipient, assets } = message;

        let mut plan = Vec::with_capacity(assets.len());
        for asset in &assets {
            let synthetic = self
                .synthetic_for_remote(chain_id, &asset.token)
                .ok_or(HubError::RemoteTokenNotLinked {
                    chain_id,
                    token: asset.token,
                })?;
            let synth = self.resolve(&synthetic)?;
            if synth.paused {
                return Err(HubError::AssetPaused(synthetic));
            }
            let link = self
                .links
                .get(&(synth.index, chain_id))
                .ok_or(HubError::LinkNotFound {
                    asset: synthetic,
                    chain_id,
                })?;
            if link.paused {
                return Err(HubError::LinkPaused {
                    asset: synthetic,
                    chain_id,
                });
            }
            plan.push((synth.index, synthetic));
        }

        for ((index, synthetic), asset) in plan.into_iter().zip(assets) {
            self.credit_deposit(chain_id, index, synthetic, &recipient, &asset.amount)?;
        }
        Ok(())
    }

    fn credit_deposit(
        &mut self,
        chain_id: ChainId,
        index: AssetIndex,
        synthetic: Address,
        recipient: &Address,
        raw: &Amount,
    ) -> HubResult<()> {
        let chain_length = self.asset(index).map_or(0, |asset| asset.chain_list.len());
        let supply = self.tokens.total_supply(&synthetic);
        let link = self
            .links
            .get(&(index, chain_id))
            .ok_or(HubError::LinkNotFound {
                asset: synthetic,
                chain_id,
            })?;

        let normalized = to_hub(raw, link.decimals_delta);
        let current = to_hub(&link.total_locked, link.decimals_delta);
        let bonus = self.balancer.bonus(
            &synthetic,
            chain_id,
            &link.bonus_pool,
            &current,
            &normalized,
            chain_length,
            &supply,
        );

        self.tokens
            .mint(&synthetic, recipient, &(&normalized + &bonus))?;
        if let Some(link) = self.links.get_mut(&(index, chain_id)) {
            link.total_locked = &link.total_locked + raw;
            link.bonus_pool = link.bonus_pool.saturating_sub(&bonus);
        }

        info!(
            asset = %synthetic,
            chain_id,
            %recipient,
            amount = %normalized,
            %bonus,
            "Deposit minted"
        );
        self.record(HubEvent::Minted {
            asset: synthetic,
            chain_id,
            recipient: *recipient,
            amount: normalized,
            bonus,
        });
        Ok(())
    }

    /// Price a bridge-out batch without touching state
    pub fn plan_bridge_out(
        &self,
        holder: &Address,
        assets: &[Asset],
        dest_chain: ChainId,
    ) -> HubResult<Vec<AssetQuote>> {
        if assets.is_empty() {
            return Err(HubError::EmptyBatch);
        }
        let mut seen = BTreeSet::new();
        let mut quotes = Vec::with_capacity(assets.len());

        for asset in assets {
            if !seen.insert(asset.token) {
                return Err(HubError::DuplicateAsset(asset.token));
            }
            let synth = self.resolve(&asset.token)?;
            if synth.paused {
                return Err(HubError::AssetPaused(asset.token));
            }
            let link = self
                .links
                .get(&(synth.index, dest_chain))
                .ok_or(HubError::LinkNotFound {
                    asset: asset.token,
                    chain_id: dest_chain,
                })?;
            if link.paused {
                return Err(HubError::LinkPaused {
                    asset: asset.token,
                    chain_id: dest_chain,
                });
            }

            let delta = link.decimals_delta;
            let remote_amount = to_remote(&asset.amount, delta);
            if remote_amount.is_zero() {
                return Err(HubError::AmountTooSmall {
                    asset: asset.token,
                    amount: asset.amount.clone(),
                });
            }
            // dust below the remote precision stays with the holder
            let burned = to_hub(&remote_amount, delta);

            if link.total_locked < remote_amount {
                return Err(HubError::InsufficientBalanceOnDestChain {
                    asset: asset.token,
                    chain_id: dest_chain,
                    required: remote_amount,
                    available: link.total_locked.clone(),
                });
            }
            let available = self.tokens.balance_of(&asset.token, holder);
            if available < burned {
                return Err(BridgeError::InsufficientBalance {
                    token: asset.token,
                    holder: *holder,
                    required: burned,
                    available,
                }
                .into());
            }

            let priced = self.balancer.penalty(
                &asset.token,
                dest_chain,
                &to_hub(&link.total_locked, delta),
                &burned,
                synth.chain_list.len(),
                &self.tokens.total_supply(&asset.token),
            );
            let net_remote = to_remote(&burned.saturating_sub(&priced), delta);
            if net_remote.is_zero() {
                return Err(HubError::AmountTooSmall {
                    asset: asset.token,
                    amount: asset.amount.clone(),
                });
            }
            // rounding of the net amount is banked with the penalty
            let penalty = burned.saturating_sub(&to_hub(&net_remote, delta));
            debug!(asset = %asset.token, %burned, %priced, %penalty, %net_remote, "Bridge-out planned");

            quotes.push(AssetQuote {
                synthetic_token: asset.token,
                remote_token: link.remote_token,
                burned,
                penalty,
                remote_amount,
                net_remote,
            });
        }
        Ok(quotes)
    }

    fn release_payload(recipient: &Address, quotes: &[AssetQuote]) -> HubResult<Vec<u8>> {
        let message = ReleaseMessage {
            recipient: *recipient,
            assets: quotes
                .iter()
                .map(|quote| Asset::new(quote.remote_token, quote.net_remote.clone()))
                .collect(),
        };
        Ok(Payload::Release(message).encode()?)
    }

    pub fn quote_bridge_out(
        &self,
        holder: &Address,
        recipient: &Address,
        assets: &[Asset],
        dest_chain: ChainId,
        options: &TransportOptions,
    ) -> HubResult<BridgeOutQuote> {
        let quotes = self.plan_bridge_out(holder, assets, dest_chain)?;
        let payload = Self::release_payload(recipient, &quotes)?;
        let fee = self.transport.quote(dest_chain, &payload, options)?;
        Ok(BridgeOutQuote { assets: quotes, fee })
    }

    /// Burn synthetic balance and release custody on `dest_chain`.
    ///
    /// The whole batch is validated and priced before anything is burned;
    /// one release message carries every asset.
    pub fn bridge_out(
        &mut self,
        holder: &Address,
        recipient: &Address,
        assets: &[Asset],
        dest_chain: ChainId,
        options: &TransportOptions,
    ) -> HubResult<BridgeOutReceipt> {
        let quotes = self.plan_bridge_out(holder, assets, dest_chain)?;
        let payload = Self::release_payload(recipient, &quotes)?;
        let receipt = self.transport.send(dest_chain, payload, options)?;

        for quote in &quotes {
            self.tokens
                .burn(&quote.synthetic_token, holder, &quote.burned)?;
            let index = self.asset_index_of(&quote.synthetic_token);
            if let Some(link) = self.links.get_mut(&(index, dest_chain)) {
                link.total_locked = link.total_locked.saturating_sub(&quote.remote_amount);
                link.bonus_pool = &link.bonus_pool + &quote.penalty;
            }

            info!(
                asset = %quote.synthetic_token,
                chain_id = dest_chain,
                %holder,
                burned = %quote.burned,
                penalty = %quote.penalty,
                net_remote = %quote.net_remote,
                "Bridged out"
            );
            self.record(HubEvent::BridgedOut {
                asset: quote.synthetic_token,
                chain_id: dest_chain,
                holder: *holder,
                recipient: *recipient,
                burned: quote.burned.clone(),
                penalty: quote.penalty.clone(),
                net_remote: quote.net_remote.clone(),
            });
        }

        Ok(BridgeOutReceipt {
            assets: quotes,
            receipt,
        })
    }

    pub fn set_asset_paused(&mut self, caller: &Address, synthetic: &Address, paused: bool) -> HubResult<()> {
        self.access.require_admin(caller)?;
        let index = self.resolve(synthetic)?.index;
        let position = (index as usize).saturating_sub(1);
        if let Some(asset) = self.assets.get_mut(position) {
            asset.paused = paused;
        }
        info!(asset = %synthetic, paused, "Asset pause changed");
        self.record(HubEvent::PauseChanged {
            asset: *synthetic,
            chain_id: None,
            paused,
        });
        Ok(())
    }

    pub fn set_link_paused(
        &mut self,
        caller: &Address,
        synthetic: &Address,
        chain_id: ChainId,
        paused: bool,
    ) -> HubResult<()> {
        self.access.require_admin(caller)?;
        let index = self.resolve(synthetic)?.index;
        let link = self
            .links
            .get_mut(&(index, chain_id))
            .ok_or(HubError::LinkNotFound {
                asset: *synthetic,
                chain_id,
            })?;
        link.paused = paused;
        info!(asset = %synthetic, chain_id, paused, "Link pause changed");
        self.record(HubEvent::PauseChanged {
            asset: *synthetic,
            chain_id: Some(chain_id),
            paused,
        });
        Ok(())
    }

    pub fn set_balancer_config(
        &mut self,
        caller: &Address,
        synthetic: &Address,
        chain_id: ChainId,
        config: BalancerConfig,
    ) -> HubResult<()> {
        self.access.require_admin(caller)?;
        self.resolve(synthetic)?;
        self.balancer.set_config(*synthetic, chain_id, config)?;
        info!(
            asset = %synthetic,
            chain_id,
            weight = config.threshold_weight,
            flattener = config.curve_flattener,
            "Balancer configured"
        );
        Ok(())
    }

    pub fn remove_balancer_config(
        &mut self,
        caller: &Address,
        synthetic: &Address,
        chain_id: ChainId,
    ) -> HubResult<Option<BalancerConfig>> {
        self.access.require_admin(caller)?;
        Ok(self.balancer.remove_config(synthetic, chain_id))
    }

    /// Trust `peer` as the vault of `chain_id`
    pub fn set_peer(&mut self, caller: &Address, chain_id: ChainId, peer: Address) -> HubResult<()> {
        self.access.set_peer(caller, chain_id, peer)?;
        info!(chain_id, %peer, "Peer set");
        Ok(())
    }

    pub fn grant_admin(&mut self, caller: &Address, admin: Address) -> HubResult<()> {
        Ok(self.access.grant_admin(caller, admin)?)
    }

    pub fn revoke_admin(&mut self, caller: &Address, admin: &Address) -> HubResult<()> {
        Ok(self.access.revoke_admin(caller, admin)?)
    }
}

impl<T: Transport> MessageHandler for HubLedger<T> {
    type Error = HubError;

    fn on_receive(&mut self, origin: &Origin, payload: &[u8]) -> HubResult<()> {
        self.access.require_peer(origin)?;
        let payload = Payload::decode(payload)?;
        debug!(src_chain = origin.src_chain, kind = payload.kind(), nonce = origin.nonce, "Hub received message");

        let result = match payload {
            Payload::Link(message) => self.handle_link(origin, message),
            Payload::Deposit(message) => self.handle_deposit(origin.src_chain, message),
            Payload::Release(_) => Err(HubError::UnexpectedPayload("release")),
        };
        if let Err(err) = &result {
            warn!(src_chain = origin.src_chain, guid = %origin.guid, %err, "Hub rejected message");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::{BridgeResult, MessagingFee, MessagingReceipt};
    use bridge_crypto::Hash;
    use proptest::prelude::*;

    const HUB: ChainId = 100;
    const CHAIN_A: ChainId = 2;
    const CHAIN_B: ChainId = 3;

    #[derive(Default)]
    struct Outbox {
        sent: Vec<(ChainId, Payload)>,
    }

    impl Transport for Outbox {
        fn local_chain(&self) -> ChainId {
            HUB
        }

        fn local_address(&self) -> Address {
            Address::from_low_u64(0x40b)
        }

        fn quote(&self, _dest: ChainId, _payload: &[u8], _options: &TransportOptions) -> BridgeResult<MessagingFee> {
            Ok(MessagingFee::default())
        }

        fn send(&mut self, dest: ChainId, payload: Vec<u8>, _options: &TransportOptions) -> BridgeResult<MessagingReceipt> {
            self.sent.push((dest, Payload::decode(&payload)?));
            Ok(MessagingReceipt {
                guid: Hash::zero(),
                nonce: self.sent.len() as u64,
                fee: MessagingFee::default(),
            })
        }
    }

    fn admin() -> Address {
        Address::from_low_u64(1)
    }

    fn alice() -> Address {
        Address::from_low_u64(2)
    }

    fn vault(chain_id: ChainId) -> Address {
        Address::from_low_u64(0x1000 + u64::from(chain_id))
    }

    fn remote_usdt(chain_id: ChainId) -> Address {
        Address::from_low_u64(0x2000 + u64::from(chain_id))
    }

    fn origin(chain_id: ChainId, nonce: u64) -> Origin {
        Origin {
            src_chain: chain_id,
            sender: vault(chain_id),
            nonce,
            guid: Hash::zero(),
        }
    }

    fn link_entry(synthetic: Address, chain_id: ChainId) -> LinkEntry {
        LinkEntry {
            remote_token: remote_usdt(chain_id),
            remote_decimals: 6,
            synthetic_token: synthetic,
            synthetic_decimals: 18,
            decimals_delta: 12,
            min_bridge_amount: Amount::zero(),
            paused: false,
        }
    }

    fn send_link(hub: &mut HubLedger<Outbox>, chain_id: ChainId, entries: Vec<LinkEntry>) -> HubResult<()> {
        let payload = Payload::Link(LinkMessage { entries }).encode().unwrap();
        hub.on_receive(&origin(chain_id, 1), &payload)
    }

    fn send_deposit(hub: &mut HubLedger<Outbox>, chain_id: ChainId, raw: Amount) -> HubResult<()> {
        let payload = Payload::Deposit(DepositMessage {
            recipient: alice(),
            assets: vec![Asset::new(remote_usdt(chain_id), raw)],
        })
        .encode()
        .unwrap();
        hub.on_receive(&origin(chain_id, 2), &payload)
    }

    /// Hub with sUSDT linked to 6-decimal USDT on two chains
    fn linked_hub() -> (HubLedger<Outbox>, Address) {
        let mut hub = HubLedger::new(admin(), Outbox::default());
        let synthetic = hub.create_asset(&admin(), "sUSDT", 18).unwrap();
        for chain_id in [CHAIN_A, CHAIN_B] {
            hub.set_peer(&admin(), chain_id, vault(chain_id)).unwrap();
            send_link(&mut hub, chain_id, vec![link_entry(synthetic, chain_id)]).unwrap();
        }
        (hub, synthetic)
    }

    #[test]
    fn test_create_asset_assigns_indices() {
        let mut hub = HubLedger::new(admin(), Outbox::default());
        let a = hub.create_asset(&admin(), "sUSDT", 18).unwrap();
        let b = hub.create_asset(&admin(), "sWBTC", 8).unwrap();
        assert_eq!(hub.asset_index_of(&a), 1);
        assert_eq!(hub.asset_index_of(&b), 2);
        assert_eq!(hub.asset_index_of(&Address::from_low_u64(77)), 0);
        assert!(hub.asset(0).is_none());
        assert_eq!(hub.asset(2).unwrap().decimals, 8);
        assert!(hub.create_asset(&alice(), "sX", 18).is_err());
    }

    #[test]
    fn test_link_records_both_indexes_and_gateway() {
        let (hub, synthetic) = linked_hub();
        assert_eq!(hub.asset(1).unwrap().chain_list, vec![CHAIN_A, CHAIN_B]);
        assert_eq!(hub.synthetic_for_remote(CHAIN_A, &remote_usdt(CHAIN_A)), Some(synthetic));
        assert_eq!(hub.remote_for_synthetic(CHAIN_B, &synthetic), Some(remote_usdt(CHAIN_B)));
        assert_eq!(hub.gateway_vault(CHAIN_A), Some(vault(CHAIN_A)));
        assert_eq!(hub.link(1, CHAIN_A).unwrap().decimals_delta, 12);
    }

    #[test]
    fn test_relink_keeps_chain_list() {
        let (mut hub, synthetic) = linked_hub();
        send_link(&mut hub, CHAIN_A, vec![link_entry(synthetic, CHAIN_A)]).unwrap();
        assert_eq!(hub.asset(1).unwrap().chain_list.len(), 2);
    }

    #[test]
    fn test_event_buffer_is_bounded() {
        let (mut hub, synthetic) = linked_hub();
        for i in 0..EVENT_BUFFER {
            hub.set_asset_paused(&admin(), &synthetic, i % 2 == 0).unwrap();
        }
        assert_eq!(hub.events().count(), EVENT_BUFFER);
        assert!(hub
            .events()
            .all(|event| matches!(event, HubEvent::PauseChanged { .. })));

        assert_eq!(hub.drain_events().len(), EVENT_BUFFER);
        assert_eq!(hub.events().count(), 0);
    }

    #[test]
    fn test_relink_keeps_hub_pause() {
        let (mut hub, synthetic) = linked_hub();
        hub.set_link_paused(&admin(), &synthetic, CHAIN_A, true).unwrap();

        send_link(&mut hub, CHAIN_A, vec![link_entry(synthetic, CHAIN_A)]).unwrap();
        assert!(hub.link(1, CHAIN_A).unwrap().paused);
        assert!(send_deposit(&mut hub, CHAIN_A, Amount::from_u64(1_000_000)).is_err());

        hub.set_link_paused(&admin(), &synthetic, CHAIN_A, false).unwrap();
        send_deposit(&mut hub, CHAIN_A, Amount::from_u64(1_000_000)).unwrap();
    }

    #[test]
    fn test_new_link_takes_entry_pause() {
        let mut hub = HubLedger::new(admin(), Outbox::default());
        let synthetic = hub.create_asset(&admin(), "sUSDT", 18).unwrap();
        hub.set_peer(&admin(), CHAIN_A, vault(CHAIN_A)).unwrap();
        let mut entry = link_entry(synthetic, CHAIN_A);
        entry.paused = true;
        send_link(&mut hub, CHAIN_A, vec![entry]).unwrap();
        assert!(hub.link(1, CHAIN_A).unwrap().paused);
    }

    #[test]
    fn test_link_with_unknown_asset_fails_whole_message() {
        let mut hub = HubLedger::new(admin(), Outbox::default());
        let synthetic = hub.create_asset(&admin(), "sUSDT", 18).unwrap();
        hub.set_peer(&admin(), CHAIN_A, vault(CHAIN_A)).unwrap();

        let mut bogus = link_entry(Address::from_low_u64(0xdead), CHAIN_A);
        bogus.remote_token = Address::from_low_u64(0xbeef);
        let err = send_link(&mut hub, CHAIN_A, vec![link_entry(synthetic, CHAIN_A), bogus]).unwrap_err();
        assert!(matches!(err, HubError::AssetNotFound(_)));
        assert!(hub.link(1, CHAIN_A).is_none());
        assert!(hub.asset(1).unwrap().chain_list.is_empty());
    }

    #[test]
    fn test_link_decimals_must_match() {
        let mut hub = HubLedger::new(admin(), Outbox::default());
        let synthetic = hub.create_asset(&admin(), "sUSDT", 18).unwrap();
        hub.set_peer(&admin(), CHAIN_A, vault(CHAIN_A)).unwrap();
        let mut entry = link_entry(synthetic, CHAIN_A);
        entry.synthetic_decimals = 6;
        entry.decimals_delta = 0;
        assert!(matches!(
            send_link(&mut hub, CHAIN_A, vec![entry]),
            Err(HubError::DecimalsMismatch { .. })
        ));
    }

    #[test]
    fn test_untrusted_origin_rejected() {
        let (mut hub, synthetic) = linked_hub();
        let payload = Payload::Link(LinkMessage {
            entries: vec![link_entry(synthetic, 9)],
        })
        .encode()
        .unwrap();
        let err = hub.on_receive(&origin(9, 1), &payload).unwrap_err();
        assert!(matches!(err, HubError::Bridge(BridgeError::UntrustedPeer { .. })));
    }

    #[test]
    fn test_deposit_normalizes_and_mints() {
        let (mut hub, synthetic) = linked_hub();
        send_deposit(&mut hub, CHAIN_A, Amount::from_u64(1_000_000)).unwrap();

        assert_eq!(hub.tokens().balance_of(&synthetic, &alice()), Amount::from_units(1_000_000, 12));
        assert_eq!(hub.link(1, CHAIN_A).unwrap().total_locked, Amount::from_u64(1_000_000));
        assert!(matches!(hub.events().last(), Some(HubEvent::Minted { .. })));
    }

    #[test]
    fn test_relink_to_other_remote_blocked_while_locked() {
        let (mut hub, synthetic) = linked_hub();
        send_deposit(&mut hub, CHAIN_A, Amount::from_u64(5)).unwrap();
        let mut entry = link_entry(synthetic, CHAIN_A);
        entry.remote_token = Address::from_low_u64(0x3333);
        assert!(matches!(
            send_link(&mut hub, CHAIN_A, vec![entry]),
            Err(HubError::LinkLocked { .. })
        ));
    }

    #[test]
    fn test_deposit_paused_link_is_atomic() {
        let (mut hub, synthetic) = linked_hub();
        hub.set_link_paused(&admin(), &synthetic, CHAIN_A, true).unwrap();
        assert!(matches!(
            send_deposit(&mut hub, CHAIN_A, Amount::from_u64(10)),
            Err(HubError::LinkPaused { .. })
        ));
        assert!(hub.tokens().total_supply(&synthetic).is_zero());
        assert!(hub.link(1, CHAIN_A).unwrap().total_locked.is_zero());
    }

    #[test]
    fn test_bridge_out_trims_dust_and_sends_release() {
        let (mut hub, synthetic) = linked_hub();
        send_deposit(&mut hub, CHAIN_A, Amount::from_units(10, 6)).unwrap();

        // 1.123456789... tokens: only 1.123456 is representable on the remote side
        let requested: Amount = "1123456789123456789".parse().unwrap();
        let receipt = hub
            .bridge_out(
                &alice(),
                &alice(),
                &[Asset::new(synthetic, requested)],
                CHAIN_A,
                &TransportOptions::default(),
            )
            .unwrap();

        let quote = &receipt.assets[0];
        assert_eq!(quote.burned, "1123456000000000000".parse().unwrap());
        assert_eq!(quote.net_remote, Amount::from_u64(1_123_456));
        assert!(quote.penalty.is_zero());
        assert_eq!(
            hub.link(1, CHAIN_A).unwrap().total_locked,
            Amount::from_u64(10_000_000 - 1_123_456)
        );

        let (dest, payload) = hub.transport().sent.last().unwrap();
        assert_eq!(*dest, CHAIN_A);
        assert!(matches!(payload, Payload::Release(m) if m.assets[0].amount == Amount::from_u64(1_123_456)));
    }

    #[test]
    fn test_bridge_out_failures_leave_no_trace() {
        let (mut hub, synthetic) = linked_hub();
        send_deposit(&mut hub, CHAIN_A, Amount::from_units(10, 6)).unwrap();
        let supply = hub.tokens().total_supply(&synthetic);
        let options = TransportOptions::default();
        let one = Asset::new(synthetic, Amount::from_units(1, 18));

        // nothing locked on chain B
        assert!(matches!(
            hub.bridge_out(&alice(), &alice(), &[one.clone()], CHAIN_B, &options),
            Err(HubError::InsufficientBalanceOnDestChain { .. })
        ));
        assert!(matches!(
            hub.bridge_out(&alice(), &alice(), &[one.clone()], 77, &options),
            Err(HubError::LinkNotFound { .. })
        ));
        assert!(matches!(
            hub.bridge_out(&alice(), &alice(), &[Asset::new(synthetic, Amount::from_u64(999))], CHAIN_A, &options),
            Err(HubError::AmountTooSmall { .. })
        ));
        assert!(matches!(
            hub.bridge_out(&alice(), &alice(), &[one.clone(), one.clone()], CHAIN_A, &options),
            Err(HubError::DuplicateAsset(_))
        ));
        hub.set_asset_paused(&admin(), &synthetic, true).unwrap();
        assert!(matches!(
            hub.bridge_out(&alice(), &alice(), &[one], CHAIN_A, &options),
            Err(HubError::AssetPaused(_))
        ));

        assert_eq!(hub.tokens().total_supply(&synthetic), supply);
        assert_eq!(hub.link(1, CHAIN_A).unwrap().total_locked, Amount::from_units(10, 6));
        // no release went out
        assert!(hub.transport().sent.is_empty());
    }

    #[test]
    fn test_penalty_banked_in_bonus_pool() {
        let (mut hub, synthetic) = linked_hub();
        send_deposit(&mut hub, CHAIN_A, Amount::from_units(1_000, 6)).unwrap();
        send_deposit(&mut hub, CHAIN_B, Amount::from_units(1_000, 6)).unwrap();
        hub.set_balancer_config(&admin(), &synthetic, CHAIN_A, BalancerConfig::new(500_000, 3).unwrap())
            .unwrap();

        let options = TransportOptions::default();
        let asset = Asset::new(synthetic, Amount::from_units(600, 18));
        let quote = hub
            .quote_bridge_out(&alice(), &alice(), &[asset.clone()], CHAIN_A, &options)
            .unwrap();
        assert!(!quote.assets[0].penalty.is_zero());

        let receipt = hub.bridge_out(&alice(), &alice(), &[asset], CHAIN_A, &options).unwrap();
        assert_eq!(receipt.assets, quote.assets);
        assert_eq!(hub.link(1, CHAIN_A).unwrap().bonus_pool, quote.assets[0].penalty);
    }

    #[test]
    fn test_invalid_balancer_config_rejected() {
        let (mut hub, synthetic) = linked_hub();
        let config = BalancerConfig {
            threshold_weight: 2_000_000,
            curve_flattener: 3,
        };
        assert!(matches!(
            hub.set_balancer_config(&admin(), &synthetic, CHAIN_A, config),
            Err(HubError::Balancer(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_locked_matches_supply_without_incentives(
            ops in proptest::collection::vec((any::<bool>(), any::<bool>(), 1u64..1_000_000_000), 1..40)
        ) {
            let (mut hub, synthetic) = linked_hub();
            for (is_deposit, on_a, amount) in ops {
                let chain_id = if on_a { CHAIN_A } else { CHAIN_B };
                if is_deposit {
                    send_deposit(&mut hub, chain_id, Amount::from_u64(amount)).unwrap();
                } else {
                    // hub amount with sub-unit dust; failures are fine, state must still add up
                    let requested = Amount::new(Amount::from_u64(amount).into_inner() * 1_000_000_000_007u64);
                    let _ = hub.bridge_out(
                        &alice(),
                        &alice(),
                        &[Asset::new(synthetic, requested)],
                        chain_id,
                        &TransportOptions::default(),
                    );
                }
                let locked = [CHAIN_A, CHAIN_B]
                    .iter()
                    .map(|chain_id| to_hub(&hub.link(1, *chain_id).unwrap().total_locked, 12))
                    .fold(Amount::zero(), |acc, x| acc + x);
                prop_assert_eq!(locked, hub.tokens().total_supply(&synthetic));
            }
        }
    }
}
