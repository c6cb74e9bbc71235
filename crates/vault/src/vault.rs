// vault/src/vault.rs

use crate::entry::{LinkRequest, VaultEntry};
use crate::{VaultError, VaultResult};
use bridge_core::{
    decimals_delta, AccessControl, Amount, Asset, BridgeError, ChainId, DepositMessage, LinkMessage,
    MessageHandler, MessagingFee, MessagingReceipt, Origin, Payload, ReleaseMessage, TokenLedger,
    Transport, TransportOptions,
};
use bridge_crypto::Address;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Custody endpoint of one remote chain
pub struct RemoteVault<T: Transport> {
    /// Hub chain all messages go to
    hub_chain: ChainId,
    access: AccessControl,
    /// Token contracts of this chain; the vault holds custody under its own address
    tokens: TokenLedger,
    entries: BTreeMap<Address, VaultEntry>,
    /// Registration order
    available: Vec<Address>,
    paused: bool,
    transport: T,
}

impl<T: Transport> RemoteVault<T> {
    /// Create a vault that trusts `hub_address` on `hub_chain`
    pub fn new(
        owner: Address,
        hub_chain: ChainId,
        hub_address: Address,
        tokens: TokenLedger,
        transport: T,
    ) -> VaultResult<Self> {
        let mut access = AccessControl::new(owner);
        access.set_peer(&owner, hub_chain, hub_address)?;

        Ok(Self {
            hub_chain,
            access,
            tokens,
            entries: BTreeMap::new(),
            available: Vec::new(),
            paused: false,
            transport,
        })
    }

    pub fn chain_id(&self) -> ChainId {
        self.transport.local_chain()
    }

    /// Address custody is held under
    pub fn address(&self) -> Address {
        self.transport.local_address()
    }

    pub fn hub_chain(&self) -> ChainId {
        self.hub_chain
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }

    pub fn tokens(&self) -> &TokenLedger {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut TokenLedger {
        &mut self.tokens
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn entry(&self, token: &Address) -> Option<&VaultEntry> {
        self.entries.get(token)
    }

    pub fn available_assets(&self) -> &[Address] {
        &self.available
    }

    pub fn available_asset_count(&self) -> usize {
        self.available.len()
    }

    fn prepare_link(&self, requests: &[LinkRequest]) -> VaultResult<Vec<VaultEntry>> {
        if requests.is_empty() {
            return Err(VaultError::EmptyBatch);
        }
        let mut seen = BTreeSet::new();
        let mut entries = Vec::with_capacity(requests.len());
        for request in requests {
            if !seen.insert(request.remote_token) {
                return Err(VaultError::DuplicateAsset(request.remote_token));
            }
            let remote_decimals = self.tokens.decimals(&request.remote_token)?;
            let delta = decimals_delta(request.synthetic_decimals, remote_decimals)?;
            let vault_balance = self
                .entries
                .get(&request.remote_token)
                .map(|existing| existing.vault_balance.clone())
                .unwrap_or_else(Amount::zero);

            entries.push(VaultEntry {
                remote_token: request.remote_token,
                remote_decimals,
                synthetic_token: request.synthetic_token,
                synthetic_decimals: request.synthetic_decimals,
                decimals_delta: delta,
                min_bridge_amount: request.min_bridge_amount.clone(),
                paused: request.paused,
                vault_balance,
            });
        }
        Ok(entries)
    }

    fn link_payload(entries: &[VaultEntry]) -> VaultResult<Vec<u8>> {
        let message = LinkMessage {
            entries: entries.iter().map(VaultEntry::to_link_entry).collect(),
        };
        Ok(Payload::Link(message).encode()?)
    }

    /// Register or update tokens and announce them to the hub
    pub fn link(
        &mut self,
        caller: &Address,
        requests: &[LinkRequest],
        options: &TransportOptions,
    ) -> VaultResult<MessagingReceipt> {
        self.access.require_admin(caller)?;
        let entries = self.prepare_link(requests)?;
        let payload = Self::link_payload(&entries)?;
        let receipt = self.transport.send(self.hub_chain, payload, options)?;

        for entry in entries {
            let token = entry.remote_token;
            if self.entries.insert(token, entry).is_none() {
                self.available.push(token);
            }
        }
        info!(
            chain_id = self.chain_id(),
            count = requests.len(),
            guid = %receipt.guid,
            "Link sent to hub"
        );
        Ok(receipt)
    }

    pub fn quote_link(&self, requests: &[LinkRequest], options: &TransportOptions) -> VaultResult<MessagingFee> {
        let entries = self.prepare_link(requests)?;
        let payload = Self::link_payload(&entries)?;
        Ok(self.transport.quote(self.hub_chain, &payload, options)?)
    }

    fn validate_deposit(&self, depositor: &Address, assets: &[Asset]) -> VaultResult<()> {
        if self.paused {
            return Err(VaultError::VaultPaused);
        }
        if assets.is_empty() {
            return Err(VaultError::EmptyBatch);
        }
        let mut seen = BTreeSet::new();
        for asset in assets {
            if !seen.insert(asset.token) {
                return Err(VaultError::DuplicateAsset(asset.token));
            }
            let entry = self
                .entries
                .get(&asset.token)
                .ok_or(VaultError::UnknownAsset(asset.token))?;
            if entry.paused {
                return Err(VaultError::AssetPaused(asset.token));
            }
            if asset.amount.is_zero() {
                return Err(VaultError::ZeroAmount(asset.token));
            }
            if asset.amount < entry.min_bridge_amount {
                return Err(VaultError::BelowMinimum {
                    token: asset.token,
                    amount: asset.amount.clone(),
                    minimum: entry.min_bridge_amount.clone(),
                });
            }
            let available = self.tokens.balance_of(&asset.token, depositor);
            if available < asset.amount {
                return Err(BridgeError::InsufficientBalance {
                    token: asset.token,
                    holder: *depositor,
                    required: asset.amount.clone(),
                    available,
                }
                .into());
            }
        }
        Ok(())
    }

    fn deposit_payload(recipient: &Address, assets: &[Asset]) -> VaultResult<Vec<u8>> {
        let message = DepositMessage {
            recipient: *recipient,
            assets: assets.to_vec(),
        };
        Ok(Payload::Deposit(message).encode()?)
    }

    /// Lock `assets` from `depositor` and credit `recipient` on the hub.
    ///
    /// Nothing moves unless every asset of the batch is valid.
    pub fn deposit(
        &mut self,
        depositor: &Address,
        recipient: &Address,
        assets: &[Asset],
        options: &TransportOptions,
    ) -> VaultResult<MessagingReceipt> {
        self.validate_deposit(depositor, assets)?;
        let payload = Self::deposit_payload(recipient, assets)?;
        let receipt = self.transport.send(self.hub_chain, payload, options)?;

        let custody = self.address();
        for asset in assets {
            self.tokens
                .transfer(&asset.token, depositor, &custody, &asset.amount)?;
            if let Some(entry) = self.entries.get_mut(&asset.token) {
                entry.vault_balance = &entry.vault_balance + &asset.amount;
            }
        }
        info!(
            chain_id = self.chain_id(),
            %depositor,
            %recipient,
            assets = assets.len(),
            guid = %receipt.guid,
            "Deposit locked"
        );
        Ok(receipt)
    }

    pub fn quote_deposit(
        &self,
        depositor: &Address,
        recipient: &Address,
        assets: &[Asset],
        options: &TransportOptions,
    ) -> VaultResult<MessagingFee> {
        self.validate_deposit(depositor, assets)?;
        let payload = Self::deposit_payload(recipient, assets)?;
        Ok(self.transport.quote(self.hub_chain, &payload, options)?)
    }

    fn release(&mut self, message: ReleaseMessage) -> VaultResult<()> {
        // totals per token so a batch naming a token twice is checked as a whole
        let mut totals: BTreeMap<Address, Amount> = BTreeMap::new();
        for asset in &message.assets {
            let total = totals.entry(asset.token).or_insert_with(Amount::zero);
            *total = &*total + &asset.amount;
        }
        let custody = self.address();
        for (token, required) in &totals {
            let entry = self.entries.get(token).ok_or(VaultError::UnknownAsset(*token))?;
            if entry.vault_balance < *required {
                return Err(VaultError::InsufficientCustody {
                    token: *token,
                    required: required.clone(),
                    available: entry.vault_balance.clone(),
                });
            }
            let held = self.tokens.balance_of(token, &custody);
            if held < *required {
                return Err(VaultError::InsufficientCustody {
                    token: *token,
                    required: required.clone(),
                    available: held,
                });
            }
        }

        for (token, amount) in totals {
            if amount.is_zero() {
                continue;
            }
            self.tokens
                .transfer(&token, &custody, &message.recipient, &amount)?;
            if let Some(entry) = self.entries.get_mut(&token) {
                entry.vault_balance = entry.vault_balance.saturating_sub(&amount);
            }
        }
        info!(
            chain_id = self.chain_id(),
            recipient = %message.recipient,
            assets = message.assets.len(),
            "Custody released"
        );
        Ok(())
    }

    /// Force a transfer out of custody, outside the messaging flow
    pub fn rescue(
        &mut self,
        caller: &Address,
        token: &Address,
        to: &Address,
        amount: &Amount,
    ) -> VaultResult<()> {
        self.access.require_admin(caller)?;
        let custody = self.address();
        self.tokens.transfer(token, &custody, to, amount)?;
        if let Some(entry) = self.entries.get_mut(token) {
            entry.vault_balance = entry.vault_balance.saturating_sub(amount);
        }
        warn!(chain_id = self.chain_id(), %token, %to, %amount, "Custody rescued");
        Ok(())
    }

    pub fn set_asset_paused(&mut self, caller: &Address, token: &Address, paused: bool) -> VaultResult<()> {
        self.access.require_admin(caller)?;
        let entry = self
            .entries
            .get_mut(token)
            .ok_or(VaultError::UnknownAsset(*token))?;
        entry.paused = paused;
        info!(%token, paused, "Vault asset pause changed");
        Ok(())
    }

    pub fn set_vault_paused(&mut self, caller: &Address, paused: bool) -> VaultResult<()> {
        self.access.require_admin(caller)?;
        self.paused = paused;
        info!(chain_id = self.chain_id(), paused, "Vault pause changed");
        Ok(())
    }

    pub fn set_min_bridge_amount(&mut self, caller: &Address, token: &Address, amount: Amount) -> VaultResult<()> {
        self.access.require_admin(caller)?;
        let entry = self
            .entries
            .get_mut(token)
            .ok_or(VaultError::UnknownAsset(*token))?;
        entry.min_bridge_amount = amount;
        Ok(())
    }
}

impl<T: Transport> MessageHandler for RemoteVault<T> {
    type Error = VaultError;

    fn on_receive(&mut self, origin: &Origin, payload: &[u8]) -> VaultResult<()> {
        if origin.src_chain != self.hub_chain {
            return Err(BridgeError::UntrustedPeer {
                chain_id: origin.src_chain,
                sender: origin.sender,
            }
            .into());
        }
        self.access.require_peer(origin)?;

        match Payload::decode(payload)? {
            Payload::Release(message) => self.release(message),
            other => {
                warn!(kind = other.kind(), "Vault rejected message");
                Err(VaultError::UnexpectedPayload(other.kind()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::BridgeResult;
    use bridge_crypto::Hash;

    const HUB: ChainId = 100;
    const CHAIN: ChainId = 2;

    /// Captures sent payloads instead of delivering them
    #[derive(Default)]
    struct Outbox {
        sent: Vec<(ChainId, Payload)>,
    }

    impl Transport for Outbox {
        fn local_chain(&self) -> ChainId {
            CHAIN
        }

        fn local_address(&self) -> Address {
            Address::from_low_u64(0x7a)
        }

        fn quote(&self, _dest: ChainId, payload: &[u8], _options: &TransportOptions) -> BridgeResult<MessagingFee> {
            Ok(MessagingFee {
                native_fee: Amount::from_u64(payload.len() as u64),
            })
        }

        fn send(&mut self, dest: ChainId, payload: Vec<u8>, options: &TransportOptions) -> BridgeResult<MessagingReceipt> {
            let fee = self.quote(dest, &payload, options)?;
            self.sent.push((dest, Payload::decode(&payload)?));
            Ok(MessagingReceipt {
                guid: Hash::zero(),
                nonce: self.sent.len() as u64,
                fee,
            })
        }
    }

    struct Fixture {
        vault: RemoteVault<Outbox>,
        admin: Address,
        user: Address,
        usdt: Address,
        synthetic: Address,
    }

    fn hub_address() -> Address {
        Address::from_low_u64(0x40b)
    }

    fn fixture() -> Fixture {
        let admin = Address::from_low_u64(1);
        let user = Address::from_low_u64(2);
        let usdt = Address::from_low_u64(0x100);
        let synthetic = Address::from_low_u64(0x200);

        let mut tokens = TokenLedger::new();
        tokens.register(usdt, "USDT", 6);
        tokens.mint(&usdt, &user, &Amount::from_units(1_000, 6)).unwrap();

        let mut vault = RemoteVault::new(admin, HUB, hub_address(), tokens, Outbox::default()).unwrap();
        let request = LinkRequest {
            remote_token: usdt,
            synthetic_token: synthetic,
            synthetic_decimals: 18,
            min_bridge_amount: Amount::from_units(1, 6),
            paused: false,
        };
        vault.link(&admin, &[request], &TransportOptions::default()).unwrap();

        Fixture {
            vault,
            admin,
            user,
            usdt,
            synthetic,
        }
    }

    fn hub_origin() -> Origin {
        Origin {
            src_chain: HUB,
            sender: hub_address(),
            nonce: 1,
            guid: Hash::zero(),
        }
    }

    fn release_payload(recipient: Address, token: Address, amount: Amount) -> Vec<u8> {
        Payload::Release(ReleaseMessage {
            recipient,
            assets: vec![Asset::new(token, amount)],
        })
        .encode()
        .unwrap()
    }

    #[test]
    fn test_link_computes_delta_and_announces() {
        let f = fixture();
        let entry = f.vault.entry(&f.usdt).unwrap();
        assert_eq!(entry.remote_decimals, 6);
        assert_eq!(entry.decimals_delta, 12);
        assert_eq!(entry.synthetic_token, f.synthetic);
        assert_eq!(f.vault.available_asset_count(), 1);

        let (dest, payload) = &f.vault.transport.sent[0];
        assert_eq!(*dest, HUB);
        assert!(matches!(payload, Payload::Link(m) if m.entries[0].decimals_delta == 12));
    }

    #[test]
    fn test_relink_is_idempotent() {
        let mut f = fixture();
        let request = LinkRequest {
            remote_token: f.usdt,
            synthetic_token: f.synthetic,
            synthetic_decimals: 18,
            min_bridge_amount: Amount::from_units(5, 6),
            paused: false,
        };
        f.vault.link(&f.admin, &[request], &TransportOptions::default()).unwrap();
        assert_eq!(f.vault.available_assets(), &[f.usdt]);
        assert_eq!(f.vault.entry(&f.usdt).unwrap().min_bridge_amount, Amount::from_units(5, 6));
    }

    #[test]
    fn test_link_requires_admin_and_known_token() {
        let mut f = fixture();
        let request = LinkRequest {
            remote_token: Address::from_low_u64(0x999),
            synthetic_token: f.synthetic,
            synthetic_decimals: 18,
            min_bridge_amount: Amount::zero(),
            paused: false,
        };
        assert!(f.vault.link(&f.user, &[request.clone()], &TransportOptions::default()).is_err());
        assert!(f.vault.link(&f.admin, &[request], &TransportOptions::default()).is_err());
        assert_eq!(f.vault.available_asset_count(), 1);
    }

    #[test]
    fn test_deposit_moves_custody_and_reports() {
        let mut f = fixture();
        let amount = Amount::from_units(100, 6);
        let fee = f
            .vault
            .quote_deposit(&f.user, &f.user, &[Asset::new(f.usdt, amount.clone())], &TransportOptions::default())
            .unwrap();
        let receipt = f
            .vault
            .deposit(&f.user, &f.user, &[Asset::new(f.usdt, amount.clone())], &TransportOptions::default())
            .unwrap();
        assert_eq!(receipt.fee, fee);

        let custody = f.vault.address();
        assert_eq!(f.vault.tokens().balance_of(&f.usdt, &custody), amount);
        assert_eq!(f.vault.entry(&f.usdt).unwrap().vault_balance, amount);
        assert!(matches!(
            &f.vault.transport.sent[1].1,
            Payload::Deposit(m) if m.assets[0].amount == amount
        ));
    }

    #[test]
    fn test_invalid_batch_moves_nothing() {
        let mut f = fixture();
        let options = TransportOptions::default();
        let ok = Asset::new(f.usdt, Amount::from_units(10, 6));

        let below = Asset::new(f.usdt, Amount::from_u64(10));
        assert!(matches!(
            f.vault.deposit(&f.user, &f.user, &[below], &options),
            Err(VaultError::BelowMinimum { .. })
        ));
        assert!(matches!(
            f.vault.deposit(&f.user, &f.user, &[ok.clone(), ok.clone()], &options),
            Err(VaultError::DuplicateAsset(_))
        ));
        let unknown = Asset::new(Address::from_low_u64(0x555), Amount::from_u64(1));
        assert!(matches!(
            f.vault.deposit(&f.user, &f.user, &[ok.clone(), unknown], &options),
            Err(VaultError::UnknownAsset(_))
        ));
        let too_much = Asset::new(f.usdt, Amount::from_units(5_000, 6));
        assert!(f.vault.deposit(&f.user, &f.user, &[too_much], &options).is_err());
        assert!(matches!(
            f.vault.deposit(&f.user, &f.user, &[], &options),
            Err(VaultError::EmptyBatch)
        ));

        f.vault.set_asset_paused(&f.admin, &f.usdt, true).unwrap();
        assert!(matches!(
            f.vault.deposit(&f.user, &f.user, &[ok.clone()], &options),
            Err(VaultError::AssetPaused(_))
        ));
        f.vault.set_asset_paused(&f.admin, &f.usdt, false).unwrap();
        f.vault.set_vault_paused(&f.admin, true).unwrap();
        assert!(matches!(
            f.vault.deposit(&f.user, &f.user, &[ok], &options),
            Err(VaultError::VaultPaused)
        ));

        assert_eq!(f.vault.tokens().balance_of(&f.usdt, &f.user), Amount::from_units(1_000, 6));
        assert_eq!(f.vault.transport.sent.len(), 1);
    }

    #[test]
    fn test_release_from_hub() {
        let mut f = fixture();
        let amount = Amount::from_units(100, 6);
        f.vault
            .deposit(&f.user, &f.user, &[Asset::new(f.usdt, amount.clone())], &TransportOptions::default())
            .unwrap();

        let bob = Address::from_low_u64(3);
        let payload = release_payload(bob, f.usdt, Amount::from_units(40, 6));
        f.vault.on_receive(&hub_origin(), &payload).unwrap();

        assert_eq!(f.vault.tokens().balance_of(&f.usdt, &bob), Amount::from_units(40, 6));
        assert_eq!(f.vault.entry(&f.usdt).unwrap().vault_balance, Amount::from_units(60, 6));
    }

    #[test]
    fn test_release_rejects_untrusted_and_overdraw() {
        let mut f = fixture();
        let bob = Address::from_low_u64(3);
        let payload = release_payload(bob, f.usdt, Amount::from_units(1, 6));

        let mut stranger = hub_origin();
        stranger.sender = Address::from_low_u64(0xbad);
        assert!(f.vault.on_receive(&stranger, &payload).is_err());

        assert!(matches!(
            f.vault.on_receive(&hub_origin(), &payload),
            Err(VaultError::InsufficientCustody { .. })
        ));
        assert!(f.vault.tokens().balance_of(&f.usdt, &bob).is_zero());
    }

    #[test]
    fn test_deposit_message_from_hub_is_rejected() {
        let mut f = fixture();
        let payload = Payload::Deposit(DepositMessage {
            recipient: f.user,
            assets: vec![],
        })
        .encode()
        .unwrap();
        assert!(matches!(
            f.vault.on_receive(&hub_origin(), &payload),
            Err(VaultError::UnexpectedPayload("deposit"))
        ));
    }

    #[test]
    fn test_rescue_decrements_tracked_balance() {
        let mut f = fixture();
        let amount = Amount::from_units(100, 6);
        f.vault
            .deposit(&f.user, &f.user, &[Asset::new(f.usdt, amount)], &TransportOptions::default())
            .unwrap();

        assert!(f
            .vault
            .rescue(&f.user, &f.usdt, &f.user, &Amount::from_u64(1))
            .is_err());
        f.vault
            .rescue(&f.admin, &f.usdt, &f.admin, &Amount::from_units(30, 6))
            .unwrap();
        assert_eq!(f.vault.entry(&f.usdt).unwrap().vault_balance, Amount::from_units(70, 6));
        assert_eq!(f.vault.tokens().balance_of(&f.usdt, &f.admin), Amount::from_units(30, 6));
    }
}
