// bridge-core/src/ledger.rs

use crate::types::Amount;
use crate::{BridgeError, BridgeResult};
use bridge_crypto::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata of a token tracked by a ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Amount,
}

/// Multi-token balance book.
///
/// On a remote chain it stands in for the chain's native token contracts
/// (the vault pulls deposits into its own account and pushes releases out).
/// On the hub it holds synthetic balances with mint/burn.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    tokens: BTreeMap<Address, TokenInfo>,
    balances: BTreeMap<(Address, Address), Amount>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token; re-registering keeps balances and supply
    pub fn register(&mut self, token: Address, symbol: impl Into<String>, decimals: u8) {
        let symbol = symbol.into();
        self.tokens
            .entry(token)
            .and_modify(|info| {
                info.symbol = symbol.clone();
                info.decimals = decimals;
            })
            .or_insert(TokenInfo {
                symbol,
                decimals,
                total_supply: Amount::zero(),
            });
    }

    pub fn info(&self, token: &Address) -> Option<&TokenInfo> {
        self.tokens.get(token)
    }

    pub fn decimals(&self, token: &Address) -> BridgeResult<u8> {
        self.info(token)
            .map(|info| info.decimals)
            .ok_or(BridgeError::UnknownToken(*token))
    }

    pub fn total_supply(&self, token: &Address) -> Amount {
        self.info(token)
            .map(|info| info.total_supply.clone())
            .unwrap_or_else(Amount::zero)
    }

    pub fn balance_of(&self, token: &Address, holder: &Address) -> Amount {
        self.balances
            .get(&(*token, *holder))
            .cloned()
            .unwrap_or_else(Amount::zero)
    }

    pub fn mint(&mut self, token: &Address, to: &Address, amount: &Amount) -> BridgeResult<()> {
        let info = self
            .tokens
            .get_mut(token)
            .ok_or(BridgeError::UnknownToken(*token))?;
        info.total_supply = info
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| BridgeError::Overflow("total supply".into()))?;

        let balance = self.balances.entry((*token, *to)).or_insert_with(Amount::zero);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| BridgeError::Overflow("balance".into()))?;
        Ok(())
    }

    pub fn burn(&mut self, token: &Address, from: &Address, amount: &Amount) -> BridgeResult<()> {
        self.debit(token, from, amount)?;
        if let Some(info) = self.tokens.get_mut(token) {
            info.total_supply = info.total_supply.saturating_sub(amount);
        }
        Ok(())
    }

    pub fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: &Amount,
    ) -> BridgeResult<()> {
        self.debit(token, from, amount)?;
        let balance = self.balances.entry((*token, *to)).or_insert_with(Amount::zero);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| BridgeError::Overflow("balance".into()))?;
        Ok(())
    }

    fn debit(&mut self, token: &Address, from: &Address, amount: &Amount) -> BridgeResult<()> {
        if !self.tokens.contains_key(token) {
            return Err(BridgeError::UnknownToken(*token));
        }
        let available = self.balance_of(token, from);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| BridgeError::InsufficientBalance {
                token: *token,
                holder: *from,
                required: amount.clone(),
                available: available.clone(),
            })?;
        if remaining.is_zero() {
            self.balances.remove(&(*token, *from));
        } else {
            self.balances.insert((*token, *from), remaining);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TokenLedger, Address, Address, Address) {
        let mut ledger = TokenLedger::new();
        let token = Address::from_low_u64(100);
        ledger.register(token, "USDT", 6);
        (ledger, token, Address::from_low_u64(1), Address::from_low_u64(2))
    }

    #[test]
    fn test_mint_and_burn_track_supply() {
        let (mut ledger, token, alice, _) = setup();
        ledger.mint(&token, &alice, &Amount::from_u64(500)).unwrap();
        assert_eq!(ledger.total_supply(&token), Amount::from_u64(500));

        ledger.burn(&token, &alice, &Amount::from_u64(200)).unwrap();
        assert_eq!(ledger.total_supply(&token), Amount::from_u64(300));
        assert_eq!(ledger.balance_of(&token, &alice), Amount::from_u64(300));
    }

    #[test]
    fn test_transfer_moves_without_changing_supply() {
        let (mut ledger, token, alice, bob) = setup();
        ledger.mint(&token, &alice, &Amount::from_u64(100)).unwrap();
        ledger.transfer(&token, &alice, &bob, &Amount::from_u64(100)).unwrap();
        assert!(ledger.balance_of(&token, &alice).is_zero());
        assert_eq!(ledger.balance_of(&token, &bob), Amount::from_u64(100));
        assert_eq!(ledger.total_supply(&token), Amount::from_u64(100));
    }

    #[test]
    fn test_overdraft_rejected_without_effect() {
        let (mut ledger, token, alice, bob) = setup();
        ledger.mint(&token, &alice, &Amount::from_u64(10)).unwrap();
        let err = ledger
            .transfer(&token, &alice, &bob, &Amount::from_u64(11))
            .unwrap_err();
        assert!(matches!(err, BridgeError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of(&token, &alice), Amount::from_u64(10));
    }

    #[test]
    fn test_unknown_token() {
        let (mut ledger, _, alice, _) = setup();
        let other = Address::from_low_u64(999);
        assert!(matches!(
            ledger.mint(&other, &alice, &Amount::from_u64(1)),
            Err(BridgeError::UnknownToken(_))
        ));
        assert!(ledger.decimals(&other).is_err());
    }
}
