// balancer/src/curve.rs

//! Penalty and bonus curves.
//!
//! A chain's imbalance is measured as its deficit ratio
//! `r = max(0, ideal − balance) / ideal` where `ideal = supply × weight / 1e6`
//! and `supply` is the synthetic supply after the operation. Withdrawals pay
//! the fraction `r_after^k` of the amount, so draining a chain costs nearly
//! all of it; deposits earn the fraction `1 − (r_after / r_before)^k` of the
//! pair's bonus pool. Ratios are carried in 1e18 fixed point and a withdrawal
//! ratio never reaches 1.

use crate::config::BalancerConfig;
use crate::BalancerResult;
use bridge_core::{Amount, ChainId, WEIGHT_DENOMINATOR};
use bridge_crypto::Address;
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::BTreeMap;
use tracing::debug;

/// Scale of deficit ratios
pub const FIXED_POINT: u64 = 1_000_000_000_000_000_000;

/// Per-(synthetic token, chain) curve configuration plus the pricing functions
#[derive(Debug, Clone, Default)]
pub struct Balancer {
    configs: BTreeMap<(Address, ChainId), BalancerConfig>,
}

impl Balancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure a pair; invalid parameters are rejected here, never at pricing time
    pub fn set_config(
        &mut self,
        token: Address,
        chain_id: ChainId,
        config: BalancerConfig,
    ) -> BalancerResult<()> {
        config.validate()?;
        self.configs.insert((token, chain_id), config);
        Ok(())
    }

    pub fn remove_config(&mut self, token: &Address, chain_id: ChainId) -> Option<BalancerConfig> {
        self.configs.remove(&(*token, chain_id))
    }

    pub fn config(&self, token: &Address, chain_id: ChainId) -> Option<&BalancerConfig> {
        self.configs.get(&(*token, chain_id))
    }

    pub fn configs(&self) -> impl Iterator<Item = (&(Address, ChainId), &BalancerConfig)> {
        self.configs.iter()
    }

    /// Fee withheld from a withdrawal of `amount_out` from a chain holding
    /// `current_balance`, in the same precision as the inputs.
    ///
    /// Always strictly below `amount_out`; zero unless the withdrawal deepens
    /// the chain's deficit.
    pub fn penalty(
        &self,
        token: &Address,
        chain_id: ChainId,
        current_balance: &Amount,
        amount_out: &Amount,
        chain_length: usize,
        total_supply: &Amount,
    ) -> Amount {
        if chain_length == 0 || amount_out.is_zero() {
            return Amount::zero();
        }
        let Some(config) = self.config(token, chain_id) else {
            return Amount::zero();
        };

        let supply_after = total_supply.saturating_sub(amount_out);
        let ideal_before = ideal(total_supply, config.threshold_weight);
        let ideal_after = ideal(&supply_after, config.threshold_weight);
        let deficit_before = ideal_before.saturating_sub(current_balance);
        let deficit_after = ideal_after.saturating_sub(&current_balance.saturating_sub(amount_out));

        if deficit_after <= deficit_before {
            return Amount::zero();
        }

        let before = deficit_ratio(&deficit_before, &ideal_before);
        let after = deficit_ratio(&deficit_after, &ideal_after);
        if after <= before {
            return Amount::zero();
        }

        // a full drain still leaves the holder one step of the ratio
        let after = after.min(scale() - 1u32);
        let k = config.curve_flattener;
        let penalty = amount_out.mul_div(&after.pow(k), &scale().pow(k));

        debug!(
            %token,
            chain_id,
            ratio_before = %before,
            ratio_after = %after,
            %penalty,
            "Priced withdrawal"
        );
        penalty
    }

    /// Share of `bonus_pool` earned by depositing `amount_in` into a chain
    /// holding `current_balance`.
    ///
    /// Closing the deficit pays the whole pool. Partial refills pay in
    /// proportion to the removed imbalance, so splitting a deposit does not
    /// change the total paid.
    #[allow(clippy::too_many_arguments)]
    pub fn bonus(
        &self,
        token: &Address,
        chain_id: ChainId,
        bonus_pool: &Amount,
        current_balance: &Amount,
        amount_in: &Amount,
        chain_length: usize,
        total_supply: &Amount,
    ) -> Amount {
        if chain_length == 0 || amount_in.is_zero() || bonus_pool.is_zero() {
            return Amount::zero();
        }
        let Some(config) = self.config(token, chain_id) else {
            return Amount::zero();
        };

        let ideal_before = ideal(total_supply, config.threshold_weight);
        let deficit_before = ideal_before.saturating_sub(current_balance);
        if deficit_before.is_zero() {
            return Amount::zero();
        }

        let supply_after = total_supply + amount_in;
        let ideal_after = ideal(&supply_after, config.threshold_weight);
        let deficit_after = ideal_after.saturating_sub(&(current_balance + amount_in));

        if deficit_after >= deficit_before {
            return Amount::zero();
        }
        if deficit_after.is_zero() {
            debug!(%token, chain_id, pool = %bonus_pool, "Deposit closes deficit");
            return bonus_pool.clone();
        }

        let before = deficit_ratio(&deficit_before, &ideal_before);
        let after = deficit_ratio(&deficit_after, &ideal_after);
        if after >= before {
            return Amount::zero();
        }

        let k = config.curve_flattener;
        let before_k = before.pow(k);
        let removed = &before_k - after.pow(k);
        let bonus = bonus_pool.mul_div(&removed, &before_k).min(bonus_pool.clone());

        debug!(
            %token,
            chain_id,
            ratio_before = %before,
            ratio_after = %after,
            %bonus,
            "Priced deposit"
        );
        bonus
    }
}

fn scale() -> BigUint {
    BigUint::from(FIXED_POINT)
}

fn ideal(supply: &Amount, weight: u32) -> Amount {
    supply.mul_div(&BigUint::from(weight), &BigUint::from(WEIGHT_DENOMINATOR))
}

/// `deficit / ideal` in fixed point; zero when there is no ideal
fn deficit_ratio(deficit: &Amount, ideal: &Amount) -> BigUint {
    if ideal.is_zero() {
        return BigUint::zero();
    }
    deficit.inner() * scale() / ideal.inner()
}
