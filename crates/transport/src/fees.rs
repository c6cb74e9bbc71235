// transport/src/fees.rs

use bridge_core::{Amount, MessagingFee, TransportOptions};
use serde::{Deserialize, Serialize};

/// Native fee charged per message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat fee per message
    pub base_fee: Amount,
    /// Fee per payload byte
    pub per_byte_fee: Amount,
    /// Price of one unit of destination gas
    pub gas_price: Amount,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee: Amount::from_u64(10_000),
            per_byte_fee: Amount::from_u64(16),
            gas_price: Amount::from_u64(1),
        }
    }
}

impl FeeSchedule {
    /// A schedule that charges nothing
    pub fn free() -> Self {
        Self {
            base_fee: Amount::zero(),
            per_byte_fee: Amount::zero(),
            gas_price: Amount::zero(),
        }
    }

    /// `base + per_byte × len + gas_price × gas_limit`
    pub fn quote(&self, payload_len: usize, options: &TransportOptions) -> MessagingFee {
        let bytes = scale(&self.per_byte_fee, payload_len as u64);
        let gas = scale(&self.gas_price, options.gas_limit);
        MessagingFee {
            native_fee: &(&self.base_fee + &bytes) + &gas,
        }
    }
}

fn scale(amount: &Amount, factor: u64) -> Amount {
    Amount::new(amount.inner() * factor)
}
