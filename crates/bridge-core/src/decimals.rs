// bridge-core/src/decimals.rs

//! Conversion between remote-chain precision and hub precision.
//!
//! Every conversion floors. Going remote → hub → remote can lose dust but
//! never creates it, so the bridge can never release more than it locked.

use crate::types::{pow10, Amount};
use crate::{BridgeError, BridgeResult};
use num_bigint::BigUint;

/// Signed precision difference: `synthetic_decimals − remote_decimals`
pub type DecimalsDelta = i8;

/// Compute the delta for a link, rejecting differences that do not fit
pub fn decimals_delta(synthetic_decimals: u8, remote_decimals: u8) -> BridgeResult<DecimalsDelta> {
    let delta = i16::from(synthetic_decimals) - i16::from(remote_decimals);
    DecimalsDelta::try_from(delta).map_err(|_| BridgeError::DecimalsOutOfRange {
        synthetic: synthetic_decimals,
        remote: remote_decimals,
    })
}

fn scale(delta: DecimalsDelta) -> BigUint {
    pow10(u32::from(delta.unsigned_abs()))
}

/// Remote-precision amount to hub precision
pub fn to_hub(amount: &Amount, delta: DecimalsDelta) -> Amount {
    if delta >= 0 {
        Amount::new(amount.inner() * scale(delta))
    } else {
        Amount::new(amount.inner() / scale(delta))
    }
}

/// Hub-precision amount to remote precision
pub fn to_remote(amount: &Amount, delta: DecimalsDelta) -> Amount {
    if delta >= 0 {
        Amount::new(amount.inner() / scale(delta))
    } else {
        Amount::new(amount.inner() * scale(delta))
    }
}

/// Largest hub amount not above `amount` that the remote side can represent
pub fn trim_dust(amount: &Amount, delta: DecimalsDelta) -> Amount {
    to_hub(&to_remote(amount, delta), delta)
}
