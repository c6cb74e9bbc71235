// bridge-core/src/types.rs

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Interchain endpoint identifier of a chain
pub type ChainId = u32;

/// 1-based index of a synthetic asset on the hub; 0 means "none"
pub type AssetIndex = u64;

/// Denominator for threshold weights (parts per million)
pub const WEIGHT_DENOMINATOR: u32 = 1_000_000;

/// Token amount (using BigUint for arbitrary precision)
///
/// Amounts are serialized as decimal strings so JSON consumers never lose
/// precision on 18-decimal balances.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(BigUint);

impl Amount {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        Self(BigUint::from(value))
    }

    /// `units × 10^decimals`, e.g. `from_units(100, 6)` is 100 USDT
    pub fn from_units(units: u64, decimals: u32) -> Self {
        Self(BigUint::from(units) * pow10(decimals))
    }

    pub fn inner(&self) -> &BigUint {
        &self.0
    }

    pub fn into_inner(self) -> BigUint {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_u128(&self) -> Option<u128> {
        self.0.to_u128()
    }

    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        Some(Amount(&self.0 + &other.0))
    }

    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.0 < other.0 {
            None
        } else {
            Some(Amount(&self.0 - &other.0))
        }
    }

    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        self.checked_sub(other).unwrap_or_else(Amount::zero)
    }

    /// `floor(self × numerator / denominator)`; zero when the denominator is zero
    pub fn mul_div(&self, numerator: &BigUint, denominator: &BigUint) -> Amount {
        if denominator.is_zero() {
            return Amount::zero();
        }
        Amount(&self.0 * numerator / denominator)
    }
}

/// `10^exp` as a big integer
pub fn pow10(exp: u32) -> BigUint {
    let mut result = BigUint::one();
    let ten = BigUint::from(10u32);
    for _ in 0..exp {
        result *= &ten;
    }
    result
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::from_u64(value)
    }
}

impl From<BigUint> for Amount {
    fn from(value: BigUint) -> Self {
        Amount(value)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl<'a> Add<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn add(self, other: &'a Amount) -> Amount {
        Amount(&self.0 + &other.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    /// Panics on underflow like the integer types; use `checked_sub` on
    /// untrusted input.
    fn sub(self, other: Amount) -> Amount {
        Amount(self.0 - other.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Amount(BigUint::from_str(s.trim().replace('_', "").as_str())?))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_arithmetic() {
        let a = Amount::from_u64(100);
        let b = Amount::from_u64(50);

        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum, Amount::from_u64(150));

        let diff = sum.checked_sub(&b).unwrap();
        assert_eq!(diff, Amount::from_u64(100));
    }

    #[test]
    fn test_amount_underflow() {
        let a = Amount::from_u64(50);
        let b = Amount::from_u64(100);

        assert!(a.checked_sub(&b).is_none());
        assert_eq!(a.saturating_sub(&b), Amount::zero());
    }

    #[test]
    fn test_from_units() {
        assert_eq!(Amount::from_units(100, 6), Amount::from_u64(100_000_000));
        assert_eq!(
            Amount::from_units(1, 18).to_string(),
            "1000000000000000000"
        );
    }

    #[test]
    fn test_mul_div_floors() {
        let a = Amount::from_u64(10);
        assert_eq!(a.mul_div(&BigUint::from(1u32), &BigUint::from(3u32)), Amount::from_u64(3));
        assert_eq!(a.mul_div(&BigUint::from(1u32), &BigUint::zero()), Amount::zero());
    }

    #[test]
    fn test_amount_serde_as_string() {
        let a = Amount::from_units(12, 18);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"12000000000000000000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert_eq!("1_000".parse::<Amount>().unwrap(), Amount::from_u64(1000));
    }
}
