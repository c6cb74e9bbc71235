// balancer/src/config.rs

use crate::{BalancerError, BalancerResult};
use bridge_core::WEIGHT_DENOMINATOR;
use serde::{Deserialize, Serialize};

pub const MIN_CURVE_FLATTENER: u32 = 1;
pub const MAX_CURVE_FLATTENER: u32 = 11;
pub const DEFAULT_CURVE_FLATTENER: u32 = 3;

/// Curve parameters of one (asset, chain) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancerConfig {
    /// Target share of total supply the chain should hold (parts per 1e6)
    pub threshold_weight: u32,
    /// Exponent of the curve; higher keeps small imbalances cheap
    #[serde(default = "default_curve_flattener")]
    pub curve_flattener: u32,
}

fn default_curve_flattener() -> u32 {
    DEFAULT_CURVE_FLATTENER
}

impl BalancerConfig {
    /// Build a validated configuration
    pub fn new(threshold_weight: u32, curve_flattener: u32) -> BalancerResult<Self> {
        let config = Self {
            threshold_weight,
            curve_flattener,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BalancerResult<()> {
        if self.threshold_weight > WEIGHT_DENOMINATOR {
            return Err(BalancerError::InvalidThresholdWeight(self.threshold_weight));
        }
        if !(MIN_CURVE_FLATTENER..=MAX_CURVE_FLATTENER).contains(&self.curve_flattener) {
            return Err(BalancerError::InvalidCurveFlattener(self.curve_flattener));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattener_bounds() {
        assert!(BalancerConfig::new(500_000, MIN_CURVE_FLATTENER).is_ok());
        assert!(BalancerConfig::new(500_000, MAX_CURVE_FLATTENER).is_ok());
        assert_eq!(
            BalancerConfig::new(500_000, 0),
            Err(BalancerError::InvalidCurveFlattener(0))
        );
        assert_eq!(
            BalancerConfig::new(500_000, 12),
            Err(BalancerError::InvalidCurveFlattener(12))
        );
    }

    #[test]
    fn test_weight_bound() {
        assert!(BalancerConfig::new(WEIGHT_DENOMINATOR, 3).is_ok());
        assert_eq!(
            BalancerConfig::new(WEIGHT_DENOMINATOR + 1, 3),
            Err(BalancerError::InvalidThresholdWeight(WEIGHT_DENOMINATOR + 1))
        );
    }

    #[test]
    fn test_missing_flattener_defaults() {
        let config: BalancerConfig = serde_json::from_str(r#"{"threshold_weight":100}"#).unwrap();
        assert_eq!(config.curve_flattener, DEFAULT_CURVE_FLATTENER);
    }
}
