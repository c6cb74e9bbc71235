// balancer/src/lib.rs

//! Equilibrium incentives for cross-chain liquidity
//!
//! This crate prices two things for every (synthetic asset, remote chain)
//! pair:
//! - a penalty on withdrawals that push a chain below its target share
//! - a bonus, paid out of banked penalties, on deposits that refill it
//!
//! Both are pure functions of the pair's configuration and the balances the
//! caller passes in.

pub mod config;
pub mod curve;

pub use config::{
    BalancerConfig, DEFAULT_CURVE_FLATTENER, MAX_CURVE_FLATTENER, MIN_CURVE_FLATTENER,
};
pub use curve::{Balancer, FIXED_POINT};

/// Result type for balancer operations
pub type BalancerResult<T> = Result<T, BalancerError>;

/// Errors raised while configuring the balancer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalancerError {
    #[error("Invalid threshold weight: {0}")]
    InvalidThresholdWeight(u32),

    #[error("Invalid curve flattener: {0}")]
    InvalidCurveFlattener(u32),
}
