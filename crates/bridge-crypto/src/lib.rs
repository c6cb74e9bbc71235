// bridge-crypto/src/lib.rs

//! Hashing and addressing primitives shared by every bridge component
//!
//! This crate provides:
//! - 32-byte Keccak-256 hashes
//! - 20-byte account/contract addresses with hex text form
//! - Deterministic address derivation for hub-created synthetic assets

pub mod address;
pub mod hash;

pub use address::Address;
pub use hash::Hash;

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while parsing or deriving primitives
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid address length: expected 20 bytes, got {0}")]
    InvalidAddressLength(usize),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_basics() {
        let address = Address::derive(&[b"synthetic", b"USDT"]);
        assert!(!address.is_zero());
        assert_eq!(address, Address::from_hex(&address.to_hex()).unwrap());
    }
}
