// blockchain-crypto/src/lib.rs

//! Cryptographic primitives consumed by the contract ABI layer
//!
//! This crate provides:
//! - Hashing functions (Keccak-256, SHA256, SHA3-256) behind one `Hashable` trait
//! - The 20-byte account `Address` carried in call payloads

pub mod address;
pub mod hash;

pub use address::{Address, ADDRESS_SIZE};
pub use hash::{Hash, HashAlgorithm, Hashable, HASH_SIZE};

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid hash")]
    InvalidHash,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}
