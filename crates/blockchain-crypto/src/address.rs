// blockchain-crypto/src/address.rs

use crate::{CryptoError, CryptoResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address size in bytes
pub const ADDRESS_SIZE: usize = 20;

/// 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd, Default)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> CryptoResult<Self> {
        if slice.len() != ADDRESS_SIZE {
            return Err(CryptoError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_SIZE,
                slice.len()
            )));
        }
        let mut arr = [0u8; ADDRESS_SIZE];
        arr.copy_from_slice(slice);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Lowercase hex with a `0x` prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Accepts mixed-case hex with or without the `0x` prefix
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn zero() -> Self {
        Self([0u8; ADDRESS_SIZE])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
