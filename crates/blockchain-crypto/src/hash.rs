// blockchain-crypto/src/hash.rs

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::{Keccak256, Sha3_256};
use std::fmt;
use std::str::FromStr;

/// Hash output size in bytes
pub const HASH_SIZE: usize = 32;

/// Supported hash algorithms
///
/// `Keccak256` is the EVM convention and the default for selectors and
/// event topics. The others exist for chains configured with a different
/// digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    #[default]
    Keccak256,
    Sha256,
    Sha3_256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Keccak256 => "keccak256",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha3_256 => "sha3_256",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = crate::CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keccak256" | "keccak" => Ok(HashAlgorithm::Keccak256),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha3_256" | "sha3" => Ok(HashAlgorithm::Sha3_256),
            other => Err(crate::CryptoError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 32-byte hash value
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Create a new hash from bytes
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a hash from a slice (returns error if wrong length)
    pub fn from_slice(slice: &[u8]) -> Result<Self, crate::CryptoError> {
        if slice.len() != HASH_SIZE {
            return Err(crate::CryptoError::InvalidHash);
        }
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn zero() -> Self {
        Self([0u8; HASH_SIZE])
    }

    /// The leading four bytes, used as a function selector
    pub fn prefix4(&self) -> [u8; 4] {
        [self.0[0], self.0[1], self.0[2], self.0[3]]
    }

    /// Lowercase hex without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, crate::CryptoError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| crate::CryptoError::DeserializationError(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}...{})",
               hex::encode(&self.0[..4]),
               hex::encode(&self.0[28..]))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

/// Trait for types that can be hashed
pub trait Hashable {
    fn hash(&self) -> Hash;
    fn hash_with(&self, algorithm: HashAlgorithm) -> Hash;
}

impl Hashable for [u8] {
    fn hash(&self) -> Hash {
        self.hash_with(HashAlgorithm::Keccak256)
    }

    fn hash_with(&self, algorithm: HashAlgorithm) -> Hash {
        match algorithm {
            HashAlgorithm::Keccak256 => {
                let mut hasher = Keccak256::new();
                hasher.update(self);
                Hash::new(hasher.finalize().into())
            }
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(self);
                Hash::new(hasher.finalize().into())
            }
            HashAlgorithm::Sha3_256 => {
                let mut hasher = Sha3_256::new();
                hasher.update(self);
                Hash::new(hasher.finalize().into())
            }
        }
    }
}

impl<const N: usize> Hashable for [u8; N] {
    fn hash(&self) -> Hash {
        self.as_slice().hash()
    }

    fn hash_with(&self, algorithm: HashAlgorithm) -> Hash {
        self.as_slice().hash_with(algorithm)
    }
}

impl Hashable for str {
    fn hash(&self) -> Hash {
        self.as_bytes().hash()
    }

    fn hash_with(&self, algorithm: HashAlgorithm) -> Hash {
        self.as_bytes().hash_with(algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_basic() {
        let data = b"Hello, World!";
        let hash1 = data.hash();
        let hash2 = data.hash();
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_keccak_empty() {
        let hash = b"".hash();
        assert_eq!(
            hash.to_hex(),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_hash_algorithms() {
        let data = b"test data";
        let keccak = data.hash_with(HashAlgorithm::Keccak256);
        let sha256 = data.hash_with(HashAlgorithm::Sha256);
        let sha3 = data.hash_with(HashAlgorithm::Sha3_256);

        assert_ne!(keccak, sha256);
        assert_ne!(keccak, sha3);
        assert_ne!(sha256, sha3);
    }

    #[test]
    fn test_known_digests() {
        assert_eq!(
            b"abc".hash_with(HashAlgorithm::Sha256).to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            b"abc".hash_with(HashAlgorithm::Sha3_256).to_hex(),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
        assert_eq!(
            b"abc".hash_with(HashAlgorithm::Keccak256),
            Hash::new([
                0x4e, 0x03, 0x65, 0x7a, 0xea, 0x45, 0xa9, 0x4f, 0xc7, 0xd4, 0x7b, 0xa8, 0x26, 0xc8,
                0xd6, 0x67, 0xc0, 0xd1, 0xe6, 0xe3, 0x3a, 0x64, 0xa0, 0x36, 0xec, 0x44, 0xf5, 0x8f,
                0xa1, 0x2d, 0x6c, 0x45,
            ])
        );
    }

    #[test]
    fn test_selector_prefix() {
        let hash = "getValue()".hash();
        assert_eq!(hash.prefix4(), [0x20, 0x96, 0x52, 0x55]);
    }

    #[test]
    fn test_hash_hex() {
        let hash = b"test".hash();
        let parsed = Hash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);

        let prefixed = Hash::from_hex(&format!("0x{}", hash.to_hex())).unwrap();
        assert_eq!(hash, prefixed);
        assert!(Hash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("keccak256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Keccak256);
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert!("blake3".parse::<HashAlgorithm>().is_err());
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Keccak256);
    }
}
