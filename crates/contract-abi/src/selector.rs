// contract-abi/src/selector.rs

use blockchain_crypto::{HashAlgorithm, Hashable};
use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Four-byte function selector, in the order it appears on the wire
pub type Selector = [u8; 4];

static GLOBAL: Lazy<SelectorCache> = Lazy::new(SelectorCache::new);

/// Append-only memo of signature -> selector
///
/// Entries are never evicted. Concurrent callers racing on the same key both
/// compute the same value, and the first insert wins.
#[derive(Debug, Default)]
pub struct SelectorCache {
    entries: DashMap<(HashAlgorithm, String), Selector>,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// The process-wide instance used by method descriptors
    pub fn global() -> &'static SelectorCache {
        &GLOBAL
    }

    pub fn selector(&self, signature: &str, algorithm: HashAlgorithm) -> Selector {
        let key = (algorithm, signature.to_string());
        if let Some(hit) = self.entries.get(&key) {
            return *hit;
        }
        let computed = signature.hash_with(algorithm).prefix4();
        *self.entries.entry(key).or_insert(computed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_selector_known_values() {
        let cache = SelectorCache::new();
        assert_eq!(cache.selector("getValue()", HashAlgorithm::Keccak256), [0x20, 0x96, 0x52, 0x55]);
        assert_eq!(cache.selector("get()", HashAlgorithm::Keccak256), [0x6d, 0x4c, 0xe6, 0x3c]);
        assert_eq!(cache.len(), 2);

        cache.selector("get()", HashAlgorithm::Keccak256);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_selector_per_algorithm() {
        let cache = SelectorCache::new();
        let keccak = cache.selector("get()", HashAlgorithm::Keccak256);
        let sha3 = cache.selector("get()", HashAlgorithm::Sha3_256);
        assert_ne!(keccak, sha3);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_inserts() {
        let cache = Arc::new(SelectorCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                thread::spawn(move || {
                    let sig = format!("f{}(uint256)", i % 4);
                    cache.selector(&sig, HashAlgorithm::Keccak256)
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
    }
}
