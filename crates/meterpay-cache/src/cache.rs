//! In-memory contract cache keyed by `provider/service/client`.
//!
//! Cache-aside: `get` serves a hit directly; on a miss it asks the
//! [`ContractFetcher`], stores the result and returns it. The cache also
//! tracks the latest chain height the provider has observed so request
//! handlers can tell whether a cached contract is still open.
//!
//! All methods take `&self`; the cache can be shared across request
//! handlers behind an `Arc`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock};

use meterpay_types::{Contract, MeterpayError, Result};

use crate::fetcher::{ContractFetcher, NoRemote};

/// Cache key for the contract between `provider` and `client` on `service`.
#[must_use]
pub fn contract_key(contract: &Contract) -> String {
    ContractCache::<NoRemote>::key(
        &contract.provider.to_string(),
        contract.service.as_str(),
        &contract.client.to_string(),
    )
}

/// Shared contract cache with a remote fallback and an observed height.
pub struct ContractCache<F = NoRemote> {
    entries: RwLock<HashMap<String, Contract>>,
    height: AtomicI64,
    fetcher: F,
}

impl ContractCache<NoRemote> {
    /// Cache without a remote source; misses fail with `FetchFailed`.
    #[must_use]
    pub fn local() -> Self {
        Self::new(NoRemote)
    }
}

impl<F: ContractFetcher> ContractCache<F> {
    /// Empty cache at height 0 that falls back to `fetcher` on a miss.
    pub fn new(fetcher: F) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            height: AtomicI64::new(0),
            fetcher,
        }
    }

    /// Join the three key parts with `/`.
    #[must_use]
    pub fn key(provider: &str, service: &str, client: &str) -> String {
        format!("{provider}/{service}/{client}")
    }

    /// Record the latest height observed by the provider.
    pub fn set_height(&self, height: i64) {
        self.height.store(height, Ordering::Release);
    }

    /// Latest recorded height.
    #[must_use]
    pub fn height(&self) -> i64 {
        self.height.load(Ordering::Acquire)
    }

    /// Store `contract` under `key`, replacing any previous entry.
    pub fn put(&self, key: impl Into<String>, contract: Contract) {
        let key = key.into();
        tracing::debug!(key = %key, contract = %contract.id, "Contract cached");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, contract);
    }

    /// Store `contract` under its own `provider/service/client` key.
    pub fn insert(&self, contract: Contract) {
        self.put(contract_key(&contract), contract);
    }

    /// Cached entry only, never consulting the remote.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<Contract> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Contract for `key`, fetching and caching it on a miss.
    ///
    /// # Errors
    /// Returns [`MeterpayError::FetchFailed`] if the key is not cached and
    /// the remote lookup fails. A failed lookup caches nothing.
    pub fn get(&self, key: &str) -> Result<Contract> {
        if let Some(contract) = self.peek(key) {
            return Ok(contract);
        }

        tracing::debug!(key = %key, "Contract cache miss, fetching");
        match self.fetcher.fetch(key) {
            Ok(contract) => {
                self.put(key, contract.clone());
                Ok(contract)
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "Contract fetch failed");
                Err(err)
            }
        }
    }

    /// Like [`get`](Self::get) but rejects contracts closed at the
    /// cache's current height.
    ///
    /// # Errors
    /// `FetchFailed` as for `get`; `ContractClosed` if the contract no
    /// longer accepts claims.
    pub fn get_open(&self, key: &str) -> Result<Contract> {
        let contract = self.get(key)?;
        let height = self.height();
        if contract.is_closed(height) {
            return Err(MeterpayError::ContractClosed {
                id: contract.id,
                height,
            });
        }
        Ok(contract)
    }

    /// Drop the entry for `key`, returning it if present.
    pub fn evict(&self, key: &str) -> Option<Contract> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use meterpay_types::MeterType;

    use super::*;

    /// Serves one contract and counts how often it was asked.
    struct CountingFetcher {
        contract: Contract,
        calls: Cell<u32>,
    }

    impl ContractFetcher for CountingFetcher {
        fn fetch(&self, key: &str) -> Result<Contract> {
            self.calls.set(self.calls.get() + 1);
            if key == contract_key(&self.contract) {
                Ok(self.contract.clone())
            } else {
                Err(MeterpayError::FetchFailed {
                    key: key.to_string(),
                    reason: "404".into(),
                })
            }
        }
    }

    #[test]
    fn key_joins_parts() {
        assert_eq!(ContractCache::<NoRemote>::key("foo", "bar", "baz"), "foo/bar/baz");
    }

    #[test]
    fn height_roundtrip() {
        let cache = ContractCache::local();
        assert_eq!(cache.height(), 0);
        cache.set_height(30);
        assert_eq!(cache.height(), 30);
    }

    #[test]
    fn put_then_get_hits() {
        let cache = ContractCache::local();
        let mut contract = Contract::dummy(1, MeterType::UsageCounted, 10, 1000);
        contract.start_height = 4;
        let key = contract_key(&contract);

        cache.put(key.clone(), contract);
        let cached = cache.get(&key).unwrap();
        assert_eq!(cached.start_height, 4);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn miss_without_remote_fails() {
        let cache = ContractCache::local();
        let err = cache.get("p/s/c").unwrap_err();
        assert!(matches!(err, MeterpayError::FetchFailed { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn miss_fetches_once_then_hits() {
        let contract = Contract::dummy(3, MeterType::HeightElapsed, 3, 500);
        let key = contract_key(&contract);
        let cache = ContractCache::new(CountingFetcher {
            contract: contract.clone(),
            calls: Cell::new(0),
        });

        assert_eq!(cache.get(&key).unwrap().rate, 3);
        assert_eq!(cache.get(&key).unwrap(), contract);
        assert_eq!(cache.fetcher.calls.get(), 1);
        assert_eq!(cache.peek(&key), Some(contract));
    }

    #[test]
    fn failed_fetch_caches_nothing() {
        let contract = Contract::dummy(3, MeterType::UsageCounted, 3, 500);
        let cache = ContractCache::new(CountingFetcher {
            contract,
            calls: Cell::new(0),
        });
        assert!(cache.get("x/y/z").is_err());
        assert!(cache.get("x/y/z").is_err());
        assert_eq!(cache.fetcher.calls.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn get_open_respects_cache_height() {
        let cache = ContractCache::local();
        let mut contract = Contract::dummy(1, MeterType::UsageCounted, 10, 1000);
        contract.start_height = 10;
        let key = contract_key(&contract);
        cache.insert(contract);

        cache.set_height(20);
        assert!(cache.get_open(&key).is_ok());

        cache.set_height(120);
        let err = cache.get_open(&key).unwrap_err();
        assert!(matches!(err, MeterpayError::ContractClosed { height: 120, .. }));
        // Plain get still serves the closed record.
        assert!(cache.get(&key).is_ok());
    }

    #[test]
    fn evict_forces_refetch() {
        let contract = Contract::dummy(3, MeterType::UsageCounted, 3, 500);
        let key = contract_key(&contract);
        let cache = ContractCache::new(CountingFetcher {
            contract,
            calls: Cell::new(0),
        });
        cache.get(&key).unwrap();
        assert!(cache.evict(&key).is_some());
        cache.get(&key).unwrap();
        assert_eq!(cache.fetcher.calls.get(), 2);
    }
}
