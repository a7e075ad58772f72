//! Contract store seam: durable get/put by contract id.

use std::collections::BTreeMap;

use meterpay_types::{Contract, ContractId};

/// Key-value mapping from contract id to contract record.
pub trait ContractStore {
    fn get(&self, id: ContractId) -> Option<Contract>;

    /// Insert or overwrite the record stored under `contract.id`.
    fn put(&mut self, contract: Contract);
}

/// In-process contract store.
#[derive(Debug, Clone, Default)]
pub struct MemoryContractStore {
    contracts: BTreeMap<ContractId, Contract>,
}

impl MemoryContractStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            contracts: BTreeMap::new(),
        }
    }

    /// Number of stored contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// All contracts in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.values()
    }
}

impl ContractStore for MemoryContractStore {
    fn get(&self, id: ContractId) -> Option<Contract> {
        self.contracts.get(&id).cloned()
    }

    fn put(&mut self, contract: Contract) {
        self.contracts.insert(contract.id, contract);
    }
}

#[cfg(test)]
mod tests {
    use meterpay_types::MeterType;

    use super::*;

    #[test]
    fn get_missing_is_none() {
        let store = MemoryContractStore::new();
        assert!(store.get(ContractId(1)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn put_then_get() {
        let mut store = MemoryContractStore::new();
        let contract = Contract::dummy(1, MeterType::UsageCounted, 10, 1000);
        store.put(contract.clone());
        assert_eq!(store.get(ContractId(1)), Some(contract));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_overwrites() {
        let mut store = MemoryContractStore::new();
        let mut contract = Contract::dummy(1, MeterType::UsageCounted, 10, 1000);
        store.put(contract.clone());
        contract.paid = 200;
        store.put(contract);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(ContractId(1)).unwrap().paid, 200);
    }

    #[test]
    fn iter_in_id_order() {
        let mut store = MemoryContractStore::new();
        for id in [3, 1, 2] {
            store.put(Contract::dummy(id, MeterType::HeightElapsed, 1, 10));
        }
        let ids: Vec<u64> = store.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
