//! Nullable store: thread-safe in-memory storage for testing.

use gdao_store::{AccountStore, GovernanceStore, MetaStore, StakingStore, StoreError};
use gdao_types::Address;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// An in-memory implementation of every store trait.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Debug, Default)]
pub struct NullStore {
    accounts: Mutex<BTreeMap<Address, Vec<u8>>>,
    pools: Mutex<BTreeMap<u32, Vec<u8>>>,
    positions: Mutex<BTreeMap<u64, Vec<u8>>>,
    proposals: Mutex<BTreeMap<u64, Vec<u8>>>,
    votes: Mutex<HashMap<u64, Vec<(Address, Vec<u8>)>>>,
    meta: Mutex<HashMap<String, Vec<u8>>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored votes across all proposals.
    pub fn vote_count(&self) -> usize {
        self.votes.lock().unwrap().values().map(Vec::len).sum()
    }
}

impl AccountStore for NullStore {
    fn get_account(&self, address: &Address) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    fn put_account(&self, address: &Address, data: &[u8]) -> Result<(), StoreError> {
        self.accounts
            .lock()
            .unwrap()
            .insert(address.clone(), data.to_vec());
        Ok(())
    }

    fn iter_accounts(&self) -> Result<Vec<(Address, Vec<u8>)>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        Ok(self.accounts.lock().unwrap().len() as u64)
    }
}

impl StakingStore for NullStore {
    fn put_pool(&self, pool_id: u32, data: &[u8]) -> Result<(), StoreError> {
        self.pools.lock().unwrap().insert(pool_id, data.to_vec());
        Ok(())
    }

    fn iter_pools(&self) -> Result<Vec<(u32, Vec<u8>)>, StoreError> {
        Ok(self
            .pools
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }

    fn put_position(&self, position_id: u64, data: &[u8]) -> Result<(), StoreError> {
        self.positions
            .lock()
            .unwrap()
            .insert(position_id, data.to_vec());
        Ok(())
    }

    fn get_position(&self, position_id: u64) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.positions.lock().unwrap().get(&position_id).cloned())
    }

    fn delete_position(&self, position_id: u64) -> Result<(), StoreError> {
        self.positions.lock().unwrap().remove(&position_id);
        Ok(())
    }

    fn iter_positions(&self) -> Result<Vec<(u64, Vec<u8>)>, StoreError> {
        Ok(self
            .positions
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }
}

impl GovernanceStore for NullStore {
    fn put_proposal(&self, id: u64, data: &[u8]) -> Result<(), StoreError> {
        self.proposals.lock().unwrap().insert(id, data.to_vec());
        Ok(())
    }

    fn get_proposal(&self, id: u64) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.proposals.lock().unwrap().get(&id).cloned())
    }

    fn iter_proposals(&self) -> Result<Vec<(u64, Vec<u8>)>, StoreError> {
        Ok(self
            .proposals
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }

    fn put_vote(&self, proposal: u64, voter: &Address, data: &[u8]) -> Result<(), StoreError> {
        let mut votes = self.votes.lock().unwrap();
        let entries = votes.entry(proposal).or_default();
        if entries.iter().any(|(v, _)| v == voter) {
            return Err(StoreError::Duplicate(format!("vote {proposal}/{voter}")));
        }
        entries.push((voter.clone(), data.to_vec()));
        Ok(())
    }

    fn has_vote(&self, proposal: u64, voter: &Address) -> Result<bool, StoreError> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .get(&proposal)
            .is_some_and(|entries| entries.iter().any(|(v, _)| v == voter)))
    }

    fn get_votes(&self, proposal: u64) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .get(&proposal)
            .map(|entries| entries.iter().map(|(_, data)| data.clone()).collect())
            .unwrap_or_default())
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.meta
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.meta.lock().unwrap().get(key).cloned())
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        self.meta.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_vote_is_rejected() {
        let store = NullStore::new();
        let voter = Address::new("alice");
        store.put_vote(1, &voter, b"first").unwrap();
        assert!(matches!(
            store.put_vote(1, &voter, b"second"),
            Err(StoreError::Duplicate(_))
        ));
        assert!(store.has_vote(1, &voter).unwrap());
        assert_eq!(store.get_votes(1).unwrap(), vec![b"first".to_vec()]);
        store.put_vote(2, &voter, b"other proposal").unwrap();
        assert_eq!(store.vote_count(), 2);
    }

    #[test]
    fn schema_version_defaults_to_zero() {
        let store = NullStore::new();
        assert_eq!(store.get_schema_version().unwrap(), 0);
        store.set_schema_version(3).unwrap();
        assert_eq!(store.get_schema_version().unwrap(), 3);
    }

    #[test]
    fn deleted_positions_disappear() {
        let store = NullStore::new();
        store.put_position(1, b"p1").unwrap();
        store.put_position(2, b"p2").unwrap();
        store.delete_position(1).unwrap();
        assert_eq!(store.get_position(1).unwrap(), None);
        assert_eq!(store.iter_positions().unwrap().len(), 1);
    }
}
