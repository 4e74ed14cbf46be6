//! In-memory register store.

use crate::register::address::Address;
use crate::register::state::State;
use crate::storage::register_store::{ReadFlags, RegisterStore, StoreError};
use crate::types::identity::Genesis;
use dashmap::DashMap;

/// Concurrent in-memory store.
///
/// States are kept serialized, the way a disk-backed store would hold them.
/// Mempool writes are staged apart from committed state and only show through
/// [`ReadFlags::Mempool`].
#[derive(Default)]
pub struct MemoryStore {
    committed: DashMap<Address, Vec<u8>>,
    mempool: DashMap<Address, Vec<u8>>,
    trust: DashMap<Genesis, Address>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a pending state visible only to mempool reads.
    pub fn stage(&self, address: &Address, state: &State) {
        self.mempool.insert(*address, state.serialize());
    }

    /// Drops every staged mempool state.
    pub fn clear_mempool(&self) {
        self.mempool.clear();
    }

    /// Number of committed registers.
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    fn parse(address: &Address, bytes: &[u8]) -> Result<State, StoreError> {
        State::parse(bytes).map_err(|_| StoreError::Corrupt { address: *address })
    }
}

impl RegisterStore for MemoryStore {
    fn read_state(&self, address: &Address, flags: ReadFlags) -> Result<Option<State>, StoreError> {
        if flags == ReadFlags::Mempool {
            if let Some(bytes) = self.mempool.get(address) {
                return Self::parse(address, &bytes).map(Some);
            }
        }
        match self.committed.get(address) {
            Some(bytes) => Self::parse(address, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn write_state(&self, address: &Address, state: &State) -> Result<(), StoreError> {
        self.committed.insert(*address, state.serialize());
        self.mempool.remove(address);
        Ok(())
    }

    fn read_trust(&self, genesis: &Genesis) -> Result<Option<Address>, StoreError> {
        Ok(self.trust.get(genesis).map(|entry| *entry))
    }

    fn index_trust(&self, genesis: &Genesis, address: &Address) -> Result<(), StoreError> {
        self.trust.insert(*genesis, *address);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::address::Category;
    use crate::register::state::RegisterType;
    use crate::utils::test_utils::utils::{raw_state, unique_genesis};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn missing_register_reads_none() {
        let store = MemoryStore::new();
        let address = Address::random(Category::Raw);
        assert_eq!(store.read_state(&address, ReadFlags::Default), Ok(None));
        assert!(store.is_empty());
    }

    #[test]
    fn committed_state_is_visible_to_every_view() {
        let store = MemoryStore::new();
        let address = Address::random(Category::Raw);
        let state = raw_state(unique_genesis(), RegisterType::Raw, b"committed");
        store.write_state(&address, &state).unwrap();
        for flags in [ReadFlags::Default, ReadFlags::PreState, ReadFlags::Mempool] {
            assert_eq!(store.read_state(&address, flags).unwrap(), Some(state.clone()));
        }
    }

    #[test]
    fn staged_state_only_shows_through_mempool() {
        let store = MemoryStore::new();
        let address = Address::random(Category::Raw);
        let committed = raw_state(unique_genesis(), RegisterType::Raw, b"old");
        let pending = raw_state(committed.owner, RegisterType::Raw, b"new");
        store.write_state(&address, &committed).unwrap();
        store.stage(&address, &pending);

        assert_eq!(store.read_state(&address, ReadFlags::Default).unwrap(), Some(committed.clone()));
        assert_eq!(store.read_state(&address, ReadFlags::PreState).unwrap(), Some(committed));
        assert_eq!(store.read_state(&address, ReadFlags::Mempool).unwrap(), Some(pending.clone()));

        store.write_state(&address, &pending).unwrap();
        assert_eq!(store.read_state(&address, ReadFlags::Mempool).unwrap(), Some(pending));
    }

    #[test]
    fn trust_index_round_trip() {
        let store = MemoryStore::new();
        let genesis = unique_genesis();
        let address = Address::named("trust", &genesis, Category::Trust);
        assert_eq!(store.read_trust(&genesis), Ok(None));
        store.index_trust(&genesis, &address).unwrap();
        assert_eq!(store.read_trust(&genesis), Ok(Some(address)));
    }

    #[test]
    fn corrupt_bytes_are_reported() {
        let store = MemoryStore::new();
        let address = Address::random(Category::Raw);
        store.committed.insert(address, vec![1, 2, 3]);
        assert_eq!(
            store.read_state(&address, ReadFlags::Default),
            Err(StoreError::Corrupt { address })
        );
    }

    #[test]
    fn concurrent_writers() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..25 {
                        let address = Address::random(Category::Raw);
                        let state = raw_state(unique_genesis(), RegisterType::Raw, b"x");
                        store.write_state(&address, &state).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 100);
    }
}
