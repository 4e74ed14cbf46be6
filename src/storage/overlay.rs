//! Buffered writes over a shared store.

use crate::register::address::Address;
use crate::register::state::State;
use crate::storage::register_store::{ReadFlags, RegisterStore, StoreError};
use crate::types::identity::Genesis;
use dashmap::DashMap;

/// Write-through overlay on top of a base store.
///
/// Reads fall through to the base for registers not yet written here, so a
/// validation session sees its own earlier transitions while the shared store
/// stays untouched until the writes are applied.
pub struct OverlayStore<'a> {
    base: &'a dyn RegisterStore,
    writes: DashMap<Address, State>,
    trust: DashMap<Genesis, Address>,
}

/// Pending writes of an overlay, ordered by key.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct OverlayWrites {
    pub states: Vec<(Address, State)>,
    pub trust: Vec<(Genesis, Address)>,
}

impl<'a> OverlayStore<'a> {
    pub fn new(base: &'a dyn RegisterStore) -> Self {
        Self {
            base,
            writes: DashMap::new(),
            trust: DashMap::new(),
        }
    }

    /// Consumes the overlay and returns its pending writes.
    pub fn into_writes(self) -> OverlayWrites {
        let mut states: Vec<_> = self.writes.into_iter().collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        let mut trust: Vec<_> = self.trust.into_iter().collect();
        trust.sort_by(|a, b| a.0.cmp(&b.0));
        OverlayWrites { states, trust }
    }

    /// Applies the pending writes to `store`.
    pub fn apply(self, store: &dyn RegisterStore) -> Result<(), StoreError> {
        let writes = self.into_writes();
        for (address, state) in &writes.states {
            store.write_state(address, state)?;
        }
        for (genesis, address) in &writes.trust {
            store.index_trust(genesis, address)?;
        }
        Ok(())
    }
}

impl RegisterStore for OverlayStore<'_> {
    fn read_state(&self, address: &Address, flags: ReadFlags) -> Result<Option<State>, StoreError> {
        if let Some(state) = self.writes.get(address) {
            return Ok(Some(state.clone()));
        }
        self.base.read_state(address, flags)
    }

    fn write_state(&self, address: &Address, state: &State) -> Result<(), StoreError> {
        self.writes.insert(*address, state.clone());
        Ok(())
    }

    fn read_trust(&self, genesis: &Genesis) -> Result<Option<Address>, StoreError> {
        if let Some(address) = self.trust.get(genesis) {
            return Ok(Some(*address));
        }
        self.base.read_trust(genesis)
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
    use crate::storage::MemoryStore;
    use crate::utils::test_utils::utils::{raw_state, seed, unique_genesis};

    #[test]
    fn overlay_reads_through_to_base() {
        let base = MemoryStore::new();
        let state = raw_state(unique_genesis(), RegisterType::Raw, b"value");
        let address = seed(&base, Category::Raw, state.clone());
        let overlay = OverlayStore::new(&base);
        assert_eq!(overlay.read_state(&address, ReadFlags::Default).unwrap(), Some(state));
    }

    #[test]
    fn overlay_writes_stay_local() {
        let base = MemoryStore::new();
        let original = raw_state(unique_genesis(), RegisterType::Raw, b"old");
        let address = seed(&base, Category::Raw, original.clone());
        let overlay = OverlayStore::new(&base);

        let updated = raw_state(original.owner, RegisterType::Raw, b"new");
        overlay.write_state(&address, &updated).unwrap();
        assert_eq!(overlay.read_state(&address, ReadFlags::PreState).unwrap(), Some(updated));
        assert_eq!(base.read_state(&address, ReadFlags::Default).unwrap(), Some(original));
    }

    #[test]
    fn into_writes_is_sorted() {
        let base = MemoryStore::new();
        let overlay = OverlayStore::new(&base);
        let mut low = Address::random(Category::Raw);
        low.0[0] = 0;
        let mut high = low;
        high.0[0] = 9;
        let state = raw_state(unique_genesis(), RegisterType::Raw, b"");
        overlay.write_state(&high, &state).unwrap();
        overlay.write_state(&low, &state).unwrap();

        let writes = overlay.into_writes();
        let keys: Vec<_> = writes.states.iter().map(|(address, _)| *address).collect();
        assert_eq!(keys, vec![low, high]);
    }

    #[test]
    fn apply_flushes_states_and_trust() {
        let base = MemoryStore::new();
        let overlay = OverlayStore::new(&base);
        let genesis = unique_genesis();
        let address = Address::named("trust", &genesis, Category::Trust);
        let state = raw_state(genesis, RegisterType::Object, b"");
        overlay.write_state(&address, &state).unwrap();
        overlay.index_trust(&genesis, &address).unwrap();
        assert_eq!(base.read_trust(&genesis), Ok(None));

        overlay.apply(&base).unwrap();
        assert_eq!(base.read_trust(&genesis), Ok(Some(address)));
        assert_eq!(base.read_state(&address, ReadFlags::Default).unwrap(), Some(state));
    }
}
