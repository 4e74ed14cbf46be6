//! Replay and commit of calculated contracts.
//!
//! Replay re-runs a contract's operation against the store and checks every
//! entry of its verification stream: recorded pre-states must equal the
//! store's pre-state view and post-state checksums must match the re-executed
//! state. The resulting [`Transition`]s are written by [`commit`], the only
//! step that mutates the store.

use crate::info;
use crate::operation::calculator::{Calculator, Trail};
use crate::operation::errors::CalcError;
use crate::register::address::Address;
use crate::register::contract::{Contract, Marker};
use crate::register::state::State;
use crate::register::stream::Stream;
use crate::storage::{RegisterStore, StoreError};
use crate::types::hash::Hash;
use crate::types::identity::Genesis;

/// Post-state of one register after a contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub address: Address,
    pub state: State,
    /// Owner to index this register for as its trust register (GENESIS).
    pub trust_index: Option<Genesis>,
}

/// Reads a verification stream back and compares each entry.
struct Checker<'s>(&'s mut Stream);

impl Checker<'_> {
    fn marker(&mut self, expected: Marker) -> Result<(), CalcError> {
        match self.0.read::<Marker>() {
            Ok(marker) if marker == expected => Ok(()),
            Ok(_) | Err(_) => Err(CalcError::Verification(match expected {
                Marker::PreState => "expected pre-state marker",
                Marker::PostState => "expected post-state marker",
            })),
        }
    }
}

impl Trail for Checker<'_> {
    fn pre_state(&mut self, address: &Address, state: &State) -> Result<(), CalcError> {
        self.marker(Marker::PreState)?;
        let recorded: State = self.0.read()?;
        if recorded != *state {
            return Err(CalcError::PreStateMismatch(*address));
        }
        Ok(())
    }

    fn post_state(&mut self, address: &Address, state: &State) -> Result<(), CalcError> {
        self.marker(Marker::PostState)?;
        let recorded: Hash = self.0.read()?;
        if recorded != state.checksum() {
            return Err(CalcError::ChecksumMismatch(*address));
        }
        Ok(())
    }
}

impl Calculator<'_> {
    /// Re-executes `contract` and checks it against its verification stream.
    pub fn replay(&self, contract: &Contract) -> Result<Vec<Transition>, CalcError> {
        let mut operations = contract.operation().clone();
        let mut verification = contract.verification().clone();
        operations.reset();
        verification.reset();

        let transitions = self.run(
            &mut operations,
            *contract.caller(),
            contract.timestamp(),
            &mut Checker(&mut verification),
        )?;
        if !verification.end() {
            return Err(CalcError::Verification("unexpected trailing entries"));
        }
        Ok(transitions)
    }
}

/// Writes `transitions` to `store` in order.
pub fn commit(store: &dyn RegisterStore, transitions: &[Transition]) -> Result<(), StoreError> {
    for transition in transitions {
        store.write_state(&transition.address, &transition.state)?;
        if let Some(owner) = &transition.trust_index {
            store.index_trust(owner, &transition.address)?;
        }
        info!(
            "committed register {} at {}",
            transition.address, transition.state.modified
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::isa::Operation;
    use crate::register::address::Category;
    use crate::register::object::Object;
    use crate::register::state::RegisterType;
    use crate::storage::{MemoryStore, OverlayStore, ReadFlags};
    use crate::utils::test_utils::utils::{
        account_state, field_u64, object_state, raw_state, seed, unique_genesis,
    };

    fn calculated(store: &MemoryStore, contract: Contract) -> Contract {
        let mut contract = contract;
        Calculator::new(store).calculate(&mut contract).unwrap();
        contract
    }

    #[test]
    fn replay_returns_post_states() {
        let store = MemoryStore::new();
        let caller = unique_genesis();
        let address = seed(&store, Category::Account, account_state(caller, 80));
        let contract = calculated(
            &store,
            Contract::new(caller, 4).with(&Operation::Credit {
                txid: Default::default(),
                contract: 0,
                to: address,
                proof: Address::zero(),
                amount: 20,
            }),
        );

        let transitions = Calculator::new(&store).replay(&contract).unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].address, address);
        assert_eq!(field_u64(&transitions[0].state, "balance"), 100);
        assert!(transitions[0].trust_index.is_none());
    }

    #[test]
    fn replay_detects_changed_pre_state() {
        let store = MemoryStore::new();
        let caller = unique_genesis();
        let address = seed(&store, Category::Raw, raw_state(caller, RegisterType::Raw, b"one"));
        let contract = calculated(
            &store,
            Contract::new(caller, 4).with(&Operation::Write {
                address,
                data: b"two".to_vec(),
            }),
        );

        store
            .write_state(&address, &raw_state(caller, RegisterType::Raw, b"other"))
            .unwrap();
        assert_eq!(
            Calculator::new(&store).replay(&contract),
            Err(CalcError::PreStateMismatch(address))
        );
    }

    #[test]
    fn replay_detects_forged_checksum() {
        let store = MemoryStore::new();
        let caller = unique_genesis();
        let address = Address::random(Category::Raw);
        let mut contract = calculated(
            &store,
            Contract::new(caller, 4).with(&Operation::Create {
                address,
                register_type: RegisterType::Raw,
                data: b"payload".to_vec(),
            }),
        );

        let verification = contract.verification_mut();
        verification.clear();
        verification.write(&Marker::PostState).write(&Hash::digest(b"forged"));
        assert_eq!(
            Calculator::new(&store).replay(&contract),
            Err(CalcError::ChecksumMismatch(address))
        );
    }

    #[test]
    fn replay_rejects_missing_entries() {
        let store = MemoryStore::new();
        let caller = unique_genesis();
        let address = seed(&store, Category::Raw, raw_state(caller, RegisterType::Raw, b""));
        let mut contract = Contract::new(caller, 4).with(&Operation::Append {
            address,
            data: b"x".to_vec(),
        });
        assert_eq!(
            Calculator::new(&store).replay(&contract),
            Err(CalcError::Verification("expected pre-state marker"))
        );

        Calculator::new(&store).calculate(&mut contract).unwrap();
        contract.verification_mut().write(&Marker::PostState);
        assert_eq!(
            Calculator::new(&store).replay(&contract),
            Err(CalcError::Verification("unexpected trailing entries"))
        );
    }

    #[test]
    fn commit_applies_transitions_and_trust_index() {
        let store = MemoryStore::new();
        let caller = unique_genesis();
        let trust = object_state(caller, &Object::trust([2; 32]));
        let address = seed(&store, Category::Trust, trust);
        let contract = calculated(
            &store,
            Contract::new(caller, 9).with(&Operation::Genesis { address, reward: 5 }),
        );

        let transitions = Calculator::new(&store).replay(&contract).unwrap();
        assert_eq!(transitions[0].trust_index, Some(caller));
        commit(&store, &transitions).unwrap();

        assert_eq!(store.read_trust(&caller), Ok(Some(address)));
        let state = store.read_state(&address, ReadFlags::Default).unwrap().unwrap();
        assert_eq!(state.modified, 9);
        assert_eq!(field_u64(&state, "balance"), 5);
    }

    #[test]
    fn sequential_contracts_through_an_overlay() {
        let base = MemoryStore::new();
        let caller = unique_genesis();
        let address = seed(&base, Category::Append, raw_state(caller, RegisterType::Append, b"a"));
        let overlay = OverlayStore::new(&base);

        for (timestamp, data) in [(1, b"b"), (2, b"c")] {
            let mut contract = Contract::new(caller, timestamp).with(&Operation::Append {
                address,
                data: data.to_vec(),
            });
            let calculator = Calculator::new(&overlay);
            calculator.calculate(&mut contract).unwrap();
            let transitions = calculator.replay(&contract).unwrap();
            commit(&overlay, &transitions).unwrap();
        }

        let unchanged = base.read_state(&address, ReadFlags::Default).unwrap().unwrap();
        assert_eq!(unchanged.payload, b"a");
        overlay.apply(&base).unwrap();
        let state = base.read_state(&address, ReadFlags::Default).unwrap().unwrap();
        assert_eq!(state.payload, b"abc");
        assert_eq!(state.modified, 2);
    }
}
