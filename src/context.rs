//! Explicit validation context.
//!
//! Everything a contract is validated against travels in a
//! [`ValidationContext`]: the register store, the ledger snapshot and the
//! runtime configuration.

use crate::condition::{self, Condition, ConditionError, Warning};
use crate::config::Config;
use crate::operation::{CalcError, Calculator, Transition};
use crate::register::contract::Contract;
use crate::storage::{ReadFlags, RegisterStore};

/// Chain values the `LEDGER::*` opcodes read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub height: u32,
    pub timestamp: u64,
    pub supply: u64,
}

/// What a condition script may read while it executes.
#[derive(Clone, Copy)]
pub struct ConditionContext<'a> {
    /// The contract trying to satisfy the condition.
    pub caller: &'a Contract,
    pub store: &'a dyn RegisterStore,
    pub ledger: LedgerSnapshot,
    pub flags: ReadFlags,
}

pub struct ValidationContext<'a> {
    store: &'a dyn RegisterStore,
    ledger: LedgerSnapshot,
    config: Config,
}

impl<'a> ValidationContext<'a> {
    pub fn new(store: &'a dyn RegisterStore, ledger: LedgerSnapshot, config: Config) -> Self {
        Self {
            store,
            ledger,
            config,
        }
    }

    pub fn ledger(&self) -> &LedgerSnapshot {
        &self.ledger
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fills the verification stream of `contract`.
    pub fn calculate(&self, contract: &mut Contract) -> Result<(), CalcError> {
        Calculator::new(self.store).calculate(contract)
    }

    /// Checks a calculated contract and returns its post-states.
    pub fn replay(&self, contract: &Contract) -> Result<Vec<Transition>, CalcError> {
        Calculator::new(self.store).replay(contract)
    }

    /// Verifies the condition attached to `contract`, if any.
    pub fn verify_condition(&self, contract: &Contract) -> Result<Vec<Warning>, ConditionError> {
        match contract.condition() {
            Some(script) => {
                condition::verify_with_capacity(script.as_slice(), self.config.scratch_capacity)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Executes the condition of `contract` on behalf of `caller`. A contract
    /// without a condition is always satisfied.
    pub fn execute_condition(&self, contract: &Contract, caller: &Contract) -> Result<bool, ConditionError> {
        let Some(script) = contract.condition() else {
            return Ok(true);
        };
        let context = ConditionContext {
            caller,
            store: self.store,
            ledger: self.ledger,
            flags: self.config.read_flags,
        };
        Condition::with_capacity(script.as_slice(), context, self.config.scratch_capacity).execute()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Op;
    use crate::operation::{Operation, commit};
    use crate::register::address::Category;
    use crate::register::state::RegisterType;
    use crate::storage::MemoryStore;
    use crate::types::encoding::Encode;
    use crate::types::identity::{Genesis, TxId};
    use crate::types::value::{Value, ValueType};
    use crate::utils::test_utils::utils::{account_state, raw_state, seed, unique_genesis};

    fn ledger() -> LedgerSnapshot {
        LedgerSnapshot {
            height: 23030,
            timestamp: 947384,
            supply: 39239,
        }
    }

    #[test]
    fn calculate_replay_and_commit_through_the_context() {
        let store = MemoryStore::new();
        let caller = unique_genesis();
        let address = seed(&store, Category::Raw, raw_state(caller, RegisterType::Raw, b"old"));
        let context = ValidationContext::new(&store, ledger(), Config::default());

        let mut contract = Contract::new(caller, 10).with(&Operation::Write {
            address,
            data: b"new".to_vec(),
        });
        context.calculate(&mut contract).unwrap();
        let transitions = context.replay(&contract).unwrap();
        commit(&store, &transitions).unwrap();

        let state = store.read_state(&address, ReadFlags::Default).unwrap().unwrap();
        assert_eq!(state.payload, b"new");
    }

    #[test]
    fn condition_gates_on_the_caller() {
        let store = MemoryStore::new();
        let owner = unique_genesis();
        let claimant = unique_genesis();
        let context = ValidationContext::new(&store, ledger(), Config::default());

        let mut script = vec![Op::CallerGenesis.byte(), Op::Equals.byte()];
        Value::Uint256(claimant.0).encode(&mut script);
        let gated = Contract::new(owner, 5)
            .with(&Operation::Coinbase {
                genesis: owner,
                amount: 1,
            })
            .require(script);
        assert_eq!(context.verify_condition(&gated), Ok(Vec::new()));

        let validate = |genesis: Genesis| {
            Contract::new(genesis, 6).with(&Operation::Validate {
                txid: TxId::default(),
                contract: 0,
            })
        };
        assert_eq!(context.execute_condition(&gated, &validate(claimant)), Ok(true));
        assert_eq!(context.execute_condition(&gated, &validate(owner)), Ok(false));
    }

    #[test]
    fn condition_reads_the_ledger_and_store() {
        let store = MemoryStore::new();
        let owner = unique_genesis();
        let account = seed(&store, Category::Account, account_state(owner, 500));
        let context = ValidationContext::new(&store, ledger(), Config::default());

        let mut script = vec![ValueType::Uint256.tag()];
        script.extend_from_slice(account.as_slice());
        script.push(Op::FieldValue.byte());
        "balance".encode(&mut script);
        script.push(Op::GreaterThan.byte());
        script.push(Op::LedgerHeight.byte());
        let gated = Contract::new(owner, 1).with_condition(script);

        assert_eq!(context.execute_condition(&gated, &Contract::new(owner, 2)), Ok(false));
        assert!(context.verify_condition(&gated).unwrap().is_empty());
    }

    #[test]
    fn verify_and_execute_share_the_configured_capacity() {
        let store = MemoryStore::new();
        let config = Config {
            scratch_capacity: 4096,
            ..Config::default()
        };
        let context = ValidationContext::new(&store, ledger(), config);

        let half = "x".repeat(600);
        let mut script = Vec::new();
        Value::String(half.clone()).encode(&mut script);
        script.push(Op::Cat.byte());
        Value::String(half).encode(&mut script);
        script.push(Op::Equals.byte());
        Value::String("x".repeat(1200)).encode(&mut script);
        let gated = Contract::new(Genesis::zero(), 1).with_condition(script);

        assert_eq!(context.verify_condition(&gated), Ok(Vec::new()));
        assert_eq!(context.execute_condition(&gated, &Contract::new(Genesis::zero(), 2)), Ok(true));

        let small = ValidationContext::new(&store, ledger(), Config::default());
        assert!(matches!(
            small.verify_condition(&gated),
            Err(ConditionError::Scratch(_))
        ));
        assert!(matches!(
            small.execute_condition(&gated, &Contract::new(Genesis::zero(), 2)),
            Err(ConditionError::Scratch(_))
        ));
    }

    #[test]
    fn missing_condition_is_satisfied() {
        let store = MemoryStore::new();
        let context = ValidationContext::new(&store, ledger(), Config::default());
        let plain = Contract::new(Genesis::zero(), 0);
        assert_eq!(context.execute_condition(&plain, &plain), Ok(true));
        assert_eq!(context.verify_condition(&plain), Ok(Vec::new()));
    }
}
