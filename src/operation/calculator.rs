//! State-transition calculator.
//!
//! Decodes the operation of a contract, fetches the pre-state of the register
//! it targets, runs the matching executor on a local copy and records the
//! transition in the contract's verification stream:
//!
//! ```text
//! PRESTATE  <serialized pre-state>     (omitted for CREATE)
//! POSTSTATE <SHA3-256 checksum of the post-state>
//! ```
//!
//! The calculator never writes to the store; [`replay`](super::replay) turns a
//! recorded contract into [`Transition`]s that the apply step commits.

use crate::operation::errors::{CalcError, ExecError};
use crate::operation::isa::{Opcode, Operation};
use crate::operation::replay::Transition;
use crate::operation::{append, claim, create, credit, debit, genesis, transfer, trust, write};
use crate::register::address::Address;
use crate::register::contract::{Contract, Marker};
use crate::register::state::{RegisterType, State};
use crate::register::stream::Stream;
use crate::storage::{ReadFlags, RegisterStore};
use crate::types::identity::Genesis;
use crate::{debug, error};

/// Register an operation acts on.
enum Target {
    /// No register state is touched.
    Context,
    /// A register that must not exist yet.
    Create {
        address: Address,
        register_type: RegisterType,
    },
    /// An existing register.
    Register(Address),
}

/// Where the pre-state and post-state of a transition go.
///
/// Calculation records them; replay checks them against what was recorded.
pub(crate) trait Trail {
    fn pre_state(&mut self, address: &Address, state: &State) -> Result<(), CalcError>;
    fn post_state(&mut self, address: &Address, state: &State) -> Result<(), CalcError>;
}

/// Appends entries to a verification stream.
struct Recorder<'s>(&'s mut Stream);

impl Trail for Recorder<'_> {
    fn pre_state(&mut self, _: &Address, state: &State) -> Result<(), CalcError> {
        self.0.write(&Marker::PreState).write(state);
        Ok(())
    }

    fn post_state(&mut self, _: &Address, state: &State) -> Result<(), CalcError> {
        self.0.write(&Marker::PostState).write(&state.checksum());
        Ok(())
    }
}

pub struct Calculator<'a> {
    store: &'a dyn RegisterStore,
}

impl<'a> Calculator<'a> {
    pub fn new(store: &'a dyn RegisterStore) -> Self {
        Self { store }
    }

    /// Calculates the verification stream of `contract`.
    ///
    /// On failure the verification stream is left empty and the contract must
    /// be discarded.
    pub fn calculate(&self, contract: &mut Contract) -> Result<(), CalcError> {
        contract.reset();
        let caller = *contract.caller();
        let timestamp = contract.timestamp();
        let (operation, verification) = contract.streams_mut();
        verification.clear();

        let result = self.run(operation, caller, timestamp, &mut Recorder(&mut *verification));
        match result {
            Ok(transitions) => {
                for transition in &transitions {
                    debug!("calculated transition of register {}", transition.address);
                }
                Ok(())
            }
            Err(err) => {
                error!("{}", err);
                verification.clear();
                Err(err)
            }
        }
    }

    /// Decodes the operation in `operations`, computes its transition and
    /// reports both states to `trail`.
    pub(crate) fn run(
        &self,
        operations: &mut Stream,
        caller: Genesis,
        timestamp: u64,
        trail: &mut dyn Trail,
    ) -> Result<Vec<Transition>, CalcError> {
        let operation = read_primary(operations)?;
        let op = operation.opcode();
        let mut transitions = Vec::new();

        match self.target(&operation, &caller)? {
            Target::Context => {}
            Target::Create {
                address,
                register_type,
            } => {
                if self.store.read_state(&address, ReadFlags::PreState)?.is_some() {
                    return Err(CalcError::AlreadyExists(address));
                }
                if !address
                    .category()
                    .is_some_and(|category| category.admits(register_type))
                {
                    return Err(CalcError::AddressMismatch {
                        address,
                        register_type,
                    });
                }

                let mut state = State::new(register_type, caller);
                execute(&operation, &mut state, &caller, timestamp)
                    .map_err(|source| CalcError::Execute { op, source })?;
                trail.post_state(&address, &state)?;
                transitions.push(Transition {
                    address,
                    state,
                    trust_index: None,
                });
            }
            Target::Register(address) => {
                let mut state = self
                    .store
                    .read_state(&address, ReadFlags::PreState)?
                    .ok_or(CalcError::PreStateMissing { op })?;
                if op.requires_owner() && state.owner != caller {
                    return Err(CalcError::NotOwner { op });
                }
                trail.pre_state(&address, &state)?;

                execute(&operation, &mut state, &caller, timestamp)
                    .map_err(|source| CalcError::Execute { op, source })?;
                trail.post_state(&address, &state)?;

                let trust_index = (op == Opcode::Genesis).then_some(state.owner);
                transitions.push(Transition {
                    address,
                    state,
                    trust_index,
                });
            }
        }

        check_trailing(operations)?;
        Ok(transitions)
    }

    fn target(&self, operation: &Operation, caller: &Genesis) -> Result<Target, CalcError> {
        Ok(match operation {
            Operation::Create {
                address,
                register_type,
                ..
            } => Target::Create {
                address: *address,
                register_type: *register_type,
            },
            Operation::Write { address, .. }
            | Operation::Append { address, .. }
            | Operation::Transfer { address, .. }
            | Operation::Claim { address, .. }
            | Operation::Genesis { address, .. } => Target::Register(*address),
            Operation::Debit { from, .. } => Target::Register(*from),
            Operation::Credit { to, .. } => Target::Register(*to),
            Operation::Trust { .. } => Target::Register(
                self.store
                    .read_trust(caller)?
                    .ok_or(CalcError::PreStateMissing { op: Opcode::Trust })?,
            ),
            Operation::Coinbase { .. }
            | Operation::Authorize { .. }
            | Operation::Validate { .. }
            | Operation::Require {}
            | Operation::Condition {} => Target::Context,
        })
    }
}

/// Runs the executor of `operation` on `state`.
pub(crate) fn execute(
    operation: &Operation,
    state: &mut State,
    caller: &Genesis,
    timestamp: u64,
) -> Result<(), ExecError> {
    match operation {
        Operation::Create { data, .. } => create::execute(state, data, timestamp),
        Operation::Write { data, .. } => write::execute(state, data, timestamp),
        Operation::Append { data, .. } => append::execute(state, data, timestamp),
        Operation::Transfer { recipient, .. } => transfer::execute(state, recipient, timestamp),
        Operation::Claim { .. } => claim::execute(state, caller, timestamp),
        Operation::Trust { score, reward, .. } => trust::execute(state, *score, *reward, timestamp),
        Operation::Genesis { reward, .. } => genesis::execute(state, *reward, timestamp),
        Operation::Debit { amount, .. } => debit::execute(state, *amount, timestamp),
        Operation::Credit { amount, .. } => credit::execute(state, *amount, timestamp),
        Operation::Coinbase { .. }
        | Operation::Authorize { .. }
        | Operation::Validate { .. }
        | Operation::Require {}
        | Operation::Condition {} => Ok(()),
    }
}

/// Reads the contract's operation, skipping a leading CONDITION once.
fn read_primary(operations: &mut Stream) -> Result<Operation, CalcError> {
    if operations.peek() == Some(Opcode::Condition.byte()) {
        operations.seek(1)?;
    }
    let operation = Operation::read(operations)?;
    if !operation.opcode().is_primary() {
        return Err(CalcError::InvalidOpcode(operation.opcode().byte()));
    }
    Ok(operation)
}

/// Only REQUIRE or VALIDATE may follow the operation.
fn check_trailing(operations: &mut Stream) -> Result<(), CalcError> {
    if operations.end() {
        return Ok(());
    }
    let opcode = operations.read::<u8>()?;
    if opcode == Opcode::Require.byte() || opcode == Opcode::Validate.byte() {
        Ok(())
    } else {
        Err(CalcError::TrailingOperation)
    }
}
