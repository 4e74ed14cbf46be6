//! Operations on registers.
//!
//! Each executor module exposes one `execute` function that applies its
//! opcode to a [`State`] in place. Executors are pure: they read nothing but
//! their arguments and perform every check before the first mutation.
//! The [`Calculator`](calculator::Calculator) decodes contracts, fetches
//! pre-states and records the resulting transitions.

pub mod append;
pub mod calculator;
pub mod claim;
pub mod create;
pub mod credit;
pub mod debit;
pub mod errors;
pub mod genesis;
pub mod isa;
pub mod replay;
pub mod transfer;
pub mod trust;
pub mod write;

use crate::register::object::{Object, Standard};
use crate::register::state::{MAX_REGISTER_SIZE, State};

pub use calculator::Calculator;
pub use errors::{CalcError, ExecError};
pub use isa::{Opcode, Operation};
pub use replay::{Transition, commit};

/// Contracts may not move a register back in time.
fn check_timestamp(state: &State, timestamp: u64) -> Result<(), ExecError> {
    if timestamp < state.modified {
        return Err(ExecError::TimestampRegression {
            timestamp,
            modified: state.modified,
        });
    }
    Ok(())
}

fn check_size(len: usize) -> Result<(), ExecError> {
    if len > MAX_REGISTER_SIZE {
        return Err(ExecError::MalformedPayload(format!(
            "{len} bytes exceeds the register limit of {MAX_REGISTER_SIZE}"
        )));
    }
    Ok(())
}

/// Parses the payload of `state` and checks it follows `standard`.
fn standard_object(
    state: &State,
    standard: Standard,
    expected: &'static str,
) -> Result<Object, ExecError> {
    let object = state.object()?;
    if object.standard() != standard {
        return Err(ExecError::TypeMismatch(expected));
    }
    Ok(object)
}

/// Stores `object` as the new payload and stamps the modification time.
fn commit_object(state: &mut State, object: &Object, timestamp: u64) -> Result<(), ExecError> {
    let payload = object.serialize();
    check_size(payload.len())?;
    state.payload = payload;
    state.modified = timestamp;
    Ok(())
}
