//! APPEND: extends RAW and APPEND payloads.

use crate::operation::{ExecError, check_size, check_timestamp};
use crate::register::state::{RegisterType, State};

pub fn execute(state: &mut State, data: &[u8], timestamp: u64) -> Result<(), ExecError> {
    check_timestamp(state, timestamp)?;
    if !matches!(state.register_type, RegisterType::Raw | RegisterType::Append) {
        return Err(ExecError::TypeMismatch("appendable"));
    }
    check_size(state.payload.len() + data.len())?;

    state.payload.extend_from_slice(data);
    state.modified = timestamp;
    Ok(())
}
