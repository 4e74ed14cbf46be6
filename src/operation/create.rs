//! CREATE: fills the payload of a freshly built register.

use crate::operation::{ExecError, check_size, check_timestamp};
use crate::register::object::Object;
use crate::register::state::{RegisterType, State};

/// Validates `data` against the register type and installs it. The
/// calculator guarantees the register did not exist before.
pub fn execute(state: &mut State, data: &[u8], timestamp: u64) -> Result<(), ExecError> {
    check_timestamp(state, timestamp)?;
    check_size(data.len())?;
    if state.register_type == RegisterType::Object {
        Object::parse(data).map_err(|err| ExecError::MalformedPayload(err.to_string()))?;
    }

    state.payload = data.to_vec();
    state.modified = timestamp;
    Ok(())
}
