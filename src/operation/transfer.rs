//! TRANSFER: marks a register for hand-over to a recipient. Ownership only
//! changes once the recipient claims it.

use crate::operation::{ExecError, check_timestamp};
use crate::register::object::Standard;
use crate::register::state::{RegisterType, State};
use crate::types::identity::Genesis;

pub fn execute(state: &mut State, recipient: &Genesis, timestamp: u64) -> Result<(), ExecError> {
    check_timestamp(state, timestamp)?;
    if recipient.is_zero() {
        return Err(ExecError::MalformedPayload(
            "transfer recipient cannot be zero".to_string(),
        ));
    }
    if state.transfer.is_some() {
        return Err(ExecError::PendingTransfer);
    }
    if state.register_type == RegisterType::Object && state.object()?.standard() == Standard::Trust {
        return Err(ExecError::TypeMismatch("transferable"));
    }

    state.transfer = Some(*recipient);
    state.modified = timestamp;
    Ok(())
}
