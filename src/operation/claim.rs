//! CLAIM: completes a pending transfer. The claimant does not own the
//! register yet, so no owner check applies.

use crate::operation::{ExecError, check_timestamp};
use crate::register::state::State;
use crate::types::identity::Genesis;

pub fn execute(state: &mut State, claimant: &Genesis, timestamp: u64) -> Result<(), ExecError> {
    check_timestamp(state, timestamp)?;
    match state.transfer {
        None => Err(ExecError::NoPendingTransfer),
        Some(recipient) if recipient == *claimant || recipient == Genesis::WILDCARD => {
            state.owner = *claimant;
            state.transfer = None;
            state.modified = timestamp;
            Ok(())
        }
        Some(_) => Err(ExecError::OwnerMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::state::RegisterType;
    use crate::utils::test_utils::utils::{raw_state, unique_genesis};

    fn pending(recipient: Genesis) -> State {
        let mut state = raw_state(unique_genesis(), RegisterType::Raw, b"asset");
        state.transfer = Some(recipient);
        state.modified = 5;
        state
    }

    #[test]
    fn claim_moves_ownership_to_recipient() {
        let recipient = unique_genesis();
        let mut state = pending(recipient);
        execute(&mut state, &recipient, 6).unwrap();
        assert_eq!(state.owner, recipient);
        assert!(state.transfer.is_none());
        assert_eq!(state.modified, 6);
    }

    #[test]
    fn claim_by_other_identity_fails() {
        let mut state = pending(unique_genesis());
        let before = state.clone();
        assert_eq!(
            execute(&mut state, &unique_genesis(), 6),
            Err(ExecError::OwnerMismatch)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn wildcard_transfer_is_claimable_by_anyone() {
        let claimant = unique_genesis();
        let mut state = pending(Genesis::WILDCARD);
        execute(&mut state, &claimant, 6).unwrap();
        assert_eq!(state.owner, claimant);
    }

    #[test]
    fn claim_without_transfer_fails() {
        let mut state = raw_state(unique_genesis(), RegisterType::Raw, b"");
        assert_eq!(
            execute(&mut state, &unique_genesis(), 1),
            Err(ExecError::NoPendingTransfer)
        );
    }
}
