//! CREDIT: deposits an amount into an account balance.

use crate::operation::{ExecError, check_timestamp, commit_object, standard_object};
use crate::register::object::Standard;
use crate::register::state::State;

pub fn execute(state: &mut State, amount: u64, timestamp: u64) -> Result<(), ExecError> {
    check_timestamp(state, timestamp)?;
    let mut account = standard_object(state, Standard::Account, "an account")?;
    let balance = account
        .get_u64("balance")?
        .checked_add(amount)
        .ok_or(ExecError::Overflow("balance"))?;

    account.set_u64("balance", balance)?;
    commit_object(state, &account, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::utils::{account_state, field_u64, unique_genesis};

    #[test]
    fn credit_increases_balance() {
        let mut state = account_state(unique_genesis(), 5);
        execute(&mut state, 95, 8).unwrap();
        assert_eq!(field_u64(&state, "balance"), 100);
        assert_eq!(state.modified, 8);
    }

    #[test]
    fn credit_overflow_fails() {
        let mut state = account_state(unique_genesis(), u64::MAX - 1);
        execute(&mut state, 1, 1).unwrap();
        assert_eq!(execute(&mut state, 1, 2), Err(ExecError::Overflow("balance")));
        assert_eq!(field_u64(&state, "balance"), u64::MAX);
        assert_eq!(state.modified, 1);
    }

    #[test]
    fn credit_rejects_older_timestamp() {
        let mut state = account_state(unique_genesis(), 0);
        execute(&mut state, 1, 10).unwrap();
        assert!(matches!(
            execute(&mut state, 1, 9),
            Err(ExecError::TimestampRegression { .. })
        ));
    }
}
