//! DEBIT: takes an amount out of an account balance.

use crate::operation::{ExecError, check_timestamp, commit_object, standard_object};
use crate::register::object::Standard;
use crate::register::state::State;

pub fn execute(state: &mut State, amount: u64, timestamp: u64) -> Result<(), ExecError> {
    check_timestamp(state, timestamp)?;
    let mut account = standard_object(state, Standard::Account, "an account")?;
    let balance = account.get_u64("balance")?;
    if balance < amount {
        return Err(ExecError::BalanceInsufficient { balance, amount });
    }

    account.set_u64("balance", balance - amount)?;
    commit_object(state, &account, timestamp)
}
