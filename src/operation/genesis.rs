//! GENESIS: first stake of a trust register. The balance becomes the stake
//! and the reward starts the new balance.

use crate::operation::{ExecError, check_timestamp, commit_object, standard_object};
use crate::register::object::Standard;
use crate::register::state::State;

pub fn execute(state: &mut State, reward: u64, timestamp: u64) -> Result<(), ExecError> {
    check_timestamp(state, timestamp)?;
    let mut trust = standard_object(state, Standard::Trust, "a trust register")?;
    if trust.get_u64("trust")? != 0 || trust.get_u64("stake")? != 0 {
        return Err(ExecError::TypeMismatch("an unstaked trust register"));
    }
    let balance = trust.get_u64("balance")?;

    trust.set_u64("stake", balance)?;
    trust.set_u64("balance", reward)?;
    trust.set_u64("trust", 0)?;
    commit_object(state, &trust, timestamp)
}
