//! TRUST: records a new trust score on a staked trust register and pays the
//! stake reward into its balance.

use crate::operation::{ExecError, check_timestamp, commit_object, standard_object};
use crate::register::object::Standard;
use crate::register::state::State;

pub fn execute(state: &mut State, score: u64, reward: u64, timestamp: u64) -> Result<(), ExecError> {
    check_timestamp(state, timestamp)?;
    let mut trust = standard_object(state, Standard::Trust, "a trust register")?;
    if trust.get_u64("stake")? == 0 {
        return Err(ExecError::TypeMismatch("a staked trust register"));
    }
    let balance = trust
        .get_u64("balance")?
        .checked_add(reward)
        .ok_or(ExecError::Overflow("balance"))?;

    trust.set_u64("trust", score)?;
    trust.set_u64("balance", balance)?;
    commit_object(state, &trust, timestamp)
}
