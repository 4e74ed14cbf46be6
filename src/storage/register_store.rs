//! Register store abstraction.
//!
//! Defines the [`RegisterStore`] trait the calculator, the condition
//! evaluator and the commit step use to reach register state.

use crate::register::address::Address;
use crate::register::state::State;
use crate::types::identity::Genesis;
use register_derive::Error;

/// Errors that can occur while interacting with a register store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Stored bytes no longer parse as a register state.
    #[error("register {address} holds undecodable state")]
    Corrupt { address: Address },
    /// Failure reported by the backing store.
    #[error("{0}")]
    Backend(String),
}

/// Which view of a register to read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadFlags {
    /// Latest committed state.
    #[default]
    Default,
    /// State as of immediately before the contract being calculated.
    PreState,
    /// Latest state including pending mempool writes.
    Mempool,
}

/// Storage backend for register state.
///
/// Implementations must be thread-safe (`Send + Sync`) so contracts can be
/// validated concurrently against the same store.
pub trait RegisterStore: Send + Sync {
    /// Returns the state at `address` in the view `flags` selects.
    fn read_state(&self, address: &Address, flags: ReadFlags) -> Result<Option<State>, StoreError>;

    /// Stores `state` as the committed image of `address`.
    fn write_state(&self, address: &Address, state: &State) -> Result<(), StoreError>;

    /// Returns the trust register indexed for `genesis`.
    fn read_trust(&self, genesis: &Genesis) -> Result<Option<Address>, StoreError>;

    /// Records `address` as the trust register of `genesis`.
    fn index_trust(&self, genesis: &Genesis, address: &Address) -> Result<(), StoreError>;
}
