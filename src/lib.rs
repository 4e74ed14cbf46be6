//! Register operation state-transition engine.
//!
//! Validates contracts that mutate ledger registers and evaluates the
//! condition scripts that gate them.
//!
//! - [`operation`]: opcodes, executors and the calculator that records and
//!   replays verification trails
//! - [`condition`]: the condition-script VM
//! - [`context`]: the explicit context both run in
//! - [`register`]: addresses, register states, objects, streams and contracts
//! - [`storage`]: the register store abstraction and its in-memory backends

pub mod condition;
pub mod config;
pub mod context;
pub mod operation;
pub mod register;
pub mod storage;
pub mod types;
pub mod utils;
