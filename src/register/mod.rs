//! Register model: addresses, versioned state, object payloads and the
//! contract streams that record state transitions.

pub mod address;
pub mod contract;
pub mod object;
pub mod state;
pub mod stream;
