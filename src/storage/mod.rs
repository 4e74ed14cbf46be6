//! Register storage.
//!
//! The engine only talks to storage through [`RegisterStore`]:
//!
//! - [`register_store`]: the store trait, read flags and errors
//! - [`memory`]: [`MemoryStore`], a concurrent in-memory store with a mempool view
//! - [`overlay`]: [`OverlayStore`], buffered writes over a shared base store

pub mod memory;
pub mod overlay;
pub mod register_store;

pub use memory::MemoryStore;
pub use overlay::{OverlayStore, OverlayWrites};
pub use register_store::{ReadFlags, RegisterStore, StoreError};
