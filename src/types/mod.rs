//! Primitive types shared by every layer of the engine.
//!
//! - `encoding`: deterministic binary codec used for streams and checksums
//! - `hash`: SHA3-256 / SHA3-512 digests
//! - `identity`: genesis identities and transaction references
//! - `value`: typed values of condition scripts and object fields

pub mod encoding;
pub mod hash;
pub mod identity;
pub mod value;
