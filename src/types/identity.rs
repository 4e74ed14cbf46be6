//! Caller identities and transaction references.

use crate::types::hash::write_hex;
use register_derive::BinaryCodec;
use std::fmt;

/// 256-bit genesis identity of a signature chain. Register owners and
/// contract callers are genesis identities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BinaryCodec)]
pub struct Genesis(pub [u8; 32]);

impl Genesis {
    /// Transfer recipient that lets any identity claim the register.
    pub const WILDCARD: Genesis = Genesis([0xFF; 32]);

    pub const fn zero() -> Self {
        Genesis([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Genesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

/// 512-bit transaction hash, referenced by CLAIM, CREDIT, TRUST, AUTHORIZE
/// and VALIDATE.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BinaryCodec)]
pub struct TxId(pub [u8; 64]);

impl TxId {
    pub const fn zero() -> Self {
        TxId([0u8; 64])
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}
