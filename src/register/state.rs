//! Versioned register state.

use crate::register::object::{Object, ObjectError};
use crate::types::encoding::{Decode, DecodeError, Encode};
use crate::types::hash::Hash;
use crate::types::identity::Genesis;
use register_derive::BinaryCodec;
use std::fmt;

/// Largest payload a register may hold, in bytes.
pub const MAX_REGISTER_SIZE: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, BinaryCodec)]
pub enum RegisterType {
    /// Payload fixed at creation.
    Readonly = 0x01,
    /// Payload only grows through APPEND.
    Append = 0x02,
    /// Payload replaced by WRITE or extended by APPEND.
    Raw = 0x03,
    /// Structured [`Object`] payload.
    Object = 0x04,
}

impl TryFrom<u8> for RegisterType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        RegisterType::from_bytes(&[value])
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegisterType::Readonly => "READONLY",
            RegisterType::Append => "APPEND",
            RegisterType::Raw => "RAW",
            RegisterType::Object => "OBJECT",
        })
    }
}

/// Register record as kept by the store and recorded in contracts.
#[derive(Clone, Debug, PartialEq, Eq, BinaryCodec)]
pub struct State {
    pub version: u16,
    pub register_type: RegisterType,
    pub owner: Genesis,
    /// Timestamp of the last contract that changed this register.
    pub modified: u64,
    /// Recipient of a pending TRANSFER, confirmed by CLAIM.
    pub transfer: Option<Genesis>,
    pub payload: Vec<u8>,
}

impl State {
    pub const VERSION: u16 = 1;

    pub fn new(register_type: RegisterType, owner: Genesis) -> Self {
        Self {
            version: Self::VERSION,
            register_type,
            owner,
            modified: 0,
            transfer: None,
            payload: Vec::new(),
        }
    }

    /// Digest committed to the verification stream after a transition.
    pub fn checksum(&self) -> Hash {
        let mut h = Hash::sha3();
        h.update(b"REGISTER");
        self.encode(&mut h);
        h.finalize()
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.to_vec()
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes(bytes)
    }

    /// Parses the payload of an OBJECT register.
    pub fn object(&self) -> Result<Object, ObjectError> {
        if self.register_type != RegisterType::Object {
            return Err(ObjectError::NotAnObject(self.register_type));
        }
        Object::parse(&self.payload)
    }
}
