use crate::condition::isa::Op;
use crate::condition::scratch::ScratchError;
use crate::register::address::Address;
use crate::register::object::ObjectError;
use crate::register::stream::StreamError;
use crate::storage::StoreError;
use crate::types::value::{ValueError, ValueType};
use register_derive::Error;
use std::fmt;

/// Arithmetic faults. Reported as [`Warning`]s by verification and fatal
/// under execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Overflow, underflow or exponent overflow in the result width.
    Overflow,
    DivideByZero,
}

/// An arithmetic fault and where it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Warning {
    pub op: Op,
    pub fault: Fault,
    /// Width the operation was computed in.
    pub bits: usize,
    /// Script offset of the faulting opcode.
    pub offset: usize,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fault {
            Fault::Overflow => write!(f, "{} {}-bit value overflow", self.op, self.bits),
            Fault::DivideByZero => write!(f, "{} cannot divide by zero", self.op),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("invalid condition opcode {0:#04x}")]
    InvalidOpcode(u8),
    #[error("Malformed conditions")]
    Malformed,
    #[error("Malformed condition. Cannot evaluate {op} with previous {previous}")]
    MixedLogic { op: Op, previous: Op },
    #[error("Malformed condition. Evaluate groups count incomplete")]
    GroupsIncomplete,
    #[error("Malformed condition. Groups nested deeper than {0}")]
    GroupDepth(usize),
    #[error("Missing register value")]
    MissingRegisterValue,
    #[error("OP::TYPES::STRING string is empty")]
    EmptyString,
    #[error("OP::TYPES::BYTES vector is empty")]
    EmptyBytes,
    #[error("OP::CALLER::OPERATIONS caller has empty operations")]
    CallerEmpty,
    #[error("{op} offset is not within size")]
    OffsetOutOfRange { op: Op },
    #[error("{op} cannot operate on OP::TYPES::{actual}")]
    TypeMismatch { op: Op, actual: ValueType },
    #[error("{op} expects a 32-byte register address, got {len} bytes")]
    AddressWidth { op: Op, len: usize },
    #[error("{op} register {address} doesn't exist")]
    RegisterNotFound { op: Op, address: Address },
    #[error("OP::REGISTER::VALUE register {0} is not an object")]
    NotAnObject(Address),
    #[error("OP::REGISTER::VALUE field {0} doesn't exist")]
    FieldNotFound(String),
    #[error("{0}")]
    Arithmetic(Warning),
    #[error("{0}")]
    Stream(#[from] StreamError),
    #[error("{0}")]
    Scratch(#[from] ScratchError),
    #[error("{0}")]
    Value(#[from] ValueError),
    #[error("{0}")]
    Object(#[from] ObjectError),
    #[error("register store: {0}")]
    Store(#[from] StoreError),
}
