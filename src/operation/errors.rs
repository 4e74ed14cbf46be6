use crate::operation::isa::Opcode;
use crate::register::address::Address;
use crate::register::object::ObjectError;
use crate::register::state::RegisterType;
use crate::register::stream::StreamError;
use crate::storage::StoreError;
use register_derive::Error;

/// Failures of a single executor. All checks run before the state is touched,
/// so an error leaves the state as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("claimant is not the transfer recipient")]
    OwnerMismatch,
    #[error("register is not {0}")]
    TypeMismatch(&'static str),
    #[error("balance {balance} cannot cover {amount}")]
    BalanceInsufficient { balance: u64, amount: u64 },
    #[error("{0} overflow")]
    Overflow(&'static str),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("timestamp {timestamp} is older than last modification {modified}")]
    TimestampRegression { timestamp: u64, modified: u64 },
    #[error("register has no pending transfer")]
    NoPendingTransfer,
    #[error("register already has a pending transfer")]
    PendingTransfer,
    #[error("{0}")]
    Object(#[from] ObjectError),
}

/// Failures of the calculator and of replay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("invalid code for register verification: {0:#04x}")]
    InvalidOpcode(u8),
    #[error("{op}: register pre-state doesn't exist")]
    PreStateMissing { op: Opcode },
    #[error("{op}: cannot generate pre-state if not owner")]
    NotOwner { op: Opcode },
    #[error("{op}: cannot generate post-state: {source}")]
    Execute { op: Opcode, source: ExecError },
    #[error("OP::CREATE: register {0} already exists")]
    AlreadyExists(Address),
    #[error("OP::CREATE: address {address} cannot hold a {register_type} register")]
    AddressMismatch {
        address: Address,
        register_type: RegisterType,
    },
    #[error("contract cannot contain second OP beyond REQUIRE or VALIDATE")]
    TrailingOperation,
    #[error("pre-state mismatch for register {0}")]
    PreStateMismatch(Address),
    #[error("post-state checksum mismatch for register {0}")]
    ChecksumMismatch(Address),
    #[error("malformed verification stream: {0}")]
    Verification(&'static str),
    #[error("{0}")]
    Stream(#[from] StreamError),
    #[error("register store: {0}")]
    Store(#[from] StoreError),
}
