//! Operation set.
//!
//! The [`for_each_operation!`](crate::for_each_operation) macro holds the
//! canonical operation definitions and hands them to a callback macro, so the
//! opcode enum, the typed [`Operation`] enum and its codec come from one list.
//!
//! # Stream Format
//!
//! An operation is its opcode byte followed by its operands in declaration
//! order:
//! - Address / Genesis: 32 bytes
//! - TxId: 64 bytes
//! - Type: 1 byte register type
//! - U32 / U64: little-endian
//! - Data: 8-byte length prefix followed by the bytes

use crate::operation::errors::CalcError;
use crate::register::address::Address;
use crate::register::state::RegisterType;
use crate::register::stream::Stream;
use crate::types::encoding::{Decode, DecodeError, Encode, EncodeSink};
use crate::types::identity::{Genesis, TxId};
use std::fmt;

/// Invokes a callback macro with the complete operation definition list.
#[macro_export]
macro_rules! for_each_operation {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Register mutation
            // =========================
            /// WRITE address, data ; replace a RAW payload or update OBJECT fields
            Write = 0x01, "WRITE" => [address: Address, data: Data],
            /// CREATE address, type, data ; create a register owned by the caller
            Create = 0x02, "CREATE" => [address: Address, register_type: Type, data: Data],
            /// APPEND address, data ; extend a RAW or APPEND payload
            Append = 0x03, "APPEND" => [address: Address, data: Data],
            /// TRANSFER address, recipient ; mark the register for transfer
            Transfer = 0x04, "TRANSFER" => [address: Address, recipient: Genesis],
            /// CLAIM txid, contract, address ; take ownership of a transferred register
            Claim = 0x05, "CLAIM" => [txid: TxId, contract: U32, address: Address],
            // =========================
            // Financial
            // =========================
            /// COINBASE genesis, amount ; mint to a genesis, nothing recorded
            Coinbase = 0x06, "COINBASE" => [genesis: Genesis, amount: U64],
            /// TRUST last, score, reward ; update the caller's trust register
            Trust = 0x07, "TRUST" => [last: TxId, score: U64, reward: U64],
            /// GENESIS address, reward ; stake a trust register for the first time
            Genesis = 0x08, "GENESIS" => [address: Address, reward: U64],
            /// DEBIT from, to, amount, reference ; take from an account
            Debit = 0x09, "DEBIT" => [from: Address, to: Address, amount: U64, reference: U64],
            /// CREDIT txid, contract, to, proof, amount ; deposit into an account
            Credit = 0x0A, "CREDIT" => [txid: TxId, contract: U32, to: Address, proof: Address, amount: U64],
            // =========================
            // Context
            // =========================
            /// AUTHORIZE txid, genesis ; authorize a transaction, nothing recorded
            Authorize = 0x0B, "AUTHORIZE" => [txid: TxId, genesis: Genesis],
            /// VALIDATE txid, contract ; satisfy the condition of another contract
            Validate = 0x0C, "VALIDATE" => [txid: TxId, contract: U32],
            /// REQUIRE ; the condition script gates this contract
            Require = 0x0D, "REQUIRE" => [],
            /// CONDITION ; prefix marking a conditional contract
            Condition = 0x0E, "CONDITION" => [],
        }
    };
}

#[macro_export]
macro_rules! define_operations {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        // =========================
        // Opcode enum
        // =========================
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u8> for Opcode {
            type Error = CalcError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Opcode::$name), )*
                    _ => Err(CalcError::InvalidOpcode(value)),
                }
            }
        }

        impl Opcode {
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            pub const fn byte(self) -> u8 {
                self as u8
            }
        }

        // =========================
        // Typed operations
        // =========================
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub enum Operation {
            $(
                $(#[$doc])*
                $name { $( $field: $crate::define_operations!(@ty $kind), )* },
            )*
        }

        impl Operation {
            pub fn opcode(&self) -> Opcode {
                match self {
                    $( Operation::$name { .. } => Opcode::$name, )*
                }
            }

            /// Decodes the operands of an operation whose opcode was already read.
            pub fn decode_operands(opcode: Opcode, input: &mut &[u8]) -> Result<Self, DecodeError> {
                Ok(match opcode {
                    $(
                        Opcode::$name => Operation::$name {
                            $( $field: Decode::decode(input)?, )*
                        },
                    )*
                })
            }
        }

        impl Encode for Operation {
            fn encode<S: EncodeSink>(&self, out: &mut S) {
                self.opcode().byte().encode(out);
                match self {
                    $(
                        Operation::$name { $( $field, )* } => {
                            $( $field.encode(out); )*
                        }
                    )*
                }
            }
        }
    };

    // ---------- types ----------
    (@ty Address) => { Address };
    (@ty Genesis) => { Genesis };
    (@ty TxId)    => { TxId };
    (@ty Type)    => { RegisterType };
    (@ty U32)     => { u32 };
    (@ty U64)     => { u64 };
    (@ty Data)    => { Vec<u8> };
}

for_each_operation!(define_operations);

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OP::{}", self.mnemonic())
    }
}

impl Opcode {
    /// Whether the calculator may dispatch this opcode as the contract's
    /// operation.
    pub const fn is_primary(self) -> bool {
        !matches!(self, Opcode::Require | Opcode::Condition)
    }

    /// Whether the pre-state owner must be the caller.
    pub const fn requires_owner(self) -> bool {
        matches!(
            self,
            Opcode::Write
                | Opcode::Append
                | Opcode::Transfer
                | Opcode::Trust
                | Opcode::Genesis
                | Opcode::Debit
                | Opcode::Credit
        )
    }
}

impl Operation {
    /// Reads one operation from the stream.
    pub fn read(stream: &mut Stream) -> Result<Self, CalcError> {
        let opcode = Opcode::try_from(stream.read::<u8>()?)?;
        Ok(stream.read_with(|input| Operation::decode_operands(opcode, input))?)
    }
}

impl Decode for Operation {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let opcode = Opcode::try_from(u8::decode(input)?).map_err(|_| DecodeError::InvalidValue)?;
        Operation::decode_operands(opcode, input)
    }
}
