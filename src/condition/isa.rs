//! Condition opcode set.
//!
//! [`for_each_condition_op!`](crate::for_each_condition_op) lists every
//! condition opcode with its mnemonic, its class and its inline operands.
//! `TYPES::*` literals are not part of the list: their tag bytes are the
//! [`ValueType`] tags and are read as values.
//!
//! # Script Format
//!
//! A script is a sequence of tokens, each an opcode or type tag byte followed
//! by its operand bytes:
//! - U16: 2 bytes little-endian
//! - Field: 8-byte length prefix followed by UTF-8 bytes

use crate::condition::errors::ConditionError;
use crate::register::stream::Cursor;
use crate::types::value::{Value, ValueType};
use std::fmt;

/// Invokes a callback macro with the complete condition opcode list.
#[macro_export]
macro_rules! for_each_condition_op {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Comparison
            // =========================
            Equals = 0x20, "EQUALS", Compare => [],
            LessThan = 0x21, "LESSTHAN", Compare => [],
            GreaterThan = 0x22, "GREATERTHAN", Compare => [],
            NotEquals = 0x23, "NOTEQUALS", Compare => [],
            /// Left operand holds the right operand's bytes contiguously.
            Contains = 0x24, "CONTAINS", Compare => [],
            // =========================
            // Logic and grouping
            // =========================
            And = 0x28, "AND", Logic => [],
            Or = 0x29, "OR", Logic => [],
            Group = 0x2A, "GROUP", Group => [],
            Ungroup = 0x2B, "UNGROUP", Group => [],
            // =========================
            // Arithmetic
            // =========================
            Add = 0x30, "ADD", Binary => [],
            Sub = 0x31, "SUB", Binary => [],
            Inc = 0x32, "INC", Unary => [],
            Dec = 0x33, "DEC", Unary => [],
            Div = 0x34, "DIV", Binary => [],
            Mul = 0x35, "MUL", Binary => [],
            Mod = 0x36, "MOD", Binary => [],
            Exp = 0x37, "EXP", Binary => [],
            // =========================
            // Byte data
            // =========================
            Cat = 0x38, "CAT", Binary => [],
            /// SUBDATA offset, length ; slice of the running value
            SubData = 0x39, "SUBDATA", Slice => [offset: U16, length: U16],
            // =========================
            // Register reads
            // =========================
            Modified = 0x40, "REGISTER::MODIFIED", Register => [],
            Owner = 0x41, "REGISTER::OWNER", Register => [],
            RegisterType = 0x42, "REGISTER::TYPE", Register => [],
            State = 0x43, "REGISTER::STATE", Register => [],
            /// REGISTER::VALUE field ; named field of an object register
            FieldValue = 0x44, "REGISTER::VALUE", Register => [field: Field],
            // =========================
            // Caller and ledger
            // =========================
            CallerGenesis = 0x48, "CALLER::GENESIS", Caller => [],
            CallerTimestamp = 0x49, "CALLER::TIMESTAMP", Caller => [],
            CallerOperations = 0x4A, "CALLER::OPERATIONS", Caller => [],
            LedgerHeight = 0x50, "LEDGER::HEIGHT", Ledger => [],
            LedgerTimestamp = 0x51, "LEDGER::TIMESTAMP", Ledger => [],
            LedgerSupply = 0x52, "LEDGER::SUPPLY", Ledger => [],
            // =========================
            // Hashing
            // =========================
            Sk256 = 0x58, "CRYPTO::SK256", Crypto => [],
            Sk512 = 0x59, "CRYPTO::SK512", Crypto => [],
        }
    };
}

#[macro_export]
macro_rules! define_condition_ops {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal, $class:ident => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Op {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u8> for Op {
            type Error = ConditionError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Op::$name), )*
                    _ => Err(ConditionError::InvalidOpcode(value)),
                }
            }
        }

        impl Op {
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Op::$name => $mnemonic, )*
                }
            }

            pub const fn class(&self) -> OpClass {
                match self {
                    $( Op::$name => OpClass::$class, )*
                }
            }

            pub const fn byte(self) -> u8 {
                self as u8
            }
        }

        /// One decoded script token.
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub enum Token {
            /// `TYPES::*` literal.
            Literal(Value),
            $(
                $name { $( $field: $crate::define_condition_ops!(@ty $kind), )* },
            )*
        }

        impl Token {
            /// Reads the inline operands of `op`, whose byte was already consumed.
            pub(crate) fn read_operands(op: Op, cursor: &mut Cursor<'_>) -> Result<Self, ConditionError> {
                Ok(match op {
                    $(
                        Op::$name => Token::$name {
                            $( $field: cursor.read()?, )*
                        },
                    )*
                })
            }

            /// The opcode of this token, `None` for literals.
            pub fn op(&self) -> Option<Op> {
                match self {
                    Token::Literal(_) => None,
                    $( Token::$name { .. } => Some(Op::$name), )*
                }
            }
        }
    };

    // ---------- types ----------
    (@ty U16)   => { u16 };
    (@ty Field) => { String };
}

for_each_condition_op!(define_condition_ops);

/// How an opcode takes part in the grammar.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OpClass {
    /// Ends the left chain of an expression.
    Compare,
    /// Joins two terms of one scope.
    Logic,
    /// Opens or closes a nested scope.
    Group,
    /// Combines the running value with the next primary.
    Binary,
    /// Transforms the running value in place.
    Unary,
    /// Takes a window of the running value.
    Slice,
    /// Reads a register addressed by the running value.
    Register,
    /// Starts a chain with a value taken from the calling contract.
    Caller,
    /// Starts a chain with a value taken from the ledger snapshot.
    Ledger,
    /// Hashes the running value.
    Crypto,
}

impl OpClass {
    /// Whether opcodes of this class extend a chain that already has a value.
    pub const fn is_postfix(self) -> bool {
        matches!(
            self,
            OpClass::Binary | OpClass::Unary | OpClass::Slice | OpClass::Register | OpClass::Crypto
        )
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OP::{}", self.mnemonic())
    }
}

impl Token {
    /// Reads the next token. STRING and BYTES literals may not be empty.
    pub fn read(cursor: &mut Cursor<'_>) -> Result<Self, ConditionError> {
        let byte: u8 = cursor.read()?;
        if let Some(ty) = ValueType::from_tag(byte) {
            let value = cursor.read_with(|input| Value::decode_as(ty, input))?;
            return match value {
                Value::String(s) if s.is_empty() => Err(ConditionError::EmptyString),
                Value::Bytes(b) if b.is_empty() => Err(ConditionError::EmptyBytes),
                value => Ok(Token::Literal(value)),
            };
        }
        let op = Op::try_from(byte)?;
        Token::read_operands(op, cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::stream::StreamError;
    use crate::types::encoding::Encode;

    #[test]
    fn opcode_bytes_and_names() {
        assert_eq!(Op::try_from(0x2A), Ok(Op::Group));
        assert_eq!(Op::CallerOperations.byte(), 0x4A);
        assert_eq!(Op::FieldValue.to_string(), "OP::REGISTER::VALUE");
        assert_eq!(Op::Sub.to_string(), "OP::SUB");
        assert_eq!(Op::try_from(0x60), Err(ConditionError::InvalidOpcode(0x60)));
    }

    #[test]
    fn classes_drive_the_grammar() {
        assert_eq!(Op::Contains.class(), OpClass::Compare);
        assert!(Op::Cat.class().is_postfix());
        assert!(Op::Sk512.class().is_postfix());
        assert!(!Op::LedgerHeight.class().is_postfix());
        assert!(!Op::Or.class().is_postfix());
    }

    #[test]
    fn reads_literals_and_operands() {
        let mut script = Value::Uint32(7).to_vec();
        script.push(Op::SubData.byte());
        script.extend_from_slice(&1u16.to_le_bytes());
        script.extend_from_slice(&32u16.to_le_bytes());
        script.push(Op::FieldValue.byte());
        "balance".encode(&mut script);

        let mut cursor = Cursor::new(&script);
        assert_eq!(Token::read(&mut cursor), Ok(Token::Literal(Value::Uint32(7))));
        assert_eq!(
            Token::read(&mut cursor),
            Ok(Token::SubData {
                offset: 1,
                length: 32
            })
        );
        let field = Token::read(&mut cursor).unwrap();
        assert_eq!(field.op(), Some(Op::FieldValue));
        assert!(cursor.end());
    }

    #[test]
    fn empty_literals_are_rejected() {
        let string = Value::String(String::new()).to_vec();
        assert_eq!(
            Token::read(&mut Cursor::new(&string)),
            Err(ConditionError::EmptyString)
        );
        let bytes = Value::Bytes(Vec::new()).to_vec();
        assert_eq!(
            Token::read(&mut Cursor::new(&bytes)),
            Err(ConditionError::EmptyBytes)
        );
    }

    #[test]
    fn truncated_literal_is_end_of_stream() {
        let mut script = vec![ValueType::Uint256.tag()];
        script.extend_from_slice(&555u64.to_le_bytes());
        assert_eq!(
            Token::read(&mut Cursor::new(&script)),
            Err(ConditionError::Stream(StreamError::EndOfStream))
        );
    }
}
