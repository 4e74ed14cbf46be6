//! Typed values shared by condition scripts and object registers.
//!
//! A value is written as its one-byte type tag followed by the payload:
//! fixed-width little-endian integers, or an 8-byte length prefix and the
//! bytes for STRING and BYTES. The tags double as the `TYPES::*` opcodes of
//! the condition script.

use crate::types::encoding::{Decode, DecodeError, Encode, EncodeSink, read_array};
use register_derive::Error;
use std::fmt;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Uint8 = 0x60,
    Uint16 = 0x61,
    Uint32 = 0x62,
    Uint64 = 0x63,
    Uint256 = 0x64,
    Uint512 = 0x65,
    String = 0x66,
    Bytes = 0x67,
}

impl ValueType {
    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0x60 => ValueType::Uint8,
            0x61 => ValueType::Uint16,
            0x62 => ValueType::Uint32,
            0x63 => ValueType::Uint64,
            0x64 => ValueType::Uint256,
            0x65 => ValueType::Uint512,
            0x66 => ValueType::String,
            0x67 => ValueType::Bytes,
            _ => return None,
        })
    }

    /// Encoded width in bytes, `None` for STRING and BYTES.
    pub const fn width(self) -> Option<usize> {
        match self {
            ValueType::Uint8 => Some(1),
            ValueType::Uint16 => Some(2),
            ValueType::Uint32 => Some(4),
            ValueType::Uint64 => Some(8),
            ValueType::Uint256 => Some(32),
            ValueType::Uint512 => Some(64),
            ValueType::String | ValueType::Bytes => None,
        }
    }

    pub const fn bits(self) -> Option<usize> {
        match self.width() {
            Some(width) => Some(width * 8),
            None => None,
        }
    }

    pub const fn is_integer(self) -> bool {
        self.width().is_some()
    }

    /// The integer type of greater width.
    pub fn wider(self, other: ValueType) -> ValueType {
        if other.width() > self.width() { other } else { self }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ValueType::Uint8 => "UINT8_T",
            ValueType::Uint16 => "UINT16_T",
            ValueType::Uint32 => "UINT32_T",
            ValueType::Uint64 => "UINT64_T",
            ValueType::Uint256 => "UINT256_T",
            ValueType::Uint512 => "UINT512_T",
            ValueType::String => "STRING",
            ValueType::Bytes => "BYTES",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("OP::TYPES::{ty} expects {expected} bytes, got {actual}")]
    LengthMismatch {
        ty: ValueType,
        expected: usize,
        actual: usize,
    },
    #[error("OP::TYPES::STRING value is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    /// Little-endian 256-bit integer.
    Uint256([u8; 32]),
    /// Little-endian 512-bit integer.
    Uint512([u8; 64]),
    String(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn ty(&self) -> ValueType {
        match self {
            Value::Uint8(_) => ValueType::Uint8,
            Value::Uint16(_) => ValueType::Uint16,
            Value::Uint32(_) => ValueType::Uint32,
            Value::Uint64(_) => ValueType::Uint64,
            Value::Uint256(_) => ValueType::Uint256,
            Value::Uint512(_) => ValueType::Uint512,
            Value::String(_) => ValueType::String,
            Value::Bytes(_) => ValueType::Bytes,
        }
    }

    /// Payload bytes without tag or length prefix.
    pub fn raw(&self) -> Vec<u8> {
        match self {
            Value::Uint8(v) => vec![*v],
            Value::Uint16(v) => v.to_le_bytes().to_vec(),
            Value::Uint32(v) => v.to_le_bytes().to_vec(),
            Value::Uint64(v) => v.to_le_bytes().to_vec(),
            Value::Uint256(v) => v.to_vec(),
            Value::Uint512(v) => v.to_vec(),
            Value::String(s) => s.as_bytes().to_vec(),
            Value::Bytes(b) => b.clone(),
        }
    }

    /// Length of [`Value::raw`].
    pub fn len(&self) -> usize {
        match self {
            Value::String(s) => s.len(),
            Value::Bytes(b) => b.len(),
            other => other.ty().width().unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuilds a value from its type and payload bytes. Integer payloads
    /// must have exactly the width of the type.
    pub fn from_raw(ty: ValueType, bytes: &[u8]) -> Result<Self, ValueError> {
        if let Some(expected) = ty.width() {
            if bytes.len() != expected {
                return Err(ValueError::LengthMismatch {
                    ty,
                    expected,
                    actual: bytes.len(),
                });
            }
        }
        let mut input = bytes;
        let value = match ty {
            ValueType::String => Value::String(
                String::from_utf8(bytes.to_vec()).map_err(|_| ValueError::InvalidUtf8)?,
            ),
            ValueType::Bytes => Value::Bytes(bytes.to_vec()),
            // Widths were checked above, so decoding the fixed-size payload
            // cannot run out of input.
            _ => Self::decode_fixed(ty, &mut input).map_err(|_| ValueError::LengthMismatch {
                ty,
                expected: ty.width().unwrap_or(0),
                actual: bytes.len(),
            })?,
        };
        Ok(value)
    }

    /// Decodes the payload of a value whose tag has already been read.
    pub fn decode_as(ty: ValueType, input: &mut &[u8]) -> Result<Self, DecodeError> {
        match ty {
            ValueType::String => Ok(Value::String(String::decode(input)?)),
            ValueType::Bytes => Ok(Value::Bytes(Vec::<u8>::decode(input)?)),
            _ => Self::decode_fixed(ty, input),
        }
    }

    fn decode_fixed(ty: ValueType, input: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(match ty {
            ValueType::Uint8 => Value::Uint8(u8::decode(input)?),
            ValueType::Uint16 => Value::Uint16(u16::decode(input)?),
            ValueType::Uint32 => Value::Uint32(u32::decode(input)?),
            ValueType::Uint64 => Value::Uint64(u64::decode(input)?),
            ValueType::Uint256 => Value::Uint256(read_array(input)?),
            ValueType::Uint512 => Value::Uint512(read_array(input)?),
            ValueType::String | ValueType::Bytes => return Err(DecodeError::InvalidValue),
        })
    }

    /// Integer value when it fits in 64 bits.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint8(v) => Some(u64::from(*v)),
            Value::Uint16(v) => Some(u64::from(*v)),
            Value::Uint32(v) => Some(u64::from(*v)),
            Value::Uint64(v) => Some(*v),
            _ => None,
        }
    }
}

impl Encode for Value {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.ty().tag().encode(out);
        match self {
            Value::String(s) => s.encode(out),
            Value::Bytes(b) => b.encode(out),
            fixed => out.write(&fixed.raw()),
        }
    }
}

impl Decode for Value {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let ty = ValueType::from_tag(u8::decode(input)?).ok_or(DecodeError::InvalidValue)?;
        Self::decode_as(ty, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_tag() {
        for tag in 0x60..=0x67u8 {
            let ty = ValueType::from_tag(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
        assert!(ValueType::from_tag(0x68).is_none());
        assert!(ValueType::from_tag(0x01).is_none());
    }

    #[test]
    fn wider_picks_the_larger_integer() {
        assert_eq!(ValueType::Uint64.wider(ValueType::Uint32), ValueType::Uint64);
        assert_eq!(ValueType::Uint32.wider(ValueType::Uint256), ValueType::Uint256);
        assert_eq!(ValueType::Uint8.wider(ValueType::Uint8), ValueType::Uint8);
    }

    #[test]
    fn integer_encoding_is_tag_then_le_bytes() {
        assert_eq!(Value::Uint16(0x0102).to_vec(), vec![0x61, 0x02, 0x01]);
    }

    #[test]
    fn string_encoding_has_length_prefix() {
        let bytes = Value::String("ab".into()).to_vec();
        assert_eq!(bytes[0], 0x66);
        assert_eq!(&bytes[1..9], &2u64.to_le_bytes());
        assert_eq!(&bytes[9..], b"ab");
        assert_eq!(Value::from_bytes(&bytes).unwrap(), Value::String("ab".into()));
    }

    #[test]
    fn truncated_uint256_is_eof() {
        let mut bytes = vec![ValueType::Uint256.tag()];
        bytes.extend_from_slice(&7u64.to_le_bytes());
        assert_eq!(Value::from_bytes(&bytes), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn from_raw_checks_width() {
        let err = Value::from_raw(ValueType::Uint256, &[0u8; 8]).unwrap_err();
        assert_eq!(err.to_string(), "OP::TYPES::UINT256_T expects 32 bytes, got 8");
        assert_eq!(
            Value::from_raw(ValueType::Uint32, &5u32.to_le_bytes()).unwrap(),
            Value::Uint32(5)
        );
    }

    #[test]
    fn raw_and_len_agree() {
        let values = [
            Value::Uint8(1),
            Value::Uint512([3; 64]),
            Value::String("seven".into()),
            Value::Bytes(vec![]),
        ];
        for value in values {
            assert_eq!(value.raw().len(), value.len());
        }
    }
}
