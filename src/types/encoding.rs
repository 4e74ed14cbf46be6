//! Deterministic binary encoding.
//!
//! Everything the engine hashes or writes into a contract goes through these
//! traits, so two nodes always produce the same bytes for the same value.
//!
//! # Binary Format
//!
//! - Integers: little-endian, fixed width
//! - `usize`: encoded as `u64`
//! - `bool`: one byte, 0 or 1
//! - `Vec<T>` / `String`: 8-byte length prefix followed by the elements
//! - `Option<T>`: one tag byte (0 = None, 1 = Some) followed by the value
//! - `[T; N]`: elements back to back, no prefix

use register_derive::Error;

/// Destination for encoded bytes.
///
/// Implemented by buffers and by the SHA3 builder, so a value can be hashed
/// without first being copied into a vector.
pub trait EncodeSink {
    fn write(&mut self, bytes: &[u8]);
}

/// Counts encoded bytes without storing them.
#[derive(Default)]
pub struct SizeCounter {
    len: usize,
}

impl SizeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl EncodeSink for SizeCounter {
    fn write(&mut self, bytes: &[u8]) {
        self.len += bytes.len();
    }
}

impl EncodeSink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

pub trait Encode {
    fn encode<S: EncodeSink>(&self, out: &mut S);

    /// Number of bytes `encode` produces.
    fn encoded_len(&self) -> usize {
        let mut counter = SizeCounter::new();
        self.encode(&mut counter);
        counter.len()
    }

    /// Encodes into a vector allocated with the exact size.
    fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid value")]
    InvalidValue,
    #[error("length prefix too large")]
    LengthOverflow,
}

pub trait Decode: Sized {
    /// Decodes one value and advances `input` past it.
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError>;

    /// Decodes a value that must span all of `data`.
    fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let mut input = data;
        let value = Self::decode(&mut input)?;
        if !input.is_empty() {
            return Err(DecodeError::InvalidValue);
        }
        Ok(value)
    }
}

/// Splits `n` bytes off the front of `input`.
pub fn read_bytes<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8], DecodeError> {
    if input.len() < n {
        return Err(DecodeError::UnexpectedEof);
    }
    let (bytes, rest) = input.split_at(n);
    *input = rest;
    Ok(bytes)
}

/// Same as [`read_bytes`] but returns a fixed-size array.
pub fn read_array<const N: usize>(input: &mut &[u8]) -> Result<[u8; N], DecodeError> {
    let mut array = [0u8; N];
    array.copy_from_slice(read_bytes(input, N)?);
    Ok(array)
}

macro_rules! impl_int {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode<S: EncodeSink>(&self, out: &mut S) {
                    out.write(&self.to_le_bytes());
                }
            }

            impl Decode for $t {
                fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
                    Ok(<$t>::from_le_bytes(read_array(input)?))
                }
            }
        )*
    };
}

impl_int!(u8, u16, u32, u64);

impl Encode for usize {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        (*self as u64).encode(out);
    }
}

impl Decode for usize {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        usize::try_from(u64::decode(input)?).map_err(|_| DecodeError::LengthOverflow)
    }
}

impl Encode for bool {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&[u8::from(*self)]);
    }
}

impl Decode for bool {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::decode(input)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(DecodeError::InvalidValue),
        }
    }
}

/// Upper bound on decoded element counts, far above any register payload.
pub const MAX_DECODE_LEN: usize = 1 << 20;

fn decode_len(input: &mut &[u8]) -> Result<usize, DecodeError> {
    let len = usize::decode(input)?;
    if len > MAX_DECODE_LEN {
        return Err(DecodeError::LengthOverflow);
    }
    Ok(len)
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.as_slice().encode(out);
    }
}

impl<T: Encode> Encode for [T] {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.len().encode(out);
        for item in self {
            item.encode(out);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let len = decode_len(input)?;
        // Every element takes at least one byte, so the remaining input bounds
        // the allocation.
        let mut items = Vec::with_capacity(len.min(input.len()));
        for _ in 0..len {
            items.push(T::decode(input)?);
        }
        Ok(items)
    }
}

impl Encode for str {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.len().encode(out);
        out.write(self.as_bytes());
    }
}

impl Encode for String {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.as_str().encode(out);
    }
}

impl Decode for String {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let len = decode_len(input)?;
        let bytes = read_bytes(input, len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidValue)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        (**self).encode(out);
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        match self {
            None => 0u8.encode(out),
            Some(value) => {
                1u8.encode(out);
                value.encode(out);
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::decode(input)? {
            0 => Ok(None),
            1 => Ok(Some(T::decode(input)?)),
            _ => Err(DecodeError::InvalidValue),
        }
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(self);
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        read_array(input)
    }
}

impl<A: Encode, B: Encode> Encode for (A, B) {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.0.encode(out);
        self.1.encode(out);
    }
}

impl<A: Decode, B: Decode> Decode for (A, B) {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok((A::decode(input)?, B::decode(input)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Integers ==========

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(0x12345678u32.to_vec(), vec![0x78, 0x56, 0x34, 0x12]);
        assert_eq!(0xABCDu16.to_vec(), vec![0xCD, 0xAB]);
        assert_eq!(u64::from_bytes(&7u64.to_vec()).unwrap(), 7);
    }

    #[test]
    fn usize_is_eight_bytes() {
        assert_eq!(42usize.to_vec().len(), 8);
        assert_eq!(usize::from_bytes(&42usize.to_vec()).unwrap(), 42);
    }

    #[test]
    fn truncated_integer_is_eof() {
        assert_eq!(u32::from_bytes(&[1, 2]), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        assert_eq!(u8::from_bytes(&[1, 2]), Err(DecodeError::InvalidValue));
    }

    // ========== Collections ==========

    #[test]
    fn vec_has_length_prefix() {
        let bytes = vec![0xAAu8, 0xBB].to_vec();
        assert_eq!(&bytes[..8], &2u64.to_le_bytes());
        assert_eq!(&bytes[8..], &[0xAA, 0xBB]);
        assert_eq!(Vec::<u8>::from_bytes(&bytes).unwrap(), vec![0xAA, 0xBB]);
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let bytes = ((MAX_DECODE_LEN as u64) + 1).to_vec();
        assert_eq!(Vec::<u8>::from_bytes(&bytes), Err(DecodeError::LengthOverflow));
    }

    #[test]
    fn huge_length_with_short_input_is_eof() {
        let mut bytes = 1000u64.to_vec();
        bytes.push(1);
        assert_eq!(Vec::<u8>::from_bytes(&bytes), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn str_and_string_encode_identically() {
        assert_eq!("register".to_vec(), String::from("register").to_vec());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut bytes = 2u64.to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFE]);
        assert_eq!(String::from_bytes(&bytes), Err(DecodeError::InvalidValue));
    }

    #[test]
    fn byte_arrays_have_no_prefix() {
        assert_eq!([1u8, 2, 3].to_vec(), vec![1, 2, 3]);
        assert_eq!(<[u8; 3]>::from_bytes(&[1, 2, 3]).unwrap(), [1, 2, 3]);
    }

    // ========== Option / bool ==========

    #[test]
    fn option_tags() {
        assert_eq!(None::<u8>.to_vec(), vec![0]);
        assert_eq!(Some(5u8).to_vec(), vec![1, 5]);
        assert_eq!(Option::<u8>::from_bytes(&[2, 0]), Err(DecodeError::InvalidValue));
    }

    #[test]
    fn bool_rejects_other_bytes() {
        assert!(bool::from_bytes(&[1]).unwrap());
        assert_eq!(bool::from_bytes(&[2]), Err(DecodeError::InvalidValue));
    }

    #[test]
    fn pairs_encode_back_to_back() {
        let pairs = vec![(String::from("a"), 7u16)];
        let bytes = Encode::to_vec(&pairs);
        let mut expected = Vec::from(1u64.to_le_bytes());
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.extend_from_slice(b"a");
        expected.extend_from_slice(&[7, 0]);
        assert_eq!(bytes, expected);
        assert_eq!(Vec::<(String, u16)>::from_bytes(&bytes), Ok(pairs));
    }

    #[test]
    fn encoded_len_matches_output() {
        let value = (String::from("balance"), Some(9u64));
        assert_eq!(value.encoded_len(), value.to_vec().len());
    }
}
