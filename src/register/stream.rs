//! Byte streams carried by contracts.
//!
//! A [`Stream`] owns its bytes and keeps a read position; writes always append
//! at the end. A [`Cursor`] reads a borrowed slice the same way. Reads go
//! through [`Decode`], so a truncated operand surfaces as
//! [`StreamError::EndOfStream`] instead of a partial value.

use crate::types::encoding::{Decode, DecodeError, Encode, read_bytes};
use register_derive::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("end of stream")]
    EndOfStream,
    #[error("invalid value in stream")]
    InvalidValue,
    #[error("length prefix too large")]
    LengthOverflow,
    #[error("offset {offset} is not within size {size}")]
    OffsetOutOfRange { offset: usize, size: usize },
}

impl From<DecodeError> for StreamError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnexpectedEof => StreamError::EndOfStream,
            DecodeError::InvalidValue => StreamError::InvalidValue,
            DecodeError::LengthOverflow => StreamError::LengthOverflow,
        }
    }
}

/// Bytes of `bytes` from `offset` to the end. `offset` must fall inside.
pub fn tail(bytes: &[u8], offset: usize) -> Result<&[u8], StreamError> {
    if offset >= bytes.len() {
        return Err(StreamError::OffsetOutOfRange {
            offset,
            size: bytes.len(),
        });
    }
    Ok(&bytes[offset..])
}

/// `len` bytes of `bytes` starting at `offset`.
pub fn window(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], StreamError> {
    match offset.checked_add(len) {
        Some(end) if end <= bytes.len() => Ok(&bytes[offset..end]),
        _ => Err(StreamError::OffsetOutOfRange {
            offset,
            size: bytes.len(),
        }),
    }
}

/// Read position over a borrowed slice.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn end(&self) -> bool {
        self.position >= self.bytes.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.position.min(self.bytes.len())..]
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    pub fn read<T: Decode>(&mut self) -> Result<T, StreamError> {
        self.read_with(T::decode)
    }

    /// Runs `decode` on the unread bytes and advances past what it consumed.
    pub fn read_with<T>(
        &mut self,
        decode: impl FnOnce(&mut &'a [u8]) -> Result<T, DecodeError>,
    ) -> Result<T, StreamError> {
        let mut input = self.remaining();
        let before = input.len();
        let value = decode(&mut input)?;
        self.position += before - input.len();
        Ok(value)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], StreamError> {
        self.read_with(|input| read_bytes(input, n))
    }

    pub fn seek(&mut self, n: usize) -> Result<(), StreamError> {
        self.read_bytes(n).map(|_| ())
    }
}

/// Owned byte stream with a read position and an append-only write end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stream {
    bytes: Vec<u8>,
    position: usize,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// True once every byte has been read.
    pub fn end(&self) -> bool {
        self.position >= self.bytes.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor {
            bytes: &self.bytes,
            position: self.position,
        }
    }

    pub fn read<T: Decode>(&mut self) -> Result<T, StreamError> {
        self.read_with(T::decode)
    }

    pub fn read_with<T>(
        &mut self,
        decode: impl FnOnce(&mut &[u8]) -> Result<T, DecodeError>,
    ) -> Result<T, StreamError> {
        let mut cursor = self.cursor();
        let value = cursor.read_with(decode)?;
        self.position = cursor.position;
        Ok(value)
    }

    pub fn seek(&mut self, n: usize) -> Result<(), StreamError> {
        let mut cursor = self.cursor();
        cursor.seek(n)?;
        self.position = cursor.position;
        Ok(())
    }

    /// Appends the encoding of `value`.
    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode(&mut self.bytes);
        self
    }

    /// Appends raw bytes without a length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Moves the read position back to the start.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.position = 0;
    }
}

impl From<Vec<u8>> for Stream {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes, position: 0 }
    }
}
