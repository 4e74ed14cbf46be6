//! Scratch memory for condition values.
//!
//! Every value the evaluator holds lives in one fixed-size byte pool. A value
//! takes a slot sized by its type: integers up to 64 bits use one 8-byte word,
//! UINT256 and UINT512 use their width, STRING and BYTES use exactly their
//! length (one byte when empty). Slots are placed first-fit.
//!
//! ```text
//! pool: [ slot | free | slot | slot | free ............ ]
//!         ^0     ^gap   ^offset
//! ```

use crate::types::value::{Value, ValueError, ValueType};
use register_derive::Error;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Pool size used when none is configured.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Slot size of every integer up to 64 bits.
const WORD_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScratchError {
    #[error("scratch memory exhausted: {requested} bytes requested, {available} available")]
    Exhausted { requested: usize, available: usize },
    #[error("no live allocation at offset {0}")]
    InvalidHandle(usize),
    #[error("{0}")]
    Value(#[from] ValueError),
}

/// Location of one value in the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle {
    offset: usize,
    /// Reserved bytes.
    slot: usize,
    /// Bytes of the value itself.
    len: usize,
    ty: ValueType,
}

impl Handle {
    pub fn ty(&self) -> ValueType {
        self.ty
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

pub struct Scratch {
    memory: Vec<u8>,
    /// Live slots by offset.
    slots: BTreeMap<usize, usize>,
    used: usize,
}

impl Scratch {
    pub fn new(capacity: usize) -> Self {
        Self {
            memory: vec![0u8; capacity],
            slots: BTreeMap::new(),
            used: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Bytes not reserved by a live slot.
    pub fn available(&self) -> usize {
        self.capacity() - self.used
    }

    /// Slot size reserved for `value`.
    pub fn slot_size(value: &Value) -> usize {
        match value.ty() {
            ValueType::Uint256 => 32,
            ValueType::Uint512 => 64,
            ValueType::String | ValueType::Bytes => value.len().max(1),
            _ => WORD_SIZE,
        }
    }

    /// Copies `value` into the first gap that fits it.
    pub fn allocate(&mut self, value: &Value) -> Result<Handle, ScratchError> {
        let slot = Self::slot_size(value);
        let offset = self.first_fit(slot).ok_or(ScratchError::Exhausted {
            requested: slot,
            available: self.available(),
        })?;

        let raw = value.raw();
        self.memory[offset..offset + raw.len()].copy_from_slice(&raw);
        self.memory[offset + raw.len()..offset + slot].fill(0);
        self.slots.insert(offset, slot);
        self.used += slot;

        Ok(Handle {
            offset,
            slot,
            len: raw.len(),
            ty: value.ty(),
        })
    }

    fn first_fit(&self, slot: usize) -> Option<usize> {
        let mut cursor = 0;
        for (&offset, &len) in &self.slots {
            if offset - cursor >= slot {
                return Some(cursor);
            }
            cursor = offset + len;
        }
        (self.capacity() - cursor >= slot).then_some(cursor)
    }

    fn check(&self, handle: &Handle) -> Result<(), ScratchError> {
        match self.slots.get(&handle.offset) {
            Some(&slot) if slot == handle.slot => Ok(()),
            _ => Err(ScratchError::InvalidHandle(handle.offset)),
        }
    }

    /// Raw bytes of a live value.
    pub fn bytes(&self, handle: &Handle) -> Result<&[u8], ScratchError> {
        self.check(handle)?;
        Ok(&self.memory[handle.offset..handle.offset + handle.len])
    }

    /// Copies a live value back out of the pool.
    pub fn read(&self, handle: &Handle) -> Result<Value, ScratchError> {
        let bytes = self.bytes(handle)?;
        Ok(Value::from_raw(handle.ty, bytes)?)
    }

    /// Releases `handle` and returns its value.
    pub fn deallocate(&mut self, handle: Handle) -> Result<Value, ScratchError> {
        self.check(&handle)?;
        let value = self.read(&handle);
        self.slots.remove(&handle.offset);
        self.used -= handle.slot;
        self.memory[handle.offset..handle.offset + handle.slot].fill(0);
        value
    }

    /// Whether the bytes of `needle` appear contiguously in `haystack`.
    pub fn contains(&self, haystack: &Handle, needle: &Handle) -> Result<bool, ScratchError> {
        Ok(contains(self.bytes(haystack)?, self.bytes(needle)?))
    }

    /// Orders two live values. STRING and BYTES pairs compare as byte
    /// strings, anything else as little-endian unsigned integers.
    pub fn compare(&self, a: &Handle, b: &Handle) -> Result<Ordering, ScratchError> {
        let (left, right) = (self.bytes(a)?, self.bytes(b)?);
        Ok(if is_data(a.ty) && is_data(b.ty) {
            left.cmp(right)
        } else {
            compare_le(left, right)
        })
    }

    /// Starts a scope whose allocations are released when it is dropped.
    pub fn scope(&mut self) -> ScratchScope<'_> {
        ScratchScope {
            scratch: self,
            handles: Vec::new(),
        }
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn is_data(ty: ValueType) -> bool {
    matches!(ty, ValueType::String | ValueType::Bytes)
}

/// Contiguous containment. An empty needle is always contained.
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

/// Compares little-endian unsigned integers of any length, zero-extending
/// the shorter one.
pub fn compare_le(a: &[u8], b: &[u8]) -> Ordering {
    let width = a.len().max(b.len());
    let byte = |bytes: &[u8], i: usize| bytes.get(i).copied().unwrap_or(0);
    (0..width)
        .rev()
        .map(|i| byte(a, i).cmp(&byte(b, i)))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Allocation scope over a [`Scratch`] pool.
pub struct ScratchScope<'s> {
    scratch: &'s mut Scratch,
    handles: Vec<Handle>,
}

impl ScratchScope<'_> {
    pub fn allocate(&mut self, value: &Value) -> Result<Handle, ScratchError> {
        let handle = self.scratch.allocate(value)?;
        self.handles.push(handle);
        Ok(handle)
    }

    pub fn deallocate(&mut self, handle: Handle) -> Result<Value, ScratchError> {
        let value = self.scratch.deallocate(handle)?;
        self.handles.retain(|held| *held != handle);
        Ok(value)
    }

    pub fn pool(&self) -> &Scratch {
        &*self.scratch
    }
}

impl Drop for ScratchScope<'_> {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = self.scratch.deallocate(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==== Allocation ====

    #[test]
    fn slot_sizes_follow_the_type() {
        assert_eq!(Scratch::slot_size(&Value::Uint8(1)), 8);
        assert_eq!(Scratch::slot_size(&Value::Uint64(1)), 8);
        assert_eq!(Scratch::slot_size(&Value::Uint256([0; 32])), 32);
        assert_eq!(Scratch::slot_size(&Value::Uint512([0; 64])), 64);
        assert_eq!(Scratch::slot_size(&Value::String("abc".into())), 3);
        assert_eq!(Scratch::slot_size(&Value::Bytes(Vec::new())), 1);
    }

    #[test]
    fn allocate_and_deallocate_restore_available() {
        let mut scratch = Scratch::new(128);
        let a = scratch.allocate(&Value::Uint16(0xBEEF)).unwrap();
        let b = scratch.allocate(&Value::String("scratch".into())).unwrap();
        assert_eq!(scratch.available(), 128 - 8 - 7);
        assert_eq!(b.offset(), 8);

        assert_eq!(scratch.deallocate(a).unwrap(), Value::Uint16(0xBEEF));
        assert_eq!(scratch.deallocate(b).unwrap(), Value::String("scratch".into()));
        assert_eq!(scratch.available(), 128);
    }

    #[test]
    fn first_fit_reuses_gaps() {
        let mut scratch = Scratch::new(64);
        let a = scratch.allocate(&Value::Uint64(1)).unwrap();
        let _b = scratch.allocate(&Value::Uint64(2)).unwrap();
        scratch.deallocate(a).unwrap();

        let c = scratch.allocate(&Value::Uint32(3)).unwrap();
        assert_eq!(c.offset(), 0);
        let d = scratch.allocate(&Value::Uint256([4; 32])).unwrap();
        assert_eq!(d.offset(), 16);
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut scratch = Scratch::new(40);
        scratch.allocate(&Value::Uint256([1; 32])).unwrap();
        assert_eq!(
            scratch.allocate(&Value::Uint256([2; 32])),
            Err(ScratchError::Exhausted {
                requested: 32,
                available: 8
            })
        );
        assert!(scratch.allocate(&Value::Uint8(9)).is_ok());
    }

    #[test]
    fn stale_handles_are_rejected() {
        let mut scratch = Scratch::new(32);
        let handle = scratch.allocate(&Value::Uint8(1)).unwrap();
        scratch.deallocate(handle).unwrap();
        assert_eq!(scratch.read(&handle), Err(ScratchError::InvalidHandle(0)));
        assert_eq!(scratch.deallocate(handle), Err(ScratchError::InvalidHandle(0)));
        assert_eq!(scratch.available(), 32);
    }

    #[test]
    fn scope_releases_on_drop() {
        let mut scratch = Scratch::new(256);
        {
            let mut scope = scratch.scope();
            let kept = scope.allocate(&Value::Uint512([1; 64])).unwrap();
            scope.allocate(&Value::Bytes(vec![2; 10])).unwrap();
            scope.deallocate(kept).unwrap();
            assert_eq!(scope.pool().available(), 246);
        }
        assert_eq!(scratch.available(), 256);
    }

    // ==== Comparison ====

    #[test]
    fn compare_integers_zero_extends() {
        let mut scratch = Scratch::new(128);
        let small = scratch.allocate(&Value::Uint8(200)).unwrap();
        let wide = scratch.allocate(&Value::Uint64(200)).unwrap();
        let big = scratch.allocate(&Value::Uint32(0x0100)).unwrap();
        assert_eq!(scratch.compare(&small, &wide), Ok(Ordering::Equal));
        assert_eq!(scratch.compare(&small, &big), Ok(Ordering::Less));
        assert_eq!(scratch.compare(&big, &wide), Ok(Ordering::Greater));
    }

    #[test]
    fn compare_strings_lexicographically() {
        let mut scratch = Scratch::new(128);
        let a = scratch.allocate(&Value::String("ab".into())).unwrap();
        let b = scratch.allocate(&Value::Bytes(b"b".to_vec())).unwrap();
        assert_eq!(scratch.compare(&a, &b), Ok(Ordering::Less));
    }

    #[test]
    fn contains_is_contiguous() {
        assert!(contains(b"is there an atomic bear out there?", b"bear out"));
        assert!(!contains(b"is there an atomic bear out there?", b"atomic fox"));
        assert!(contains(b"anything", b""));
        assert!(!contains(b"ab", b"abc"));
    }
}
