//! SHA3 digests used for register checksums and condition hashing.

use crate::types::encoding::EncodeSink;
use register_derive::BinaryCodec;
use sha3::{Digest, Sha3_256, Sha3_512};
use std::fmt;

/// SHA3-256 hash length in bytes.
pub const HASH_LEN: usize = 32;

/// A 32-byte SHA3-256 digest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BinaryCodec)]
pub struct Hash(pub [u8; HASH_LEN]);

impl Hash {
    pub const fn zero() -> Hash {
        Hash([0u8; HASH_LEN])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Starts an incremental SHA3-256 computation.
    pub fn sha3() -> HashBuilder {
        HashBuilder::new()
    }

    /// SHA3-256 of a single buffer.
    pub fn digest(data: &[u8]) -> Hash {
        let mut builder = HashBuilder::new();
        builder.update(data);
        builder.finalize()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

/// Writes `bytes` as lowercase hex.
pub(crate) fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(f, "{:02x}", byte)?;
    }
    Ok(())
}

/// Incremental SHA3-256 builder. Implements [`EncodeSink`] so encodable
/// values can be fed in directly.
pub struct HashBuilder {
    hasher: Sha3_256,
}

impl HashBuilder {
    pub fn new() -> Self {
        Self {
            hasher: Sha3_256::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub fn finalize(self) -> Hash {
        Hash(self.hasher.finalize().into())
    }
}

impl Default for HashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeSink for HashBuilder {
    fn write(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }
}

/// SHA3-512 of `data`, the 512-bit digest behind `CRYPTO::SK512`.
pub fn sha3_512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha3_512::digest(data));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::encoding::Encode;

    #[test]
    fn digest_matches_builder() {
        let mut builder = Hash::sha3();
        builder.update(b"reg");
        builder.update(b"ister");
        assert_eq!(builder.finalize(), Hash::digest(b"register"));
    }

    #[test]
    fn builder_accepts_encoded_values() {
        let mut builder = Hash::sha3();
        42u64.encode(&mut builder);
        assert_eq!(builder.finalize(), Hash::digest(&42u64.to_le_bytes()));
    }

    #[test]
    fn sha3_512_is_distinct_from_256() {
        let wide = sha3_512(b"register");
        assert_eq!(wide.len(), 64);
        assert_ne!(&wide[..32], Hash::digest(b"register").as_slice());
    }

    #[test]
    fn display_is_lowercase_hex() {
        let mut bytes = [0u8; HASH_LEN];
        bytes[0] = 0xAB;
        let text = Hash(bytes).to_string();
        assert!(text.starts_with("ab00"));
        assert_eq!(text.len(), 64);
    }
}
