//! 256-bit register addresses.
//!
//! An address is 32 bytes read as a little-endian integer. Its most
//! significant byte (index 31) holds the [`Category`], so the category can be
//! checked without touching the store.

use crate::register::state::RegisterType;
use crate::types::hash::{Hash, write_hex};
use crate::types::identity::Genesis;
use rand_core::{OsRng, RngCore};
use register_derive::BinaryCodec;
use std::fmt;

/// Index of the category byte.
const CATEGORY_BYTE: usize = 31;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Readonly = 0xC1,
    Append = 0xC2,
    Raw = 0xC3,
    Object = 0xC4,
    Account = 0xD1,
    Token = 0xD2,
    Trust = 0xD3,
    Name = 0xD4,
    Namespace = 0xD5,
    Wildcard = 0xFF,
}

impl Category {
    pub const fn from_byte(byte: u8) -> Option<Category> {
        Some(match byte {
            0xC1 => Category::Readonly,
            0xC2 => Category::Append,
            0xC3 => Category::Raw,
            0xC4 => Category::Object,
            0xD1 => Category::Account,
            0xD2 => Category::Token,
            0xD3 => Category::Trust,
            0xD4 => Category::Name,
            0xD5 => Category::Namespace,
            0xFF => Category::Wildcard,
            _ => return None,
        })
    }

    /// Whether a register of `register_type` may live under this category.
    pub fn admits(self, register_type: RegisterType) -> bool {
        match self {
            Category::Readonly => register_type == RegisterType::Readonly,
            Category::Append => register_type == RegisterType::Append,
            Category::Raw => register_type == RegisterType::Raw,
            Category::Object
            | Category::Account
            | Category::Token
            | Category::Trust
            | Category::Name
            | Category::Namespace => register_type == RegisterType::Object,
            Category::Wildcard => false,
        }
    }
}

/// Input material for [`Address::derive`].
#[derive(Clone, Copy, Debug)]
pub enum Seed<'a> {
    /// Fresh operating-system randomness.
    Random,
    /// Human-readable name scoped to its owner.
    Named { name: &'a str, owner: &'a Genesis },
    /// Arbitrary content, hashed.
    Content(&'a [u8]),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BinaryCodec)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const fn zero() -> Self {
        Address([0u8; 32])
    }

    pub fn derive(category: Category, seed: Seed<'_>) -> Self {
        let mut bytes = match seed {
            Seed::Random => {
                let mut bytes = [0u8; 32];
                OsRng.fill_bytes(&mut bytes);
                bytes
            }
            Seed::Named { name, owner } => {
                let mut h = Hash::sha3();
                h.update(b"NAME");
                h.update(name.as_bytes());
                h.update(owner.as_slice());
                h.finalize().0
            }
            Seed::Content(content) => {
                let mut h = Hash::sha3();
                h.update(b"ADDRESS");
                h.update(content);
                h.finalize().0
            }
        };
        bytes[CATEGORY_BYTE] = category as u8;
        Address(bytes)
    }

    pub fn random(category: Category) -> Self {
        Self::derive(category, Seed::Random)
    }

    pub fn named(name: &str, owner: &Genesis, category: Category) -> Self {
        Self::derive(category, Seed::Named { name, owner })
    }

    pub fn category(&self) -> Option<Category> {
        Category::from_byte(self.0[CATEGORY_BYTE])
    }

    /// Non-zero with a known category other than the wildcard.
    pub fn is_valid(&self) -> bool {
        self.0 != [0u8; 32]
            && matches!(self.category(), Some(category) if category != Category::Wildcard)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}
