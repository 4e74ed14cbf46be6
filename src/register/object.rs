//! Structured payloads of OBJECT registers.
//!
//! An object is an ordered list of named, typed fields. Fields are read-only
//! unless created mutable, and a mutable field keeps its type (and, for STRING
//! and BYTES, its length) for the lifetime of the register. Accounts and trust
//! registers are objects whose field set matches a [`Standard`].

use crate::register::state::RegisterType;
use crate::types::encoding::{Decode, DecodeError, Encode};
use crate::types::value::{Value, ValueType};
use register_derive::{BinaryCodec, Error};

/// Fields managed by DEBIT, CREDIT, TRUST and GENESIS on standard objects.
pub const RESERVED_FIELDS: [&str; 4] = ["balance", "token", "trust", "stake"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    #[error("register of type {0} is not an object")]
    NotAnObject(RegisterType),
    #[error("field {0} not found")]
    NotFound(String),
    #[error("field {0} is not mutable")]
    Immutable(String),
    #[error("field {0} is reserved")]
    Reserved(String),
    #[error("field {name} holds {expected}, not {actual}")]
    TypeMismatch {
        name: String,
        expected: ValueType,
        actual: ValueType,
    },
    #[error("field {name} must keep its length of {expected} bytes, got {actual}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate field {0}")]
    Duplicate(String),
    #[error("field names cannot be empty")]
    EmptyName,
    #[error("malformed object: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Clone, Debug, PartialEq, Eq, BinaryCodec)]
pub struct Field {
    pub name: String,
    pub mutable: bool,
    pub value: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Standard {
    Base,
    /// `balance: UINT64` (mutable) and `token: UINT256`.
    Account,
    /// Account fields plus mutable `trust` and `stake`.
    Trust,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, BinaryCodec)]
pub struct Object {
    fields: Vec<Field>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for a read-only field. A field of the same name is replaced.
    pub fn with(self, name: &str, value: Value) -> Self {
        self.with_field(name, false, value)
    }

    /// Builder for a mutable field. A field of the same name is replaced.
    pub fn with_mutable(self, name: &str, value: Value) -> Self {
        self.with_field(name, true, value)
    }

    fn with_field(mut self, name: &str, mutable: bool, value: Value) -> Self {
        self.fields.retain(|field| field.name != name);
        self.fields.push(Field {
            name: name.to_string(),
            mutable,
            value,
        });
        self
    }

    pub fn push(&mut self, name: &str, mutable: bool, value: Value) -> Result<(), ObjectError> {
        if name.is_empty() {
            return Err(ObjectError::EmptyName);
        }
        if self.field(name).is_some() {
            return Err(ObjectError::Duplicate(name.to_string()));
        }
        self.fields.push(Field {
            name: name.to_string(),
            mutable,
            value,
        });
        Ok(())
    }

    /// A fresh account holding `token`.
    pub fn account(token: [u8; 32]) -> Self {
        Self::new()
            .with_mutable("balance", Value::Uint64(0))
            .with("token", Value::Uint256(token))
    }

    /// A fresh trust register holding `token`.
    pub fn trust(token: [u8; 32]) -> Self {
        Self::account(token)
            .with_mutable("trust", Value::Uint64(0))
            .with_mutable("stake", Value::Uint64(0))
    }

    /// Decodes and validates an object payload.
    pub fn parse(bytes: &[u8]) -> Result<Self, ObjectError> {
        let decoded = Object::from_bytes(bytes)?;
        let mut object = Object::new();
        for field in decoded.fields {
            object.push(&field.name, field.mutable, field.value)?;
        }
        Ok(object)
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.to_vec()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).map(|field| &field.value)
    }

    pub fn get_u64(&self, name: &str) -> Result<u64, ObjectError> {
        match self.get(name) {
            Some(Value::Uint64(value)) => Ok(*value),
            Some(other) => Err(ObjectError::TypeMismatch {
                name: name.to_string(),
                expected: ValueType::Uint64,
                actual: other.ty(),
            }),
            None => Err(ObjectError::NotFound(name.to_string())),
        }
    }

    /// Replaces the value of a mutable field.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), ObjectError> {
        let field = self
            .fields
            .iter_mut()
            .find(|field| field.name == name)
            .ok_or_else(|| ObjectError::NotFound(name.to_string()))?;
        if !field.mutable {
            return Err(ObjectError::Immutable(name.to_string()));
        }
        if field.value.ty() != value.ty() {
            return Err(ObjectError::TypeMismatch {
                name: name.to_string(),
                expected: field.value.ty(),
                actual: value.ty(),
            });
        }
        if field.value.len() != value.len() {
            return Err(ObjectError::LengthMismatch {
                name: name.to_string(),
                expected: field.value.len(),
                actual: value.len(),
            });
        }
        field.value = value;
        Ok(())
    }

    pub fn set_u64(&mut self, name: &str, value: u64) -> Result<(), ObjectError> {
        self.set(name, Value::Uint64(value))
    }

    pub fn standard(&self) -> Standard {
        let is = |name: &str, ty: ValueType| matches!(self.get(name), Some(value) if value.ty() == ty);
        let balance = matches!(self.field("balance"), Some(field) if field.mutable && field.value.ty() == ValueType::Uint64);
        if !balance || !is("token", ValueType::Uint256) {
            return Standard::Base;
        }
        if is("trust", ValueType::Uint64) && is("stake", ValueType::Uint64) {
            Standard::Trust
        } else {
            Standard::Account
        }
    }

    /// Whether WRITE must leave `name` alone.
    pub fn is_reserved(&self, name: &str) -> bool {
        self.standard() != Standard::Base && RESERVED_FIELDS.contains(&name)
    }
}
