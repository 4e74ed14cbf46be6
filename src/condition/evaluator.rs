//! Single-pass condition evaluator.
//!
//! The script is read left to right exactly once:
//!
//! ```text
//! condition  := term ((AND | OR) term)*
//! term       := GROUP condition UNGROUP | expression
//! expression := chain comparison chain
//! chain      := primary postfix*
//! ```
//!
//! Values live in the [`Scratch`] pool for the duration of one expression.
//! Without a context (verification) every context read yields an opaque
//! operand that only carries its type, and arithmetic faults are collected as
//! warnings. With a context (execution) a scope whose result is already
//! decided is still parsed, but its reads and faults are skipped.

use crate::condition::errors::{ConditionError, Fault, Warning};
use crate::condition::isa::{Op, OpClass, Token};
use crate::condition::scratch::{Handle, Scratch, ScratchScope};
use crate::context::ConditionContext;
use crate::operation::Opcode;
use crate::register::address::Address;
use crate::register::object::ObjectError;
use crate::register::stream::{Cursor, tail, window};
use crate::types::hash::{Hash, sha3_512};
use crate::types::value::{Value, ValueType};
use primitive_types::U512;
use std::cmp::Ordering;

/// VALIDATE opcode, txid and contract index.
const VALIDATE_LEN: usize = 1 + 64 + 4;

/// Deepest GROUP nesting a script may use.
pub(crate) const MAX_GROUP_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Truth {
    Known(bool),
    /// Depends on a value only known at execution.
    Unknown,
}

impl Truth {
    fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::Known(false), _) | (_, Truth::Known(false)) => Truth::Known(false),
            (Truth::Known(true), Truth::Known(true)) => Truth::Known(true),
            _ => Truth::Unknown,
        }
    }

    fn or(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::Known(true), _) | (_, Truth::Known(true)) => Truth::Known(true),
            (Truth::Known(false), Truth::Known(false)) => Truth::Known(false),
            _ => Truth::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Operand {
    Live(Handle),
    /// Not computed; the type when it is known.
    Opaque(Option<ValueType>),
}

impl Operand {
    fn ty(&self) -> Option<ValueType> {
        match self {
            Operand::Live(handle) => Some(handle.ty()),
            Operand::Opaque(ty) => *ty,
        }
    }
}

pub(crate) struct Evaluator<'a> {
    cursor: Cursor<'a>,
    context: Option<&'a ConditionContext<'a>>,
    warnings: Vec<Warning>,
    /// Depth of terms whose result no longer matters.
    skip: usize,
    /// Open GROUPs.
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(script: &'a [u8], context: Option<&'a ConditionContext<'a>>) -> Self {
        Self {
            cursor: Cursor::new(script),
            context,
            warnings: Vec::new(),
            skip: 0,
            depth: 0,
        }
    }

    /// Evaluates the whole script.
    pub(crate) fn run(mut self, scratch: &mut Scratch) -> Result<(Truth, Vec<Warning>), ConditionError> {
        let truth = self.condition(scratch)?;
        if !self.cursor.end() {
            // An UNGROUP with no open group.
            return Err(ConditionError::GroupsIncomplete);
        }
        Ok((truth, self.warnings))
    }

    /// The context, unless reads are skipped.
    fn live(&self) -> Option<&'a ConditionContext<'a>> {
        if self.skip == 0 { self.context } else { None }
    }

    fn peek_op(&self) -> Result<Option<Op>, ConditionError> {
        match self.cursor.peek() {
            None => Ok(None),
            Some(byte) if ValueType::from_tag(byte).is_some() => Err(ConditionError::Malformed),
            Some(byte) => Op::try_from(byte).map(Some),
        }
    }

    // =========================
    // Logic
    // =========================

    fn condition(&mut self, scratch: &mut Scratch) -> Result<Truth, ConditionError> {
        let mut truth = self.term(scratch)?;
        let mut logic: Option<Op> = None;

        while let Some(op) = self.peek_op()? {
            if op == Op::Ungroup {
                break;
            }
            if op.class() != OpClass::Logic {
                return Err(ConditionError::Malformed);
            }
            self.cursor.seek(1)?;
            if let Some(previous) = logic {
                if previous != op {
                    return Err(ConditionError::MixedLogic { op, previous });
                }
            }
            logic = Some(op);

            let decided = self.context.is_some()
                && match op {
                    Op::And => truth == Truth::Known(false),
                    _ => truth == Truth::Known(true),
                };
            if decided {
                self.skip += 1;
            }
            let next = self.term(scratch);
            if decided {
                self.skip -= 1;
            }
            let next = next?;
            if !decided {
                truth = if op == Op::And {
                    truth.and(next)
                } else {
                    truth.or(next)
                };
            }
        }
        Ok(truth)
    }

    fn term(&mut self, scratch: &mut Scratch) -> Result<Truth, ConditionError> {
        if self.cursor.peek() == Some(Op::Group.byte()) {
            if self.depth == MAX_GROUP_DEPTH {
                return Err(ConditionError::GroupDepth(MAX_GROUP_DEPTH));
            }
            self.cursor.seek(1)?;
            self.depth += 1;
            let truth = self.condition(scratch)?;
            self.depth -= 1;
            if self.cursor.peek() != Some(Op::Ungroup.byte()) {
                return Err(ConditionError::GroupsIncomplete);
            }
            self.cursor.seek(1)?;
            return Ok(truth);
        }
        let mut scope = scratch.scope();
        self.expression(&mut scope)
    }

    fn expression(&mut self, scope: &mut ScratchScope<'_>) -> Result<Truth, ConditionError> {
        let left = self.chain(scope)?;
        let op = match self.peek_op()? {
            Some(op) if op.class() == OpClass::Compare => op,
            _ => return Err(ConditionError::Malformed),
        };
        self.cursor.seek(1)?;
        let right = self.chain(scope)?;

        let (Operand::Live(a), Operand::Live(b)) = (left, right) else {
            return Ok(Truth::Unknown);
        };
        let pool = scope.pool();
        let result = match op {
            Op::Contains => pool.contains(&a, &b)?,
            Op::Equals => pool.compare(&a, &b)? == Ordering::Equal,
            Op::NotEquals => pool.compare(&a, &b)? != Ordering::Equal,
            Op::LessThan => pool.compare(&a, &b)? == Ordering::Less,
            Op::GreaterThan => pool.compare(&a, &b)? == Ordering::Greater,
            _ => return Err(ConditionError::Malformed),
        };
        Ok(Truth::Known(result))
    }

    // =========================
    // Values
    // =========================

    fn chain(&mut self, scope: &mut ScratchScope<'_>) -> Result<Operand, ConditionError> {
        let mut operand = self.primary(scope)?;
        while let Some(op) = self.peek_op()? {
            if !op.class().is_postfix() {
                break;
            }
            let offset = self.cursor.position();
            let token = Token::read(&mut self.cursor)?;
            operand = self.postfix(scope, op, token, operand, offset)?;
        }
        Ok(operand)
    }

    fn primary(&mut self, scope: &mut ScratchScope<'_>) -> Result<Operand, ConditionError> {
        let byte = self.cursor.peek().ok_or(ConditionError::Malformed)?;
        if ValueType::from_tag(byte).is_some() {
            return match Token::read(&mut self.cursor)? {
                Token::Literal(value) => Ok(Operand::Live(scope.allocate(&value)?)),
                _ => Err(ConditionError::Malformed),
            };
        }

        let op = Op::try_from(byte)?;
        match op.class() {
            OpClass::Caller | OpClass::Ledger => {
                self.cursor.seek(1)?;
                self.context_value(scope, op)
            }
            OpClass::Register => Err(ConditionError::MissingRegisterValue),
            _ => Err(ConditionError::Malformed),
        }
    }

    fn context_value(&mut self, scope: &mut ScratchScope<'_>, op: Op) -> Result<Operand, ConditionError> {
        let ty = match op {
            Op::CallerGenesis => ValueType::Uint256,
            Op::CallerOperations => ValueType::Bytes,
            Op::LedgerHeight => ValueType::Uint32,
            Op::CallerTimestamp | Op::LedgerTimestamp | Op::LedgerSupply => ValueType::Uint64,
            _ => return Err(ConditionError::Malformed),
        };
        let Some(context) = self.live() else {
            return Ok(Operand::Opaque(Some(ty)));
        };

        let value = match op {
            Op::CallerGenesis => Value::Uint256(context.caller.caller().0),
            Op::CallerTimestamp => Value::Uint64(context.caller.timestamp()),
            Op::CallerOperations => {
                Value::Bytes(caller_operations(context.caller.operation().as_slice())?.to_vec())
            }
            Op::LedgerHeight => Value::Uint32(context.ledger.height),
            Op::LedgerTimestamp => Value::Uint64(context.ledger.timestamp),
            _ => Value::Uint64(context.ledger.supply),
        };
        Ok(Operand::Live(scope.allocate(&value)?))
    }

    fn postfix(
        &mut self,
        scope: &mut ScratchScope<'_>,
        op: Op,
        token: Token,
        operand: Operand,
        offset: usize,
    ) -> Result<Operand, ConditionError> {
        match (op.class(), token) {
            (OpClass::Binary, _) => {
                let right = self.primary(scope)?;
                if op == Op::Cat {
                    concat(scope, operand, right)
                } else {
                    self.arithmetic(scope, op, operand, Some(right), offset)
                }
            }
            (OpClass::Unary, _) => self.arithmetic(scope, op, operand, None, offset),
            (OpClass::Slice, Token::SubData { offset: start, length }) => {
                slice(scope, operand, start, length)
            }
            (OpClass::Register, token) => self.register(scope, op, &token, operand),
            (OpClass::Crypto, _) => hash(scope, op, operand),
            _ => Err(ConditionError::Malformed),
        }
    }

    fn arithmetic(
        &mut self,
        scope: &mut ScratchScope<'_>,
        op: Op,
        left: Operand,
        right: Option<Operand>,
        offset: usize,
    ) -> Result<Operand, ConditionError> {
        let left_ty = integer(op, &left)?;
        let right_ty = match &right {
            Some(right) => integer(op, right)?,
            None => left_ty,
        };
        let ty = match (left_ty, right_ty) {
            (Some(a), Some(b)) => Some(a.wider(b)),
            _ => None,
        };

        let a = take(scope, left)?;
        let b = match right {
            Some(right) => take(scope, right)?,
            None => a.as_ref().map(|_| Value::Uint8(1)),
        };
        let (Some(a), Some(b), Some(ty)) = (a, b, ty) else {
            return Ok(Operand::Opaque(ty));
        };

        let width = ty.width().unwrap_or(64);
        match compute(op, to_u512(&a), to_u512(&b), max_value(width)) {
            Ok(result) => {
                let mut bytes = [0u8; 64];
                result.to_little_endian(&mut bytes);
                let value = Value::from_raw(ty, &bytes[..width])?;
                Ok(Operand::Live(scope.allocate(&value)?))
            }
            Err(fault) => self.fault(
                Warning {
                    op,
                    fault,
                    bits: width * 8,
                    offset,
                },
                Some(ty),
            ),
        }
    }

    /// Records a warning under verification, fails under execution.
    fn fault(&mut self, warning: Warning, ty: Option<ValueType>) -> Result<Operand, ConditionError> {
        if self.context.is_none() {
            self.warnings.push(warning);
        } else if self.skip == 0 {
            return Err(ConditionError::Arithmetic(warning));
        }
        Ok(Operand::Opaque(ty))
    }

    fn register(
        &mut self,
        scope: &mut ScratchScope<'_>,
        op: Op,
        token: &Token,
        operand: Operand,
    ) -> Result<Operand, ConditionError> {
        let ty = match op {
            Op::Modified => Some(ValueType::Uint64),
            Op::Owner => Some(ValueType::Uint256),
            Op::RegisterType => Some(ValueType::Uint8),
            Op::State => Some(ValueType::Bytes),
            _ => None,
        };
        let address = match operand {
            Operand::Live(handle) => address_of(op, &scope.deallocate(handle)?)?,
            Operand::Opaque(Some(known)) => match known.width() {
                Some(width) if width != 32 => {
                    return Err(ConditionError::AddressWidth { op, len: width });
                }
                _ => return Ok(Operand::Opaque(ty)),
            },
            Operand::Opaque(None) => return Ok(Operand::Opaque(ty)),
        };
        let Some(context) = self.live() else {
            return Ok(Operand::Opaque(ty));
        };

        let state = context
            .store
            .read_state(&address, context.flags)?
            .ok_or(ConditionError::RegisterNotFound { op, address })?;
        let value = match (op, token) {
            (Op::Modified, _) => Value::Uint64(state.modified),
            (Op::Owner, _) => Value::Uint256(state.owner.0),
            (Op::RegisterType, _) => Value::Uint8(state.register_type as u8),
            (Op::State, _) => Value::Bytes(state.payload),
            (Op::FieldValue, Token::FieldValue { field }) => {
                let object = match state.object() {
                    Ok(object) => object,
                    Err(ObjectError::NotAnObject(_)) => {
                        return Err(ConditionError::NotAnObject(address));
                    }
                    Err(err) => return Err(err.into()),
                };
                object
                    .get(field)
                    .cloned()
                    .ok_or_else(|| ConditionError::FieldNotFound(field.clone()))?
            }
            _ => return Err(ConditionError::Malformed),
        };
        Ok(Operand::Live(scope.allocate(&value)?))
    }
}

/// Operations of the calling contract after any VALIDATE or CONDITION
/// prefix.
fn caller_operations(bytes: &[u8]) -> Result<&[u8], ConditionError> {
    let first = *bytes.first().ok_or(ConditionError::CallerEmpty)?;
    let offset = if first == Opcode::Validate.byte() {
        VALIDATE_LEN
    } else if first == Opcode::Condition.byte() {
        1
    } else {
        0
    };
    tail(bytes, offset).map_err(|_| ConditionError::OffsetOutOfRange {
        op: Op::CallerOperations,
    })
}

/// The integer type of `operand`, failing for known STRING and BYTES.
fn integer(op: Op, operand: &Operand) -> Result<Option<ValueType>, ConditionError> {
    match operand.ty() {
        Some(ty) if !ty.is_integer() => Err(ConditionError::TypeMismatch { op, actual: ty }),
        ty => Ok(ty),
    }
}

/// Releases a live operand and returns its value.
fn take(scope: &mut ScratchScope<'_>, operand: Operand) -> Result<Option<Value>, ConditionError> {
    match operand {
        Operand::Live(handle) => Ok(Some(scope.deallocate(handle)?)),
        Operand::Opaque(_) => Ok(None),
    }
}

fn to_u512(value: &Value) -> U512 {
    U512::from_little_endian(&value.raw())
}

/// Largest integer `width` bytes hold.
fn max_value(width: usize) -> U512 {
    let mut bytes = [0u8; 64];
    bytes[..width.min(64)].fill(0xFF);
    U512::from_little_endian(&bytes)
}

fn compute(op: Op, left: U512, right: U512, max: U512) -> Result<U512, Fault> {
    let result = match op {
        Op::Add | Op::Inc => left.checked_add(right),
        Op::Sub | Op::Dec => left.checked_sub(right),
        Op::Mul => left.checked_mul(right),
        Op::Exp => left.checked_pow(right),
        Op::Div | Op::Mod if right.is_zero() => return Err(Fault::DivideByZero),
        Op::Div => Some(left / right),
        Op::Mod => Some(left % right),
        _ => None,
    };
    result.filter(|value| *value <= max).ok_or(Fault::Overflow)
}

fn concat(scope: &mut ScratchScope<'_>, left: Operand, right: Operand) -> Result<Operand, ConditionError> {
    let ty = match (left.ty(), right.ty()) {
        (Some(ValueType::String), Some(ValueType::String)) => ValueType::String,
        _ => ValueType::Bytes,
    };
    let (Operand::Live(a), Operand::Live(b)) = (left, right) else {
        return Ok(Operand::Opaque(Some(ty)));
    };
    let mut data = scope.deallocate(a)?.raw();
    data.extend_from_slice(&scope.deallocate(b)?.raw());
    let value = Value::from_raw(ty, &data)?;
    Ok(Operand::Live(scope.allocate(&value)?))
}

fn slice(
    scope: &mut ScratchScope<'_>,
    operand: Operand,
    start: u16,
    length: u16,
) -> Result<Operand, ConditionError> {
    let Operand::Live(handle) = operand else {
        return Ok(Operand::Opaque(Some(ValueType::Bytes)));
    };
    let data = scope.deallocate(handle)?.raw();
    let bytes = window(&data, usize::from(start), usize::from(length))
        .map_err(|_| ConditionError::OffsetOutOfRange { op: Op::SubData })?;
    Ok(Operand::Live(scope.allocate(&Value::Bytes(bytes.to_vec()))?))
}

fn hash(scope: &mut ScratchScope<'_>, op: Op, operand: Operand) -> Result<Operand, ConditionError> {
    let ty = if op == Op::Sk256 {
        ValueType::Uint256
    } else {
        ValueType::Uint512
    };
    let Operand::Live(handle) = operand else {
        return Ok(Operand::Opaque(Some(ty)));
    };
    let data = scope.deallocate(handle)?.raw();
    let value = match ty {
        ValueType::Uint256 => Value::Uint256(Hash::digest(&data).0),
        _ => Value::Uint512(sha3_512(&data)),
    };
    Ok(Operand::Live(scope.allocate(&value)?))
}

fn address_of(op: Op, value: &Value) -> Result<Address, ConditionError> {
    let raw = value.raw();
    let bytes: [u8; 32] = raw
        .as_slice()
        .try_into()
        .map_err(|_| ConditionError::AddressWidth { op, len: raw.len() })?;
    Ok(Address(bytes))
}
