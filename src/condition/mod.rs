//! Condition scripts.
//!
//! A contract that ends in REQUIRE carries a condition script that a later
//! contract must satisfy. [`verify`] checks a script's structure and arithmetic
//! without any context; [`Condition::execute`] evaluates it against the
//! calling contract, the register store and the ledger snapshot.
//!
//! - `isa`: condition opcodes and script tokens
//! - `scratch`: fixed-size value pool the evaluator allocates from
//! - `evaluator`: the single-pass grammar walk

pub mod errors;
mod evaluator;
pub mod isa;
pub mod scratch;


use crate::context::ConditionContext;
use crate::{debug, warn};
use evaluator::{Evaluator, Truth};
use scratch::{DEFAULT_CAPACITY, Scratch};

pub use errors::{ConditionError, Fault, Warning};
pub use isa::{Op, OpClass, Token};
pub use scratch::{Handle, ScratchError};

/// Checks `script` without a context and returns its arithmetic warnings.
pub fn verify(script: &[u8]) -> Result<Vec<Warning>, ConditionError> {
    verify_with_capacity(script, DEFAULT_CAPACITY)
}

/// [`verify`] with a scratch pool of `capacity` bytes.
pub fn verify_with_capacity(script: &[u8], capacity: usize) -> Result<Vec<Warning>, ConditionError> {
    verify_in(script, &mut Scratch::new(capacity))
}

fn verify_in(script: &[u8], scratch: &mut Scratch) -> Result<Vec<Warning>, ConditionError> {
    let (_, warnings) = Evaluator::new(script, None).run(scratch)?;
    for warning in &warnings {
        warn!("condition warning at offset {}: {}", warning.offset, warning);
    }
    Ok(warnings)
}

/// A condition script bound to the context it is evaluated in.
pub struct Condition<'a> {
    script: &'a [u8],
    context: ConditionContext<'a>,
    scratch: Scratch,
}

impl<'a> Condition<'a> {
    pub fn new(script: &'a [u8], context: ConditionContext<'a>) -> Self {
        Self::with_capacity(script, context, DEFAULT_CAPACITY)
    }

    /// Binds `script` with a scratch pool of `capacity` bytes.
    pub fn with_capacity(script: &'a [u8], context: ConditionContext<'a>, capacity: usize) -> Self {
        Self {
            script,
            context,
            scratch: Scratch::new(capacity),
        }
    }

    /// Same as [`verify`], using this condition's scratch pool.
    pub fn verify(&mut self) -> Result<Vec<Warning>, ConditionError> {
        verify_in(self.script, &mut self.scratch)
    }

    /// Evaluates the script. Arithmetic faults and failed reads are errors.
    pub fn execute(&mut self) -> Result<bool, ConditionError> {
        let (truth, _) = Evaluator::new(self.script, Some(&self.context)).run(&mut self.scratch)?;
        let satisfied = truth == Truth::Known(true);
        debug!(
            "condition by {} evaluated to {}",
            self.context.caller.caller(),
            satisfied
        );
        Ok(satisfied)
    }

    /// Free bytes of the scratch pool.
    pub fn available(&self) -> usize {
        self.scratch.available()
    }
}
