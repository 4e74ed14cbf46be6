//! Contracts: one operation, its verification trail and an optional
//! condition script.

use crate::operation::isa::{Opcode, Operation};
use crate::register::stream::Stream;
use crate::types::encoding::{Decode, DecodeError, Encode, EncodeSink};
use crate::types::identity::Genesis;

/// Markers that open each entry of the verification stream.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    /// Followed by the serialized pre-state.
    PreState = 0x01,
    /// Followed by the post-state checksum.
    PostState = 0x02,
}

impl Encode for Marker {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        (*self as u8).encode(out);
    }
}

impl Decode for Marker {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::decode(input)? {
            0x01 => Ok(Marker::PreState),
            0x02 => Ok(Marker::PostState),
            _ => Err(DecodeError::InvalidValue),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contract {
    caller: Genesis,
    timestamp: u64,
    operation: Stream,
    verification: Stream,
    condition: Option<Stream>,
}

impl Contract {
    pub fn new(caller: Genesis, timestamp: u64) -> Self {
        Self {
            caller,
            timestamp,
            operation: Stream::new(),
            verification: Stream::new(),
            condition: None,
        }
    }

    /// Appends an encoded operation to the operation stream.
    pub fn push(&mut self, operation: &Operation) -> &mut Self {
        self.operation.write(operation);
        self
    }

    /// Builder form of [`Contract::push`].
    pub fn with(mut self, operation: &Operation) -> Self {
        self.push(operation);
        self
    }

    /// Terminates the operation with REQUIRE and attaches `script` as the
    /// condition.
    pub fn require(mut self, script: Vec<u8>) -> Self {
        self.operation.write(&Opcode::Require.byte());
        self.condition = Some(Stream::from(script));
        self
    }

    /// Attaches a condition script without touching the operation stream.
    pub fn with_condition(mut self, script: Vec<u8>) -> Self {
        self.condition = Some(Stream::from(script));
        self
    }

    pub fn caller(&self) -> &Genesis {
        &self.caller
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn operation(&self) -> &Stream {
        &self.operation
    }

    pub fn operation_mut(&mut self) -> &mut Stream {
        &mut self.operation
    }

    pub fn verification(&self) -> &Stream {
        &self.verification
    }

    pub fn verification_mut(&mut self) -> &mut Stream {
        &mut self.verification
    }

    /// The operation and verification streams, borrowed together.
    pub fn streams_mut(&mut self) -> (&mut Stream, &mut Stream) {
        (&mut self.operation, &mut self.verification)
    }

    pub fn condition(&self) -> Option<&Stream> {
        self.condition.as_ref()
    }

    /// Rewinds every read position. Written bytes are kept.
    pub fn reset(&mut self) {
        self.operation.reset();
        self.verification.reset();
        if let Some(condition) = &mut self.condition {
            condition.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::address::{Address, Category};

    #[test]
    fn push_appends_encoded_operations() {
        let address = Address::random(Category::Raw);
        let operation = Operation::Append {
            address,
            data: vec![1, 2, 3],
        };
        let contract = Contract::new(Genesis([1; 32]), 10).with(&operation);
        assert_eq!(contract.operation().as_slice(), operation.to_vec().as_slice());
        assert_eq!(contract.operation().as_slice()[0], 0x03);
    }

    #[test]
    fn require_appends_opcode_and_sets_condition() {
        let contract = Contract::new(Genesis([1; 32]), 10)
            .with(&Operation::Coinbase {
                genesis: Genesis([2; 32]),
                amount: 5,
            })
            .require(vec![0x60, 1]);
        let bytes = contract.operation().as_slice();
        assert_eq!(bytes[bytes.len() - 1], 0x0D);
        assert_eq!(contract.condition().map(Stream::as_slice), Some(&[0x60, 1][..]));
    }

    #[test]
    fn markers_decode_strictly() {
        assert_eq!(Marker::from_bytes(&[0x01]), Ok(Marker::PreState));
        assert_eq!(Marker::PostState.to_vec(), vec![0x02]);
        assert_eq!(Marker::from_bytes(&[0x03]), Err(DecodeError::InvalidValue));
    }

    #[test]
    fn reset_rewinds_all_streams() {
        let mut contract = Contract::new(Genesis::zero(), 0)
            .with(&Operation::Condition {})
            .with_condition(vec![1]);
        contract.operation_mut().seek(1).unwrap();
        contract.verification_mut().write(&Marker::PreState);
        contract.reset();
        assert_eq!(contract.operation().position(), 0);
        assert_eq!(contract.verification().len(), 1);
    }
}
