//! Derive macros for the register engine.
//!
//! - `#[derive(BinaryCodec)]`: deterministic binary serialization
//! - `#[derive(Error)]`: `Display`, `std::error::Error` and `From` conversions

mod binary_codec;
mod error;

use proc_macro::TokenStream;

/// Implements `Encode` and `Decode` from `crate::types::encoding`.
#[proc_macro_derive(BinaryCodec)]
pub fn derive_binary_codec(input: TokenStream) -> TokenStream {
    binary_codec::derive_binary_codec(input)
}

/// Implements `Display` and `Error`, plus `From` for `#[from]` fields.
#[proc_macro_derive(Error, attributes(error, from))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
