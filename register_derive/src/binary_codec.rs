//! `BinaryCodec` derive.
//!
//! Fields are written in declaration order with the rules of
//! `crate::types::encoding`: fixed-width little-endian integers, 8-byte length
//! prefixes for vectors and strings, arrays without prefix. Enums start with a
//! one-byte discriminant that honours explicit values (`Readonly = 0x01`).
//!
//! The output is deterministic, so encoded values can be hashed directly into
//! register checksums.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Data, DataEnum, DeriveInput, Fields, parse_macro_input};

pub fn derive_binary_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (encode_body, decode_body) = match &input.data {
        Data::Struct(data) => {
            let (pattern, names) = bind_fields(&data.fields);
            let writes = encode_all(&names);
            let build = construct(quote!(Self), &data.fields);
            (
                quote! {
                    let Self #pattern = self;
                    #writes
                },
                quote! { Ok(#build) },
            )
        }
        Data::Enum(data) => expand_enum(data)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "BinaryCodec cannot be derived for unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics crate::types::encoding::Encode for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn encode<S: crate::types::encoding::EncodeSink>(&self, out: &mut S) {
                #encode_body
            }
        }

        impl #impl_generics crate::types::encoding::Decode for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn decode(input: &mut &[u8]) -> ::std::result::Result<Self, crate::types::encoding::DecodeError> {
                #decode_body
            }
        }
    })
}

/// Builds a destructuring pattern for `fields` and the identifiers it binds.
///
/// Named fields bind their own names, tuple fields bind `f0`, `f1`, ...
fn bind_fields(fields: &Fields) -> (TokenStream2, Vec<syn::Ident>) {
    match fields {
        Fields::Named(named) => {
            let names: Vec<_> = named
                .named
                .iter()
                .filter_map(|field| field.ident.clone())
                .collect();
            (quote!({ #(#names),* }), names)
        }
        Fields::Unnamed(unnamed) => {
            let names: Vec<_> = (0..unnamed.unnamed.len())
                .map(|i| format_ident!("f{}", i))
                .collect();
            (quote!(( #(#names),* )), names)
        }
        Fields::Unit => (TokenStream2::new(), Vec::new()),
    }
}

fn encode_all(names: &[syn::Ident]) -> TokenStream2 {
    quote! {
        #( crate::types::encoding::Encode::encode(#names, out); )*
    }
}

/// Expression constructing `path` with every field decoded in order.
fn construct(path: TokenStream2, fields: &Fields) -> TokenStream2 {
    match fields {
        Fields::Named(named) => {
            let names = named.named.iter().map(|field| &field.ident);
            quote! {
                #path { #( #names: crate::types::encoding::Decode::decode(input)?, )* }
            }
        }
        Fields::Unnamed(unnamed) => {
            let reads = unnamed
                .unnamed
                .iter()
                .map(|_| quote!(crate::types::encoding::Decode::decode(input)?));
            quote!(#path( #(#reads),* ))
        }
        Fields::Unit => path,
    }
}

fn expand_enum(data: &DataEnum) -> syn::Result<(TokenStream2, TokenStream2)> {
    let tags = discriminants(data)?;

    let mut encode_arms = Vec::with_capacity(data.variants.len());
    let mut decode_arms = Vec::with_capacity(data.variants.len());
    for (variant, tag) in data.variants.iter().zip(tags) {
        let ident = &variant.ident;
        let (pattern, names) = bind_fields(&variant.fields);
        let writes = encode_all(&names);
        encode_arms.push(quote! {
            Self::#ident #pattern => {
                crate::types::encoding::Encode::encode(&#tag, out);
                #writes
            }
        });
        let build = construct(quote!(Self::#ident), &variant.fields);
        decode_arms.push(quote!(#tag => Ok(#build),));
    }

    Ok((
        quote! {
            match self {
                #(#encode_arms)*
            }
        },
        quote! {
            let tag: u8 = crate::types::encoding::Decode::decode(input)?;
            match tag {
                #(#decode_arms)*
                _ => Err(crate::types::encoding::DecodeError::InvalidValue),
            }
        },
    ))
}

/// One-byte discriminants: explicit values are kept, others count up from
/// the previous variant as in Rust itself.
fn discriminants(data: &DataEnum) -> syn::Result<Vec<u8>> {
    let mut tags = Vec::with_capacity(data.variants.len());
    let mut next: u16 = 0;
    for variant in &data.variants {
        let tag = match &variant.discriminant {
            Some((_, expr)) => literal_tag(expr)?,
            None => u8::try_from(next).map_err(|_| {
                syn::Error::new_spanned(variant, "enum has more than 256 variants")
            })?,
        };
        tags.push(tag);
        next = u16::from(tag) + 1;
    }
    Ok(tags)
}

fn literal_tag(expr: &syn::Expr) -> syn::Result<u8> {
    if let syn::Expr::Lit(syn::ExprLit {
        lit: syn::Lit::Int(int),
        ..
    }) = expr
    {
        return int.base10_parse::<u8>();
    }
    Err(syn::Error::new_spanned(
        expr,
        "BinaryCodec discriminants must be integer literals that fit in a u8",
    ))
}
