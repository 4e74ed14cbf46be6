//! `Error` derive.
//!
//! ```ignore
//! use register_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum CalcError {
//!     #[error("invalid code for register verification: {0:#04x}")]
//!     InvalidOpcode(u8),
//!
//!     #[error("OP::{op}: cannot generate pre-state if not owner")]
//!     NotOwner { op: &'static str },
//!
//!     #[error("register store: {0}")]
//!     Store(#[from] StoreError),
//! }
//! ```
//!
//! Messages interpolate tuple fields as `{0}` and named fields as `{name}`,
//! with any format spec (`{0:?}`, `{opcode:#04x}`). Fields the message does
//! not mention are ignored. A `#[from]` field must be the only field of its
//! variant; it gets a `From` impl and is returned by `source()`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Data, DeriveInput, Fields, Lit, Meta, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A `#[from]` conversion discovered on a variant or struct.
struct Source {
    /// Constructor path, `Self::Variant` or `Self`.
    path: TokenStream2,
    /// Pattern matching `self` and binding the source as `source`.
    pattern: TokenStream2,
    ty: syn::Type,
    named: Option<syn::Ident>,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut sources = Vec::new();
    let display = match &input.data {
        Data::Enum(data) => {
            let mut arms = Vec::with_capacity(data.variants.len());
            for variant in &data.variants {
                let ident = &variant.ident;
                let message = message(&variant.attrs, variant)?;
                arms.push(display_arm(quote!(Self::#ident), &variant.fields, &message));
                if let Some(source) = from_field(quote!(Self::#ident), &variant.fields)? {
                    sources.push(source);
                }
            }
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Struct(data) => {
            let message = message(&input.attrs, &input.ident)?;
            let arm = display_arm(quote!(Self), &data.fields, &message);
            if let Some(source) = from_field(quote!(Self), &data.fields)? {
                sources.push(source);
            }
            quote! {
                match self {
                    #arm
                }
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error cannot be derived for unions",
            ));
        }
    };

    let conversions = sources.iter().map(|source| {
        let ty = &source.ty;
        let build = match &source.named {
            Some(field) => {
                let path = &source.path;
                quote!(#path { #field: source })
            }
            None => {
                let path = &source.path;
                quote!(#path(source))
            }
        };
        quote! {
            impl #impl_generics ::std::convert::From<#ty> for #name #ty_generics #where_clause {
                fn from(source: #ty) -> Self {
                    #build
                }
            }
        }
    });

    let source_arms = sources.iter().map(|source| {
        let pattern = &source.pattern;
        quote!(#pattern => ::std::option::Option::Some(source),)
    });
    let source_fn = if sources.is_empty() {
        TokenStream2::new()
    } else {
        quote! {
            #[allow(unreachable_patterns)]
            fn source(&self) -> ::std::option::Option<&(dyn ::std::error::Error + 'static)> {
                match self {
                    #(#source_arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #display
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
            #source_fn
        }

        #(#conversions)*
    })
}

/// Builds one `match self` arm writing `message`.
fn display_arm(path: TokenStream2, fields: &Fields, message: &str) -> TokenStream2 {
    match fields {
        Fields::Unit => quote!(#path => write!(f, #message),),
        Fields::Named(named) => {
            let used: Vec<_> = named
                .named
                .iter()
                .filter_map(|field| field.ident.as_ref())
                .filter(|ident| mentions(message, &ident.to_string()))
                .collect();
            quote! {
                #path { #(#used,)* .. } => write!(f, #message, #(#used = #used),*),
            }
        }
        Fields::Unnamed(unnamed) => {
            let count = unnamed.unnamed.len();
            let format = positional_to_named(message, count);
            let mut bindings = Vec::with_capacity(count);
            let mut used = Vec::new();
            for index in 0..count {
                let binding = format_ident!("f{}", index);
                if mentions(&format, &binding.to_string()) {
                    bindings.push(binding.to_token_stream());
                    used.push(binding);
                } else {
                    bindings.push(quote!(_));
                }
            }
            quote! {
                #path( #(#bindings),* ) => write!(f, #format, #(#used = #used),*),
            }
        }
    }
}

/// Returns the `#[from]` source of `fields`, if any.
fn from_field(path: TokenStream2, fields: &Fields) -> syn::Result<Option<Source>> {
    let (all, named) = match fields {
        Fields::Named(named) => (named.named.iter().collect::<Vec<_>>(), true),
        Fields::Unnamed(unnamed) => (unnamed.unnamed.iter().collect::<Vec<_>>(), false),
        Fields::Unit => return Ok(None),
    };
    let Some(field) = all
        .iter()
        .find(|field| field.attrs.iter().any(|attr| attr.path().is_ident("from")))
    else {
        return Ok(None);
    };
    if all.len() != 1 {
        return Err(syn::Error::new_spanned(
            field,
            "#[from] requires the field to be the only field of its variant",
        ));
    }

    let ident = field.ident.clone();
    let pattern = match (&ident, named) {
        (Some(ident), true) => quote!(#path { #ident: source }),
        _ => quote!(#path(source)),
    };
    Ok(Some(Source {
        path,
        pattern,
        ty: field.ty.clone(),
        named: if named { ident } else { None },
    }))
}

/// True when `format` interpolates `name`, with or without a format spec.
fn mentions(format: &str, name: &str) -> bool {
    format.contains(&format!("{{{}}}", name)) || format.contains(&format!("{{{}:", name))
}

/// Rewrites positional placeholders `{0}` / `{0:x}` into `{f0}` / `{f0:x}`.
fn positional_to_named(format: &str, count: usize) -> String {
    let mut result = format.to_string();
    for index in (0..count).rev() {
        result = result
            .replace(&format!("{{{}}}", index), &format!("{{f{}}}", index))
            .replace(&format!("{{{}:", index), &format!("{{f{}:", index));
    }
    result
}

/// Reads the string literal of the `#[error("...")]` attribute.
fn message<T: ToTokens>(attrs: &[syn::Attribute], target: &T) -> syn::Result<String> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("error")) else {
        return Err(syn::Error::new_spanned(
            target,
            "missing #[error(\"...\")] attribute; every error variant needs a message",
        ));
    };
    let Meta::List(list) = &attr.meta else {
        return Err(syn::Error::new_spanned(
            &attr.meta,
            "expected #[error(\"message\")]",
        ));
    };
    match syn::parse2::<Lit>(list.tokens.clone()) {
        Ok(Lit::Str(text)) => Ok(text.value()),
        _ => Err(syn::Error::new_spanned(
            &attr.meta,
            "#[error] takes a single string literal, e.g. #[error(\"end of stream\")]",
        )),
    }
}
