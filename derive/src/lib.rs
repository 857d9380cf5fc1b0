//! Derive macros for `#[derive(Fields, ScalarEnum)]`.

#![no_std]

extern crate alloc;
extern crate proc_macro;

mod fields;
mod scalar;

use fields::*;
use proc_macro::TokenStream;
use scalar::*;

#[proc_macro_derive(Fields)]
pub fn fields(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).unwrap();
    let gen = impl_fields(&ast);
    gen.into()
}

#[proc_macro_derive(ScalarEnum)]
pub fn scalar_enum(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).unwrap();
    let gen = impl_scalar_enum(&ast);
    gen.into()
}
