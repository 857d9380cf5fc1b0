use alloc::{string::ToString, vec::Vec};
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;

pub fn impl_scalar_enum(ast: &syn::DeriveInput) -> TokenStream {
    let body = if let syn::Data::Enum(e) = &ast.data {
        e
    } else {
        panic!("#[derive(ScalarEnum)] is only defined for enums.");
    };

    let variants: Vec<_> = body
        .variants
        .iter()
        .map(|variant| {
            if !matches!(variant.fields, syn::Fields::Unit) {
                panic!("#[derive(ScalarEnum)] is only defined for fieldless enums.");
            }
            let ident = &variant.ident;
            let label = ident.unraw().to_string();

            quote! { (#label, Self::#ident) }
        })
        .collect();
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let impl_block = quote! {
        impl #impl_generics umi_serializers::ScalarEnum for #name #ty_generics #where_clause {
            const VARIANTS: &'static [(&'static str, Self)] = &[#(#variants),*];
        }
    };

    quote! {
        const _: () = {
            extern crate umi_serializers;
            #impl_block
        };
    }
}
