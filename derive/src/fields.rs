use alloc::{string::ToString, vec::Vec};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;

pub fn impl_fields(ast: &syn::DeriveInput) -> TokenStream {
    let body = if let syn::Data::Struct(s) = &ast.data {
        s
    } else {
        panic!("#[derive(Fields)] is only defined for structs.");
    };

    let mut names = Vec::new();
    let mut types = Vec::new();
    let mut accessors = Vec::new();
    let mut bindings = Vec::new();
    for (index, field) in body.fields.iter().enumerate() {
        types.push(&field.ty);
        bindings.push(format_ident!("field_{}", index));
        if let Some(ident) = &field.ident {
            names.push(ident.unraw().to_string());
            accessors.push(quote! { #ident });
        } else {
            names.push(index.to_string());
            let index = syn::Index::from(index);
            accessors.push(quote! { #index });
        }
    }

    let construct = match &body.fields {
        syn::Fields::Named(_) => quote! { Self { #(#accessors: #bindings),* } },
        syn::Fields::Unnamed(_) => quote! { Self(#(#bindings),*) },
        syn::Fields::Unit => quote! { Self },
    };

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let impl_block = quote! {
        impl #impl_generics umi_serializers::Fields for #name #ty_generics #where_clause {
            type Tuple = (#(#types,)*);

            const NAMES: &'static [&'static str] = &[#(#names),*];

            fn to_fields(&self) -> Self::Tuple {
                (#(::core::clone::Clone::clone(&self.#accessors),)*)
            }

            fn from_fields((#(#bindings,)*): Self::Tuple) -> Self {
                #construct
            }
        }
    };

    quote! {
        const _: () = {
            extern crate umi_serializers;
            #impl_block
        };
    }
}
