//! Attribute macros that attach the derive set required by `volley`'s
//! `Metric` and `Aggregate` traits.
//!
//! Both traits demand `Serialize + DeserializeOwned + PartialOrd + PartialEq + Debug + Clone`,
//! so spelling the derives out on every sample or collector type gets old fast.

use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

extern crate proc_macro;

fn common_derives(ast: &ItemStruct) -> proc_macro2::TokenStream {
    quote! {
        #[derive(
            serde::Serialize,
            serde::Deserialize,
            std::cmp::PartialOrd,
            std::cmp::PartialEq,
            std::fmt::Debug,
            std::clone::Clone
        )]
        #ast
    }
}

/// Marks a struct as a single sample produced by one attempt.
///
/// Adds the common derives and `impl Metric for T {}`. The `Metric` trait must be in scope.
#[proc_macro_attribute]
pub fn metric(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(item as ItemStruct);
    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let derived = common_derives(&ast);

    TokenStream::from(quote! {
        #derived

        impl #impl_generics Metric for #ident #ty_generics #where_clause {}
    })
}

/// Adds the common derives to an aggregate; the `Aggregate` impl stays manual.
#[proc_macro_attribute]
pub fn aggregate(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(item as ItemStruct);
    TokenStream::from(common_derives(&ast))
}
