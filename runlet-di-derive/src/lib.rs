mod attributes;
mod lifecycle;
mod managed;

use crate::lifecycle::expand_lifecycle;
use crate::managed::expand_managed;
use proc_macro::TokenStream;
use proc_macro2::Span;
use syn::{parse_macro_input, DeriveInput, Error, Item};

#[proc_macro_derive(Managed, attributes(managed, property))]
pub fn generate_managed(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_managed(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

#[proc_macro_attribute]
pub fn lifecycle(args: TokenStream, input: TokenStream) -> TokenStream {
    if !args.is_empty() {
        return Error::new(Span::call_site(), "Lifecycle attribute takes no arguments!")
            .into_compile_error()
            .into();
    }

    let item = parse_macro_input!(input as Item);
    expand_lifecycle(item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}
