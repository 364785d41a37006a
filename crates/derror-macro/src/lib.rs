// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use darling::FromDeriveInput;
use proc_macro2::Literal;
use proc_macro2::TokenStream;
use quote::quote;
use std::ffi::CString;
use syn::DeriveInput;
use syn::parse_macro_input;

#[derive(FromDeriveInput)]
#[darling(attributes(derror))]
struct Args {
    leaf_data: Option<syn::Path>,
}

/// Generate a `DError` implementation for a tree-structured enum of
/// drop reasons.
///
/// ```ignore
/// #[derive(DError)]
/// enum DropReason {
///     Truncated(ReadErr),
///     Inconsistent,
/// }
///
/// #[derive(DError)]
/// #[derror(leaf_data = ReadErr::data)]
/// enum ReadErr {
///     NotEnoughBytes { needed: usize, available: usize },
///     OutOfRange,
/// }
///
/// impl ReadErr {
///     fn data(&self, data: &mut [u64]) {
///         if let Self::NotEnoughBytes { needed, available } = self {
///             [data[0], data[1]] = [*needed as u64, *available as u64];
///         }
///     }
/// }
/// ```
///
/// Every variant is named by a `c"..."` literal of its identifier.
/// Single-field tuple variants are followed as the next error in the
/// chain unless marked `#[leaf]`; all other variants end the chain.
/// `leaf_data` names a function filling the two data words of an
/// `ErrorBlock`.
///
/// `DError` must be in scope where the derive is used.
#[proc_macro_derive(DError, attributes(derror, leaf))]
pub fn derive_derror(
    input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let derive_input = parse_macro_input!(input as DeriveInput);

    let parsed_args = match Args::from_derive_input(&derive_input) {
        Ok(o) => o,
        Err(e) => return e.write_errors().into(),
    };

    let DeriveInput { ident, data, .. } = derive_input;

    let syn::Data::Enum(data) = data else {
        return syn::Error::new_spanned(
            &ident,
            "`DError` can only be derived for an enum",
        )
        .to_compile_error()
        .into();
    };

    let mut name_arms: Vec<TokenStream> = vec![];
    let mut child_arms: Vec<TokenStream> = vec![];

    for variant in data.variants {
        let var_name = variant.ident;
        let name = match CString::new(var_name.to_string()) {
            Ok(name) => Literal::c_string(&name),
            Err(_) => {
                return syn::Error::new_spanned(
                    &var_name,
                    "variant name contains a NUL byte",
                )
                .to_compile_error()
                .into();
            }
        };

        let known_leaf =
            variant.attrs.iter().any(|v| v.path().is_ident("leaf"));

        let (name_arm, child_arm) = match variant.fields {
            syn::Fields::Unnamed(fields)
                if !known_leaf && fields.unnamed.len() == 1 =>
            {
                (
                    quote! { Self::#var_name(..) => #name, },
                    quote! { Self::#var_name(err) => Some(err), },
                )
            }
            syn::Fields::Unnamed(_) => (
                quote! { Self::#var_name(..) => #name, },
                quote! { Self::#var_name(..) => None, },
            ),
            syn::Fields::Named(_) => (
                quote! { Self::#var_name { .. } => #name, },
                quote! { Self::#var_name { .. } => None, },
            ),
            syn::Fields::Unit => (
                quote! { Self::#var_name => #name, },
                quote! { Self::#var_name => None, },
            ),
        };

        name_arms.push(name_arm);
        child_arms.push(child_arm);
    }

    let leaf_data_impl = parsed_args.leaf_data.map(|data_fn| {
        quote! {
            fn leaf_data(&self, data: &mut [u64]) {
                #data_fn(self, data);
            }
        }
    });

    quote! {
        impl DError for #ident {
            fn discriminant(&self) -> &'static ::core::ffi::CStr {
                match self {
                    #( #name_arms )*
                }
            }

            fn child(&self) -> Option<&dyn DError> {
                match self {
                    #( #child_arms )*
                }
            }

            #leaf_data_impl
        }
    }
    .into()
}
