use heck::ToPascalCase;
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use std::collections::BTreeSet;

/// Convert an error name or other wire value to a variant name
pub(super) fn value_to_variant_name(value: &str) -> String {
    let clean = value.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
    if clean.is_empty() {
        return "Unknown".to_string();
    }
    let variant = sanitize_name(&clean.replace('-', "_").to_pascal_case());

    if variant.starts_with('_') && clean.starts_with(|c: char| c.is_ascii_digit()) {
        format!("V{variant}")
    } else {
        variant
    }
}

/// Sanitize a string to be safe for identifiers and filenames
///
/// Anything outside `[A-Za-z0-9_]` becomes `_`.
pub(super) fn sanitize_name(s: &str) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if sanitized.chars().all(|c| c == '_') {
        return "unknown".to_string();
    }

    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{sanitized}")
    } else {
        sanitized
    }
}

/// Take `wanted` from `taken`, or the first free `wanted{sep}2`, `wanted{sep}3`, ...
pub(super) fn claim_name(taken: &mut BTreeSet<String>, wanted: String, sep: &str) -> String {
    let mut name = wanted.clone();
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{wanted}{sep}{n}");
        n += 1;
    }
    taken.insert(name.clone());
    name
}

/// Create an identifier, using a raw identifier for keywords
pub(super) fn make_ident(s: &str) -> syn::Ident {
    let sanitized = sanitize_name(s);
    match sanitized.as_str() {
        // can't be raw identifiers
        "self" | "Self" | "super" | "crate" => format_ident!("{}_", sanitized),
        _ => syn::parse_str::<syn::Ident>(&sanitized)
            .unwrap_or_else(|_| syn::Ident::new_raw(&sanitized, Span::call_site())),
    }
}

/// Doc attributes for an optional description, one per line
pub(super) fn doc_attrs(desc: Option<&str>) -> TokenStream {
    let Some(desc) = desc else {
        return quote! {};
    };
    let lines = desc.lines().map(|line| {
        let line = if line.is_empty() {
            String::new()
        } else {
            format!(" {line}")
        };
        quote! { #[doc = #line] }
    });
    quote! { #(#lines)* }
}

/// Inner doc attributes for a module
pub(super) fn inner_doc_attrs(desc: Option<&str>) -> TokenStream {
    let Some(desc) = desc else {
        return quote! {};
    };
    let lines = desc.lines().map(|line| {
        let line = format!(" {line}");
        quote! { #![doc = #line] }
    });
    quote! { #(#lines)* }
}
