use super::utils::sanitize_name;
use crate::lexicon::{LexType, LexiconDoc};
use heck::{ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

/// Lexicon name a definition's generated names derive from: the
/// document's last segment for `main`, the definition name otherwise
pub(super) fn def_stem<'d>(doc: &'d LexiconDoc, def_name: &'d str) -> &'d str {
    if def_name == "main" {
        doc.segment()
    } else {
        def_name
    }
}

/// PascalCase stem shared by every type generated for a definition
pub(super) fn def_base_name(doc: &LexiconDoc, def_name: &str) -> String {
    sanitize_name(&def_stem(doc, def_name).to_pascal_case())
}

/// Name other definitions use to refer to this one
pub(super) fn def_type_name(doc: &LexiconDoc, def_name: &str, node: &LexType) -> String {
    let base = def_base_name(doc, def_name);
    match node {
        LexType::Record(_) => format!("{base}Record"),
        _ => base,
    }
}

pub(super) fn method_name(doc: &LexiconDoc, def_name: &str) -> String {
    sanitize_name(&def_stem(doc, def_name).to_snake_case())
}

pub(super) fn const_name(doc: &LexiconDoc, def_name: &str) -> String {
    sanitize_name(&def_stem(doc, def_name).to_shouty_snake_case())
}

pub(super) fn client_name(doc: &LexiconDoc) -> String {
    format!("{}Client", sanitize_name(&doc.segment().to_pascal_case()))
}

/// Name for a type generated inline for `field` of `owner`
pub(super) fn nested_type_name(owner: &str, field: &str, suffix: &str) -> String {
    sanitize_name(&format!("{owner}{}{suffix}", field.to_pascal_case()))
}

/// Rust field name for a property, before keyword escaping
pub(super) fn field_name(property: &str) -> String {
    let name = sanitize_name(&property.to_snake_case());
    match name.as_str() {
        // no raw form
        "self" | "super" | "crate" => format!("{name}_"),
        _ => name,
    }
}

/// Module path for a document: the first two NSID segments form the root
/// module, each remaining segment a child
///
/// `com.example.feed.getTimeline` → `com_example::feed::get_timeline`
pub fn module_path(nsid: &str) -> Vec<String> {
    let segments: Vec<&str> = nsid.split('.').collect();
    let split = segments.len().min(2);
    let mut path = vec![sanitize_name(&segments[..split].join("_").to_snake_case())];
    path.extend(
        segments[split..]
            .iter()
            .map(|segment| sanitize_name(&segment.to_snake_case())),
    );
    path
}
