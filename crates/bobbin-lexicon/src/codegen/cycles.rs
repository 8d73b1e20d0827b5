//! Breaking reference cycles between generated types
//!
//! Definitions refer to each other by name, so the reference graph can
//! contain cycles. Two kinds would not compile as Rust:
//!
//! - aliases that reach themselves through other aliases
//!   (`type A = B; type B = Vec<A>;`), which become the generic object type;
//! - structs that contain themselves by value, where every by-value field
//!   that leads back to its own struct is boxed.
//!
//! Both walks keep an explicit set of names already in progress.

use super::ast::{GeneratedArtifact, ItemDecl, TypeRef};
use smol_str::SmolStr;
use std::collections::{BTreeMap, BTreeSet};

pub(super) fn break_cycles(artifacts: &mut BTreeMap<SmolStr, GeneratedArtifact>) {
    let aliases = break_alias_cycles(artifacts);
    box_recursive_fields(artifacts, &aliases);
}

fn items_mut(
    artifacts: &mut BTreeMap<SmolStr, GeneratedArtifact>,
) -> impl Iterator<Item = &mut ItemDecl> {
    artifacts.values_mut().flat_map(|a| a.items.iter_mut())
}

/// Rewrite self-reaching aliases, returning the final alias targets
fn break_alias_cycles(
    artifacts: &mut BTreeMap<SmolStr, GeneratedArtifact>,
) -> BTreeMap<String, TypeRef> {
    let mut aliases: BTreeMap<String, TypeRef> = artifacts
        .values()
        .flat_map(|a| &a.items)
        .filter_map(|item| match item {
            ItemDecl::Alias(alias) => Some((alias.name.clone(), alias.target.clone())),
            _ => None,
        })
        .collect();

    let cyclic: BTreeSet<String> = aliases
        .iter()
        .filter(|(name, target)| alias_reaches(name, target, &aliases, &mut BTreeSet::new()))
        .map(|(name, _)| name.clone())
        .collect();
    if cyclic.is_empty() {
        return aliases;
    }

    for item in items_mut(artifacts) {
        if let ItemDecl::Alias(alias) = item {
            if cyclic.contains(&alias.name) {
                tracing::debug!(alias = %alias.name, "alias cycle replaced with a generic object");
                alias.target = TypeRef::AnyObject;
            }
        }
    }
    for name in &cyclic {
        aliases.insert(name.clone(), TypeRef::AnyObject);
    }
    aliases
}

fn alias_reaches(
    start: &str,
    ty: &TypeRef,
    aliases: &BTreeMap<String, TypeRef>,
    in_progress: &mut BTreeSet<String>,
) -> bool {
    ty.named_types().into_iter().any(|name| {
        if name == start {
            return true;
        }
        match aliases.get(name) {
            Some(target) if in_progress.insert(name.to_string()) => {
                alias_reaches(start, target, aliases, in_progress)
            }
            _ => false,
        }
    })
}

/// Structs a value of `ty` contains inline, looking through aliases
fn by_value_structs(
    ty: &TypeRef,
    aliases: &BTreeMap<String, TypeRef>,
    in_progress: &mut BTreeSet<String>,
) -> Vec<String> {
    match ty {
        TypeRef::Named(name) => match aliases.get(name) {
            Some(target) if in_progress.insert(name.clone()) => {
                by_value_structs(target, aliases, in_progress)
            }
            Some(_) => Vec::new(),
            None => vec![name.clone()],
        },
        // Vec and Box already add indirection
        _ => Vec::new(),
    }
}

fn box_recursive_fields(
    artifacts: &mut BTreeMap<SmolStr, GeneratedArtifact>,
    aliases: &BTreeMap<String, TypeRef>,
) {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for item in artifacts.values().flat_map(|a| &a.items) {
        if let ItemDecl::Struct(decl) = item {
            let edges = graph.entry(decl.name.clone()).or_default();
            for field in &decl.fields {
                edges.extend(by_value_structs(&field.ty, aliases, &mut BTreeSet::new()));
            }
        }
    }

    for item in items_mut(artifacts) {
        let ItemDecl::Struct(decl) = item else {
            continue;
        };
        for field in &mut decl.fields {
            let leads_back = by_value_structs(&field.ty, aliases, &mut BTreeSet::new())
                .iter()
                .any(|target| reaches(target, &decl.name, &graph, &mut BTreeSet::new()));
            if leads_back {
                tracing::debug!(
                    ty = %decl.name,
                    field = %field.name,
                    "boxing recursive field"
                );
                field.ty = TypeRef::Boxed(Box::new(field.ty.clone()));
            }
        }
    }
}

fn reaches(
    from: &str,
    to: &str,
    graph: &BTreeMap<String, BTreeSet<String>>,
    in_progress: &mut BTreeSet<String>,
) -> bool {
    if from == to {
        return true;
    }
    if !in_progress.insert(from.to_string()) {
        return false;
    }
    graph
        .get(from)
        .is_some_and(|next| next.iter().any(|n| reaches(n, to, graph, in_progress)))
}

#[cfg(test)]
mod tests {
    use crate::codegen::CodeGenerator;
    use crate::codegen::ast::{GeneratedArtifact, ItemDecl, TypeRef};
    use crate::parser::parse_str;
    use smol_str::SmolStr;
    use std::collections::BTreeMap;

    fn generate(defs: &str) -> BTreeMap<SmolStr, GeneratedArtifact> {
        let doc = parse_str(&format!(
            r#"{{"lexicon": 1, "id": "com.example.graph", "defs": {defs}}}"#
        ))
        .unwrap();
        CodeGenerator::default().generate(&doc).unwrap()
    }

    fn field_ty(artifacts: &BTreeMap<SmolStr, GeneratedArtifact>, def: &str, ty: &str, field: &str) -> TypeRef {
        artifacts[def]
            .struct_decl(ty)
            .and_then(|s| s.field(field))
            .map(|f| f.ty.clone())
            .unwrap_or_else(|| panic!("missing {ty}.{field}"))
    }

    #[test]
    fn mutual_refs_are_boxed() {
        let artifacts = generate(
            r##"{
                "nodeA": {"type": "object", "properties": {"b": {"type": "ref", "ref": "#nodeB"}}},
                "nodeB": {"type": "object", "properties": {
                    "a": {"type": "ref", "ref": "#nodeA"},
                    "many": {"type": "array", "items": {"type": "ref", "ref": "#nodeA"}},
                    "leaf": {"type": "ref", "ref": "#leaf"}}},
                "leaf": {"type": "object", "properties": {"n": {"type": "integer"}}}
            }"##,
        );
        let boxed = |name: &str| TypeRef::Boxed(Box::new(TypeRef::named(name)));
        assert_eq!(field_ty(&artifacts, "nodeA", "NodeA", "b"), boxed("NodeB"));
        assert_eq!(field_ty(&artifacts, "nodeB", "NodeB", "a"), boxed("NodeA"));
        assert_eq!(
            field_ty(&artifacts, "nodeB", "NodeB", "many"),
            TypeRef::vec(TypeRef::named("NodeA"))
        );
        assert_eq!(field_ty(&artifacts, "nodeB", "NodeB", "leaf"), TypeRef::named("Leaf"));
    }

    #[test]
    fn self_reference_is_boxed() {
        let artifacts = generate(
            r##"{"main": {"type": "object", "properties": {"parent": {"type": "ref", "ref": "#main"}}}}"##,
        );
        assert_eq!(
            field_ty(&artifacts, "main", "Graph", "parent"),
            TypeRef::Boxed(Box::new(TypeRef::named("Graph")))
        );
    }

    #[test]
    fn refs_through_aliases_are_followed() {
        let artifacts = generate(
            r##"{
                "node": {"type": "object", "properties": {"next": {"type": "ref", "ref": "#link"}}},
                "link": {"type": "ref", "ref": "#node"}
            }"##,
        );
        assert_eq!(
            field_ty(&artifacts, "node", "Node", "next"),
            TypeRef::Boxed(Box::new(TypeRef::named("Link")))
        );
    }

    #[test]
    fn alias_cycles_become_generic_objects() {
        let artifacts = generate(
            r##"{
                "loopA": {"type": "ref", "ref": "#loopB"},
                "loopB": {"type": "array", "items": {"type": "ref", "ref": "#loopA"}},
                "outside": {"type": "ref", "ref": "#loopA"}
            }"##,
        );
        let target = |def: &str, name: &str| match artifacts[def].item(name) {
            Some(ItemDecl::Alias(alias)) => alias.target.clone(),
            other => panic!("not an alias: {other:?}"),
        };
        assert_eq!(target("loopA", "LoopA"), TypeRef::AnyObject);
        assert_eq!(target("loopB", "LoopB"), TypeRef::AnyObject);
        assert_eq!(target("outside", "Outside"), TypeRef::named("LoopA"));
    }
}
