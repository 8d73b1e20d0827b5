use super::ast::{FieldDecl, ItemDecl, StructDecl, TypeRef};
use super::names;
use super::utils::claim_name;
use super::{CodeGenerator, DocScope};
use crate::error::{LexiconError, Result};
use crate::lexicon::{LexObject, LexString, LexStringFormat, LexType};
use std::collections::BTreeSet;

impl CodeGenerator {
    /// Map a schema node in value position to a Rust type
    ///
    /// Inline objects become structs named after `owner` and `field` and are
    /// pushed onto `items`.
    pub(super) fn map_type(
        &self,
        scope: &mut DocScope<'_>,
        node: &LexType,
        owner: &str,
        field: &str,
        items: &mut Vec<ItemDecl>,
    ) -> Result<TypeRef> {
        self.map_node(scope, node, owner, field, "", items)
    }

    fn map_node(
        &self,
        scope: &mut DocScope<'_>,
        node: &LexType,
        owner: &str,
        field: &str,
        suffix: &str,
        items: &mut Vec<ItemDecl>,
    ) -> Result<TypeRef> {
        let ty = match node {
            LexType::Boolean(_) => TypeRef::Bool,
            LexType::Integer(_) => TypeRef::Integer,
            LexType::Number(_) => TypeRef::Float,
            LexType::String(s) => string_to_rust_type(s),
            LexType::Bytes(_) => TypeRef::Bytes,
            LexType::CidLink(_) => TypeRef::CidLink,
            LexType::Unknown(_) => TypeRef::Data,
            LexType::Blob(_) => TypeRef::Blob,
            LexType::Ref(r) => scope.resolve_ref(&r.r#ref),
            LexType::RefUnion(_) => TypeRef::AnyObject,
            LexType::Array(arr) => {
                if let LexType::Array(_) = &*arr.items {
                    return Err(LexiconError::unsupported(
                        scope.location(owner, field),
                        "arrays of arrays have no Rust mapping",
                    ));
                }
                TypeRef::vec(self.map_node(scope, &arr.items, owner, field, "Item", items)?)
            }
            LexType::Object(obj) if obj.properties.is_empty() => TypeRef::Data,
            LexType::Object(obj) => {
                let name = scope.claim(names::nested_type_name(owner, field, suffix));
                let decl = self.build_struct(scope, &name, obj, obj.description.clone(), items)?;
                items.push(ItemDecl::Struct(decl));
                TypeRef::Named(name)
            }
            LexType::Token(_)
            | LexType::Record(_)
            | LexType::XrpcQuery(_)
            | LexType::XrpcProcedure(_)
            | LexType::XrpcSubscription(_) => {
                return Err(LexiconError::unsupported(
                    scope.location(owner, field),
                    format!("`{}` cannot be used as a value type", node.type_name()),
                ));
            }
        };
        Ok(ty)
    }

    /// Build a struct mirroring an object schema
    pub(super) fn build_struct(
        &self,
        scope: &mut DocScope<'_>,
        name: &str,
        obj: &LexObject,
        doc: Option<String>,
        items: &mut Vec<ItemDecl>,
    ) -> Result<StructDecl> {
        let mut seen = BTreeSet::new();
        let mut fields = Vec::with_capacity(obj.properties.len());
        for (prop_name, prop) in &obj.properties {
            let ident = claim_name(&mut seen, names::field_name(prop_name), "_");
            let ty = self.map_type(scope, prop, name, prop_name, items)?;
            fields.push(FieldDecl {
                name: prop_name.clone(),
                ident,
                ty,
                required: obj.is_required(prop_name),
                nullable: obj.is_nullable(prop_name),
                doc: prop.description().map(str::to_string),
            });
        }
        Ok(StructDecl {
            name: name.to_string(),
            doc,
            fields,
            collection: None,
        })
    }
}

/// Runtime type for a string, chosen by its format
pub(super) fn string_to_rust_type(s: &LexString) -> TypeRef {
    match s.format {
        None => TypeRef::String,
        Some(LexStringFormat::Datetime) => TypeRef::Datetime,
        Some(LexStringFormat::Cid) => TypeRef::Cid,
        Some(LexStringFormat::Did) => TypeRef::Did,
        Some(LexStringFormat::Handle) => TypeRef::Handle,
        Some(LexStringFormat::AtUri) => TypeRef::AtUri,
        Some(LexStringFormat::Nsid) => TypeRef::Nsid,
        Some(LexStringFormat::Language) => TypeRef::Language,
        Some(LexStringFormat::Uri | LexStringFormat::UriReference) => TypeRef::Uri,
        Some(LexStringFormat::Ipv4 | LexStringFormat::Ipv6) => TypeRef::IpAddr,
        Some(
            LexStringFormat::UriTemplate
            | LexStringFormat::Email
            | LexStringFormat::Hostname
            | LexStringFormat::AtIdentifier
            | LexStringFormat::Tid
            | LexStringFormat::RecordKey,
        ) => TypeRef::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_formats() {
        let with = |format| LexString {
            format: Some(format),
            ..Default::default()
        };
        assert_eq!(string_to_rust_type(&LexString::default()), TypeRef::String);
        let expected = [
            (LexStringFormat::Datetime, TypeRef::Datetime),
            (LexStringFormat::Cid, TypeRef::Cid),
            (LexStringFormat::Did, TypeRef::Did),
            (LexStringFormat::Handle, TypeRef::Handle),
            (LexStringFormat::AtUri, TypeRef::AtUri),
            (LexStringFormat::Nsid, TypeRef::Nsid),
            (LexStringFormat::Language, TypeRef::Language),
            (LexStringFormat::Uri, TypeRef::Uri),
            (LexStringFormat::UriReference, TypeRef::Uri),
            (LexStringFormat::UriTemplate, TypeRef::String),
            (LexStringFormat::Email, TypeRef::String),
            (LexStringFormat::Hostname, TypeRef::String),
            (LexStringFormat::Ipv4, TypeRef::IpAddr),
            (LexStringFormat::Ipv6, TypeRef::IpAddr),
        ];
        for (format, ty) in expected {
            assert_eq!(string_to_rust_type(&with(format)), ty, "{format:?}");
        }
    }
}
