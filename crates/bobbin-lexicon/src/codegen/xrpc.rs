use super::ast::{
    AliasDecl, ErrorKindDecl, ErrorVariant, InputDecl, ItemDecl, MethodDecl, MethodKind,
    OutputDecl, TypeRef,
};
use super::names;
use super::utils::{claim_name, value_to_variant_name};
use super::{CodeGenerator, DocScope};
use crate::error::Result;
use crate::lexicon::{LexType, LexXrpcBody, LexXrpcError, LexXrpcParameters};
use std::collections::BTreeSet;

/// The parts of a query, procedure or subscription the generator looks at
pub(super) struct RpcShape<'a> {
    pub kind: MethodKind,
    pub description: Option<&'a str>,
    pub parameters: Option<&'a LexXrpcParameters>,
    pub input: Option<&'a LexXrpcBody>,
    /// Output body, or the message body of a subscription
    pub output: Option<&'a LexXrpcBody>,
    pub errors: &'a [LexXrpcError],
}

impl CodeGenerator {
    /// Generate the method and supporting types for one XRPC definition
    pub(super) fn generate_rpc(
        &self,
        scope: &mut DocScope<'_>,
        def_name: &str,
        shape: RpcShape<'_>,
    ) -> Result<(Vec<ItemDecl>, MethodDecl)> {
        let base = names::def_base_name(scope.doc, def_name);
        let mut items = Vec::new();

        let params = match shape.parameters.map(LexXrpcParameters::object) {
            Some(obj) if !obj.properties.is_empty() => {
                let name = scope.claim(format!("{base}Params"));
                let decl = self.build_struct(scope, &name, obj, obj.description.clone(), &mut items)?;
                items.push(ItemDecl::Struct(decl));
                Some(name)
            }
            _ => None,
        };

        let input = match shape.input {
            None => InputDecl::None,
            Some(body) if body.is_json() => {
                let name = match self.body_type(scope, &format!("{base}Input"), body, &mut items)? {
                    Some(name) => name,
                    None => {
                        let name = scope.claim(format!("{base}Input"));
                        items.push(ItemDecl::Alias(AliasDecl {
                            name: name.clone(),
                            doc: body.description.clone(),
                            target: TypeRef::AnyObject,
                        }));
                        name
                    }
                };
                InputDecl::Json(name)
            }
            Some(body) => InputDecl::Raw {
                encoding: body.encoding.clone(),
            },
        };

        let output = match (shape.kind, shape.output) {
            (_, None) => OutputDecl::Void,
            (MethodKind::Subscription, Some(body)) => {
                self.body_type(scope, &format!("{base}Message"), body, &mut items)?;
                OutputDecl::Void
            }
            (_, Some(body)) if body.is_json() => {
                match self.body_type(scope, &format!("{base}Output"), body, &mut items)? {
                    Some(name) => OutputDecl::Json(name),
                    None => OutputDecl::Void,
                }
            }
            (_, Some(_)) => OutputDecl::Raw,
        };

        if !shape.errors.is_empty() {
            let name = scope.claim(format!("{base}ErrorKind"));
            items.push(ItemDecl::ErrorKind(self.error_kind(name, shape.errors)));
        }

        let nsid = scope.doc.def_ref(def_name);
        let mut doc = shape.description.map(str::to_string);
        if def_name != "main" {
            tracing::warn!(
                lexicon = %scope.doc.id,
                def = %def_name,
                method = %nsid,
                "XRPC definition is not `main`, XRPC servers do not route its method id"
            );
            let note = format!(
                "Sent as `{nsid}`. XRPC servers only route `main` definitions, so calls need a transport that understands the fragment."
            );
            doc = Some(match doc {
                Some(desc) => format!("{desc}\n\n{note}"),
                None => note,
            });
        }

        let method = MethodDecl {
            name: scope
                .method_name(def_name)
                .map_or_else(|| names::method_name(scope.doc, def_name), str::to_string),
            nsid,
            kind: shape.kind,
            doc,
            params,
            input,
            output,
        };
        Ok((items, method))
    }

    /// Emit the type for a body schema, claiming `wanted` as its name
    ///
    /// Object schemas become a struct, anything else an alias of the mapped
    /// type. Returns `None` when the body has no schema.
    fn body_type(
        &self,
        scope: &mut DocScope<'_>,
        wanted: &str,
        body: &LexXrpcBody,
        items: &mut Vec<ItemDecl>,
    ) -> Result<Option<String>> {
        let Some(schema) = body.schema.as_deref() else {
            return Ok(None);
        };
        let name = scope.claim(wanted.to_string());
        let doc = body
            .description
            .as_deref()
            .or(schema.description())
            .map(str::to_string);
        match schema {
            LexType::Object(obj) => {
                let decl = self.build_struct(scope, &name, obj, doc, items)?;
                items.push(ItemDecl::Struct(decl));
            }
            other => {
                let target = self.map_type(scope, other, &name, "", items)?;
                items.push(ItemDecl::Alias(AliasDecl {
                    name: name.clone(),
                    doc,
                    target,
                }));
            }
        }
        Ok(Some(name))
    }

    /// Error enum with one variant per declared error name
    fn error_kind(&self, name: String, errors: &[LexXrpcError]) -> ErrorKindDecl {
        let mut seen = BTreeSet::new();
        let variants = errors
            .iter()
            .map(|err| ErrorVariant {
                ident: claim_name(&mut seen, value_to_variant_name(&err.name), ""),
                code: err.name.clone(),
                doc: err.description.clone(),
            })
            .collect();
        ErrorKindDecl { name, variants }
    }
}
