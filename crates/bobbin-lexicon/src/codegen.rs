//! Rust code generation from Lexicon documents
//!
//! Generation runs in two phases. [`CodeGenerator::generate`] walks a
//! validated document and produces declarations ([`ast`]): structs, aliases,
//! constants, error enums and client methods, with every name already
//! decided. The render backend then turns a [`ast::ModuleDecl`] into tokens
//! and formats them with `prettyplease`; [`output`] arranges modules into a
//! tree for a whole corpus.

pub mod ast;
mod cycles;
mod names;
pub mod output;
mod render;
mod types;
mod utils;
mod xrpc;

use crate::error::Result;
use crate::lexicon::{LexType, LexiconDoc};
use ast::{
    AliasDecl, ArtifactKind, ClientDecl, CollectionDecl, ConstDecl, GeneratedArtifact, ItemDecl,
    MethodKind, ModuleDecl, TypeRef,
};
use smol_str::SmolStr;
use std::collections::{BTreeMap, BTreeSet};
use utils::claim_name;
use xrpc::RpcShape;

pub use names::module_path;

/// Settings for generated code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Path of the runtime crate generated code refers to
    pub runtime_crate: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime_crate: "::bobbin_common".to_string(),
        }
    }
}

/// Code generator for Lexicon documents
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    config: GeneratorConfig,
}

/// One document being generated, with the lookups references need
///
/// Every Rust name the document generates is handed out here, so no two
/// items share a name: a later claim on a taken name gets a numeric suffix.
pub(crate) struct DocScope<'d> {
    pub doc: &'d LexiconDoc,
    /// Item name of every data definition and token
    def_names: BTreeMap<&'d str, String>,
    /// Client method of every XRPC definition that keeps one
    methods: BTreeMap<&'d str, String>,
    taken: BTreeSet<String>,
}

impl<'d> DocScope<'d> {
    fn new(doc: &'d LexiconDoc) -> Self {
        let mut scope = Self {
            doc,
            def_names: BTreeMap::new(),
            methods: BTreeMap::new(),
            taken: BTreeSet::new(),
        };
        // `main` first, so it keeps the plain names
        let defs: Vec<_> = doc
            .defs
            .get_key_value("main")
            .into_iter()
            .chain(doc.defs.iter().filter(|(name, _)| *name != "main"))
            .collect();

        if defs.iter().any(|(_, node)| node.is_rpc()) {
            scope.claim(names::client_name(doc));
        }
        let mut method_idents: BTreeSet<String> =
            ["new", "transport"].map(String::from).into();
        let mut stems: BTreeMap<&str, &str> = BTreeMap::new();
        for (def_name, node) in defs {
            let def_name = def_name.as_str();
            if node.is_rpc() {
                let stem = names::def_stem(doc, def_name);
                if let Some(kept) = stems.get(stem) {
                    tracing::warn!(
                        lexicon = %doc.id,
                        def = %def_name,
                        kept = %kept,
                        "definitions map to the same client method, keeping the first"
                    );
                    continue;
                }
                stems.insert(stem, def_name);
                let method = claim_name(&mut method_idents, names::method_name(doc, def_name), "_");
                scope.methods.insert(def_name, method);
                continue;
            }
            let wanted = match node {
                LexType::Token(_) => names::const_name(doc, def_name),
                _ => names::def_type_name(doc, def_name, node),
            };
            let name = scope.claim(wanted);
            scope.def_names.insert(def_name, name);
        }
        scope
    }

    /// Reserve a name for a generated item
    pub fn claim(&mut self, wanted: String) -> String {
        claim_name(&mut self.taken, wanted, "")
    }

    /// Item name of a data definition or token
    pub fn def_name(&self, def_name: &str, node: &LexType) -> String {
        self.def_names.get(def_name).cloned().unwrap_or_else(|| match node {
            LexType::Token(_) => names::const_name(self.doc, def_name),
            _ => names::def_type_name(self.doc, def_name, node),
        })
    }

    /// Client method of an XRPC definition, `None` when it collapsed into
    /// another definition with the same method id
    pub fn method_name(&self, def_name: &str) -> Option<&str> {
        self.methods.get(def_name).map(String::as_str)
    }

    /// Rust type a reference maps to inside this document
    ///
    /// Only references into the same document resolve to a generated name;
    /// everything else is a generic object.
    pub fn resolve_ref(&self, reference: &str) -> TypeRef {
        let target = self
            .doc
            .local_target(reference)
            .and_then(|name| Some((name, self.doc.def(name)?)));
        match target {
            Some((_, LexType::Token(_))) => TypeRef::String,
            Some((_, node)) if node.is_rpc() => TypeRef::AnyObject,
            Some((name, node)) => TypeRef::Named(self.def_name(name, node)),
            None => TypeRef::AnyObject,
        }
    }

    /// Location string for errors about a field of a generated type
    pub fn location(&self, owner: &str, field: &str) -> String {
        if field.is_empty() {
            format!("{} ({owner})", self.doc.id)
        } else {
            format!("{} ({owner}.{field})", self.doc.id)
        }
    }
}

impl CodeGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate declarations for every definition of a document
    ///
    /// XRPC definitions with the same method id (the document's `main` and a
    /// definition named after the document) collapse into `main`; the other
    /// produces no artifact. Names that would clash get a numeric suffix.
    pub fn generate(&self, doc: &LexiconDoc) -> Result<BTreeMap<SmolStr, GeneratedArtifact>> {
        let mut scope = DocScope::new(doc);
        let mut artifacts = BTreeMap::new();

        for (def_name, node) in &doc.defs {
            if node.is_rpc() && scope.method_name(def_name).is_none() {
                continue;
            }
            let artifact = self.generate_def(&mut scope, def_name, node)?;
            artifacts.insert(def_name.clone(), artifact);
        }

        cycles::break_cycles(&mut artifacts);
        tracing::debug!(lexicon = %doc.id, artifacts = artifacts.len(), "generated lexicon");
        Ok(artifacts)
    }

    fn generate_def(
        &self,
        scope: &mut DocScope<'_>,
        def_name: &str,
        node: &LexType,
    ) -> Result<GeneratedArtifact> {
        let doc = scope.doc;
        let description = node.description().map(str::to_string);
        let mut items = Vec::new();
        let mut method = None;

        let kind = match node {
            LexType::XrpcQuery(q) => {
                let shape = RpcShape {
                    kind: MethodKind::Query,
                    description: q.description.as_deref(),
                    parameters: q.parameters.as_ref(),
                    input: None,
                    output: q.output.as_ref(),
                    errors: &q.errors,
                };
                let (rpc_items, rpc_method) = self.generate_rpc(scope, def_name, shape)?;
                items = rpc_items;
                method = Some(rpc_method);
                ArtifactKind::Query
            }
            LexType::XrpcProcedure(p) => {
                let shape = RpcShape {
                    kind: MethodKind::Procedure,
                    description: p.description.as_deref(),
                    parameters: p.parameters.as_ref(),
                    input: p.input.as_ref(),
                    output: p.output.as_ref(),
                    errors: &p.errors,
                };
                let (rpc_items, rpc_method) = self.generate_rpc(scope, def_name, shape)?;
                items = rpc_items;
                method = Some(rpc_method);
                ArtifactKind::Procedure
            }
            LexType::XrpcSubscription(s) => {
                let shape = RpcShape {
                    kind: MethodKind::Subscription,
                    description: s.description.as_deref(),
                    parameters: s.parameters.as_ref(),
                    input: None,
                    output: s.message.as_ref(),
                    errors: &s.errors,
                };
                let (rpc_items, rpc_method) = self.generate_rpc(scope, def_name, shape)?;
                items = rpc_items;
                method = Some(rpc_method);
                ArtifactKind::Subscription
            }
            LexType::Record(rec) => {
                let name = scope.def_name(def_name, node);
                let mut decl =
                    self.build_struct(scope, &name, rec.record.object(), description, &mut items)?;
                decl.collection = Some(CollectionDecl {
                    nsid: doc.def_ref(def_name),
                    key: rec.key.clone(),
                });
                items.push(ItemDecl::Struct(decl));
                ArtifactKind::Record
            }
            LexType::Token(_) => {
                items.push(ItemDecl::Const(ConstDecl {
                    name: scope.def_name(def_name, node),
                    doc: description,
                    value: doc.def_ref(def_name),
                }));
                ArtifactKind::Token
            }
            LexType::Object(obj) => {
                let name = scope.def_name(def_name, node);
                let decl = self.build_struct(scope, &name, obj, description, &mut items)?;
                items.push(ItemDecl::Struct(decl));
                ArtifactKind::Object
            }
            other => {
                let name = scope.def_name(def_name, node);
                let target = self.map_type(scope, other, &name, "", &mut items)?;
                items.push(ItemDecl::Alias(AliasDecl {
                    name,
                    doc: description,
                    target,
                }));
                ArtifactKind::Alias
            }
        };

        Ok(GeneratedArtifact {
            def_name: SmolStr::new(def_name),
            kind,
            items,
            method,
        })
    }

    /// Generate a document and gather the result into one module
    pub fn build_module(&self, doc: &LexiconDoc) -> Result<ModuleDecl> {
        let artifacts = self.generate(doc)?;
        let mut items = Vec::new();
        let mut methods = Vec::new();
        for artifact in artifacts.into_values() {
            items.extend(artifact.items);
            methods.extend(artifact.method);
        }
        let client = (!methods.is_empty()).then(|| ClientDecl {
            name: names::client_name(doc),
            doc: Some(format!("Client for the XRPC methods of `{}`.", doc.id)),
            methods,
        });
        Ok(ModuleDecl {
            nsid: doc.id.to_string(),
            doc: doc.description.clone(),
            client,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ast::{FieldDecl, InputDecl, OutputDecl, StructDecl};
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::parse_str;

    fn generate(text: &str) -> BTreeMap<SmolStr, GeneratedArtifact> {
        CodeGenerator::default()
            .generate(&parse_str(text).unwrap())
            .unwrap()
    }

    fn field<'a>(decl: &'a StructDecl, name: &str) -> &'a FieldDecl {
        decl.field(name)
            .unwrap_or_else(|| panic!("no field {name} on {}", decl.name))
    }

    #[test]
    fn query_without_schema_returns_void() {
        let artifacts = generate(
            r#"{"lexicon": 1, "id": "com.example.simpleQuery", "defs": {
                "main": {"type": "query", "description": "A simple query",
                         "output": {"encoding": "application/json"}}
            }}"#,
        );
        let main = &artifacts["main"];
        assert_eq!(main.kind, ArtifactKind::Query);
        assert!(main.items.is_empty());
        let method = main.method.as_ref().unwrap();
        assert_eq!(method.name, "simple_query");
        assert_eq!(method.nsid, "com.example.simpleQuery");
        assert_eq!(method.doc.as_deref(), Some("A simple query"));
        assert_eq!(method.params, None);
        assert_eq!(method.output, OutputDecl::Void);
    }

    #[test]
    fn parameters_and_output_aggregates() {
        let artifacts = generate(
            r#"{"lexicon": 1, "id": "com.example.getFeed", "defs": {
                "main": {"type": "query",
                    "parameters": {"type": "params", "required": ["feed"], "properties": {
                        "feed": {"type": "string", "format": "at-uri"},
                        "limit": {"type": "integer"}}},
                    "output": {"encoding": "application/json", "schema": {
                        "type": "object", "required": ["feed"], "properties": {
                            "cursor": {"type": "string"},
                            "feed": {"type": "array", "items": {"type": "object", "properties": {
                                "post": {"type": "string", "format": "at-uri"}}}}}}}}
            }}"#,
        );
        let main = &artifacts["main"];
        let params = main.struct_decl("GetFeedParams").unwrap();
        assert_eq!(field(params, "feed").ty, TypeRef::AtUri);
        assert!(field(params, "feed").required);
        assert_eq!(field(params, "limit").ty, TypeRef::Integer);
        assert!(!field(params, "limit").required);

        let output = main.struct_decl("GetFeedOutput").unwrap();
        assert_eq!(
            field(output, "feed").ty,
            TypeRef::vec(TypeRef::named("GetFeedOutputFeedItem"))
        );
        assert!(main.struct_decl("GetFeedOutputFeedItem").is_some());

        let method = main.method.as_ref().unwrap();
        assert_eq!(method.params.as_deref(), Some("GetFeedParams"));
        assert_eq!(method.output, OutputDecl::Json("GetFeedOutput".into()));
    }

    #[test]
    fn procedure_inputs() {
        let artifacts = generate(
            r#"{"lexicon": 1, "id": "com.example.createPost", "defs": {
                "main": {"type": "procedure",
                    "input": {"encoding": "application/json", "schema": {
                        "type": "object", "required": ["message"],
                        "properties": {"message": {"type": "string"}}}}}
            }}"#,
        );
        let main = &artifacts["main"];
        let input = main.struct_decl("CreatePostInput").unwrap();
        assert_eq!(input.fields.len(), 1);
        let message = field(input, "message");
        assert_eq!(message.ty, TypeRef::String);
        assert!(!message.is_option());
        assert_eq!(
            main.method.as_ref().unwrap().input,
            InputDecl::Json("CreatePostInput".into())
        );

        let upload = generate(
            r#"{"lexicon": 1, "id": "com.example.uploadBlob", "defs": {
                "main": {"type": "procedure", "input": {"encoding": "*/*"},
                    "output": {"encoding": "application/json", "schema": {
                        "type": "object", "required": ["blob"],
                        "properties": {"blob": {"type": "blob"}}}}}
            }}"#,
        );
        let method = upload["main"].method.as_ref().unwrap();
        assert_eq!(method.input, InputDecl::Raw { encoding: "*/*".into() });
        let output = upload["main"].struct_decl("UploadBlobOutput").unwrap();
        assert_eq!(field(output, "blob").ty, TypeRef::Blob);
    }

    #[test]
    fn duplicate_methods_collapse() {
        let artifacts = generate(
            r#"{"lexicon": 1, "id": "com.example.queryMethod", "defs": {
                "main": {"type": "query", "description": "first"},
                "queryMethod": {"type": "query", "description": "second"}
            }}"#,
        );
        let methods: Vec<_> = artifacts
            .values()
            .filter_map(|a| a.method.as_ref())
            .collect();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "query_method");
        assert_eq!(methods[0].doc.as_deref(), Some("first"));
    }

    #[test]
    fn records_tokens_and_aliases() {
        let artifacts = generate(
            r##"{"lexicon": 1, "id": "com.example.post", "defs": {
                "main": {"type": "record", "key": "tid", "description": "A post.",
                    "record": {"type": "object", "required": ["text"], "properties": {
                        "text": {"type": "string"},
                        "reply": {"type": "object", "properties": {
                            "parent": {"type": "string", "format": "at-uri"}}},
                        "label": {"type": "ref", "ref": "#label"},
                        "embed": {"type": "union", "refs": ["#label", "com.other.embed"]},
                        "mood": {"type": "ref", "ref": "#happy"},
                        "meta": {"type": "unknown"},
                        "addr": {"type": "string", "format": "ipv4"}}}},
                "label": {"type": "string", "maxLength": 64},
                "happy": {"type": "token", "description": "Happy."}
            }}"##,
        );
        let record = artifacts["main"].struct_decl("PostRecord").unwrap();
        assert_eq!(record.doc.as_deref(), Some("A post."));
        assert_eq!(
            record.collection,
            Some(CollectionDecl {
                nsid: "com.example.post".into(),
                key: "tid".into()
            })
        );
        assert_eq!(field(record, "reply").ty, TypeRef::named("PostRecordReply"));
        assert_eq!(field(record, "label").ty, TypeRef::named("Label"));
        assert_eq!(field(record, "embed").ty, TypeRef::AnyObject);
        assert_eq!(field(record, "mood").ty, TypeRef::String);
        assert_eq!(field(record, "meta").ty, TypeRef::Data);
        assert_eq!(field(record, "addr").ty, TypeRef::IpAddr);
        assert!(artifacts["main"].method.is_none());

        assert_eq!(
            artifacts["label"].item("Label"),
            Some(&ItemDecl::Alias(AliasDecl {
                name: "Label".into(),
                doc: None,
                target: TypeRef::String,
            }))
        );
        assert_eq!(
            artifacts["happy"].item("HAPPY"),
            Some(&ItemDecl::Const(ConstDecl {
                name: "HAPPY".into(),
                doc: Some("Happy.".into()),
                value: "com.example.post#happy".into(),
            }))
        );
    }

    #[test]
    fn errors_become_an_enum() {
        let artifacts = generate(
            r#"{"lexicon": 1, "id": "com.example.getThing", "defs": {
                "main": {"type": "query", "errors": [
                    {"name": "NotFound", "description": "No such thing."},
                    {"name": "rate-limited"}]}
            }}"#,
        );
        let Some(ItemDecl::ErrorKind(kind)) = artifacts["main"].item("GetThingErrorKind") else {
            panic!("no error enum")
        };
        let idents: Vec<_> = kind.variants.iter().map(|v| v.ident.as_str()).collect();
        assert_eq!(idents, ["NotFound", "RateLimited"]);
        assert_eq!(kind.variants[1].code, "rate-limited");
    }

    #[test]
    fn clashing_names_get_suffixes() {
        let artifacts = generate(
            r##"{"lexicon": 1, "id": "com.example.getThing", "defs": {
                "main": {"type": "query", "output": {"encoding": "application/json",
                    "schema": {"type": "object", "properties": {
                        "view": {"type": "ref", "ref": "#getThingOutput"}}}}},
                "getThingOutput": {"type": "object", "properties": {"a": {"type": "string"}}}
            }}"##,
        );
        // the definition keeps the name references resolve to
        let def = artifacts["getThingOutput"].struct_decl("GetThingOutput").unwrap();
        assert_eq!(field(def, "a").ty, TypeRef::String);
        let output = artifacts["main"].struct_decl("GetThingOutput2").unwrap();
        assert_eq!(field(output, "view").ty, TypeRef::named("GetThingOutput"));
        assert_eq!(
            artifacts["main"].method.as_ref().unwrap().output,
            OutputDecl::Json("GetThingOutput2".into())
        );

        let label = generate(
            r#"{"lexicon": 1, "id": "com.example.label", "defs": {
                "main": {"type": "object", "properties": {"val": {"type": "string"}}},
                "label": {"type": "string"}
            }}"#,
        );
        assert!(label["main"].struct_decl("Label").is_some());
        assert!(label["label"].item("Label2").is_some());
    }

    #[test]
    fn clashing_fields_and_variants_get_suffixes() {
        let artifacts = generate(
            r#"{"lexicon": 1, "id": "com.example.getThing", "defs": {
                "main": {"type": "query",
                    "parameters": {"type": "params", "properties": {
                        "fooBar": {"type": "string"}, "foo_bar": {"type": "integer"}}},
                    "errors": [{"name": "NotFound"}, {"name": "not-found"}]}
            }}"#,
        );
        let params = artifacts["main"].struct_decl("GetThingParams").unwrap();
        assert_eq!(field(params, "fooBar").ident, "foo_bar");
        assert_eq!(field(params, "fooBar").ty, TypeRef::String);
        assert_eq!(field(params, "foo_bar").ident, "foo_bar_2");
        assert_eq!(field(params, "foo_bar").ty, TypeRef::Integer);

        let Some(ItemDecl::ErrorKind(kind)) = artifacts["main"].item("GetThingErrorKind") else {
            panic!("no error enum")
        };
        let idents: Vec<_> = kind.variants.iter().map(|v| v.ident.as_str()).collect();
        assert_eq!(idents, ["NotFound", "NotFound2"]);
    }

    #[test]
    fn methods_with_distinct_ids_are_kept_apart() {
        let artifacts = generate(
            r#"{"lexicon": 1, "id": "com.example.multi", "defs": {
                "getFoo": {"type": "query"},
                "get_foo": {"type": "query"},
                "new": {"type": "query"}
            }}"#,
        );
        let method = |def: &str| artifacts[def].method.as_ref().unwrap();
        assert_eq!(method("getFoo").name, "get_foo");
        assert_eq!(method("get_foo").name, "get_foo_2");
        assert_eq!(method("get_foo").nsid, "com.example.multi#get_foo");
        // clear of the client's own constructor
        assert_eq!(method("new").name, "new_2");
        assert!(method("getFoo").doc.as_deref().unwrap().contains("`com.example.multi#getFoo`"));
    }

    #[test]
    fn subscriptions_keep_their_message_type() {
        let artifacts = generate(
            r#"{"lexicon": 1, "id": "com.example.subscribeEvents", "defs": {
                "main": {"type": "subscription",
                    "parameters": {"type": "params", "properties": {"cursor": {"type": "integer"}}},
                    "message": {"schema": {"type": "object", "properties": {
                        "seq": {"type": "integer"}}}}}
            }}"#,
        );
        let main = &artifacts["main"];
        assert_eq!(main.kind, ArtifactKind::Subscription);
        assert!(main.struct_decl("SubscribeEventsMessage").is_some());
        let method = main.method.as_ref().unwrap();
        assert_eq!(method.kind, MethodKind::Subscription);
        assert_eq!(method.params.as_deref(), Some("SubscribeEventsParams"));
    }

    #[test]
    fn nested_arrays_from_memory_are_unsupported() {
        use crate::lexicon::{LEXICON_VERSION, LexArray, LexString};
        use bobbin_common::types::Nsid;

        let inner = LexType::Array(LexArray {
            description: None,
            items: Box::new(LexType::String(LexString::default())),
            min_length: None,
            max_length: None,
        });
        let outer = LexType::Array(LexArray {
            description: None,
            items: Box::new(inner),
            min_length: None,
            max_length: None,
        });
        let doc = LexiconDoc {
            lexicon: LEXICON_VERSION,
            id: Nsid::new("com.example.grid").unwrap(),
            revision: None,
            description: None,
            defs: BTreeMap::from([(SmolStr::new("main"), outer)]),
        };
        let err = CodeGenerator::default().generate(&doc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generation);
    }

    #[test]
    fn generation_is_deterministic() {
        let text = r##"{"lexicon": 1, "id": "com.example.getFeed", "defs": {
            "main": {"type": "query", "output": {"encoding": "application/json",
                "schema": {"type": "object", "properties": {
                    "b": {"type": "string"}, "a": {"type": "ref", "ref": "#view"}}}}},
            "view": {"type": "object", "properties": {"z": {"type": "integer"}, "y": {"type": "boolean"}}}
        }}"##;
        assert_eq!(generate(text), generate(text));
    }
}
