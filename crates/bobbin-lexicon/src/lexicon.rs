//! The Lexicon type model
//!
//! One closed sum type, [`LexType`], covers every schema node kind. Nodes own
//! their children; references between definitions are names
//! ([`LexRef::r#ref`], [`LexRefUnion::refs`]), never pointers, so a document
//! is always a tree even when its definitions refer to each other in a cycle.

use bobbin_common::types::Nsid;
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::skip_serializing_none;
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// The only Lexicon language version this crate accepts
pub const LEXICON_VERSION: u32 = 1;

/// Encoding assumed for subscription messages that don't declare one
pub const DAG_CBOR: &str = "application/vnd.ipld.dag-cbor";

/// A parsed, validated Lexicon document
///
/// Only [`crate::parser`] constructs these from text; the type serializes
/// back to Lexicon JSON.
#[skip_serializing_none]
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct LexiconDoc {
    pub lexicon: u32,
    pub id: Nsid,
    pub revision: Option<u32>,
    pub description: Option<String>,
    pub defs: BTreeMap<SmolStr, LexType>,
}

/// One named definition of a document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexDefinition<'d> {
    pub id: &'d str,
    pub node: &'d LexType,
}

impl LexiconDoc {
    /// Look up a definition by name
    pub fn def(&self, name: &str) -> Option<&LexType> {
        self.defs.get(name)
    }

    /// The `main` definition, if any
    pub fn main(&self) -> Option<&LexType> {
        self.def("main")
    }

    /// All definitions, ordered by name
    pub fn definitions(&self) -> impl Iterator<Item = LexDefinition<'_>> {
        self.defs.iter().map(|(id, node)| LexDefinition { id, node })
    }

    /// Last segment of the document id, e.g. `simpleQuery` for
    /// `com.example.simpleQuery`
    pub fn segment(&self) -> &str {
        self.id.name()
    }

    /// Fully qualified reference to one of this document's definitions:
    /// the bare id for `main`, `id#name` otherwise.
    pub fn def_ref(&self, name: &str) -> String {
        if name == "main" {
            self.id.to_string()
        } else {
            format!("{}#{}", self.id, name)
        }
    }

    /// Name of the local definition a reference points at, if it points
    /// into this document (`#name`, `<id>#name`, or `<id>`).
    pub fn local_target<'r>(&self, reference: &'r str) -> Option<&'r str> {
        match reference.split_once('#') {
            Some(("", name)) => Some(name),
            Some((nsid, name)) if nsid == self.id.as_str() => Some(name),
            Some(_) => None,
            None if reference == self.id.as_str() => Some("main"),
            None => None,
        }
    }
}

// primitives

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct LexBoolean {
    pub description: Option<String>,
    pub default: Option<bool>,
    pub r#const: Option<bool>,
}

/// The Lexicon type `integer`.
///
/// Lexicon integers are [specified] as signed and 64-bit, which means that values will
/// always fit in an `i64`.
///
/// [specified]: https://atproto.com/specs/data-model#data-types
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LexInteger {
    pub description: Option<String>,
    pub default: Option<i64>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub exclusive_minimum: Option<i64>,
    pub exclusive_maximum: Option<i64>,
    pub r#enum: Option<Vec<i64>>,
    pub r#const: Option<i64>,
}

/// Floating point number, same constraint shape as [`LexInteger`]
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LexNumber {
    pub description: Option<String>,
    pub default: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub r#enum: Option<Vec<f64>>,
    pub r#const: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum LexStringFormat {
    Datetime,
    Uri,
    UriReference,
    UriTemplate,
    AtUri,
    Did,
    Handle,
    AtIdentifier,
    Nsid,
    Cid,
    Language,
    Tid,
    RecordKey,
    Email,
    Hostname,
    Ipv4,
    Ipv6,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LexString {
    pub description: Option<String>,
    pub format: Option<LexStringFormat>,
    pub pattern: Option<String>,
    pub default: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_graphemes: Option<usize>,
    pub max_graphemes: Option<usize>,
    pub r#enum: Option<Vec<String>>,
    pub r#const: Option<String>,
    pub known_values: Option<Vec<String>>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct LexUnknown {
    pub description: Option<String>,
}

// ipld types

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LexBytes {
    pub description: Option<String>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct LexCidLink {
    pub description: Option<String>,
}

// references

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct LexRef {
    pub description: Option<String>,
    pub r#ref: SmolStr,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct LexRefUnion {
    pub description: Option<String>,
    pub refs: Vec<SmolStr>,
    pub closed: Option<bool>,
}

// blobs

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LexBlob {
    pub description: Option<String>,
    pub accept: Option<Vec<String>>,
    pub max_size: Option<u64>,
}

// complex types

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LexArray {
    pub description: Option<String>,
    pub items: Box<LexType>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct LexToken {
    pub description: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct LexObject {
    pub description: Option<String>,
    pub required: Option<Vec<SmolStr>>,
    pub nullable: Option<Vec<SmolStr>>,
    #[serde(default)]
    pub properties: BTreeMap<SmolStr, LexType>,
}

impl LexObject {
    /// Whether `name` is listed in `required`
    pub fn is_required(&self, name: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == name))
    }

    /// Whether `name` is listed in `nullable`
    pub fn is_nullable(&self, name: &str) -> bool {
        self.nullable
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == name))
    }
}

// xrpc

/// Query-string parameters of an XRPC method.
///
/// Lexicons write these as a `params` node; an `object` node is accepted too.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LexXrpcParameters {
    Params(LexObject),
    Object(LexObject),
}

impl LexXrpcParameters {
    pub fn object(&self) -> &LexObject {
        match self {
            Self::Params(obj) | Self::Object(obj) => obj,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LexXrpcBody {
    pub description: Option<String>,
    pub encoding: SmolStr,
    pub schema: Option<Box<LexType>>,
}

impl LexXrpcBody {
    /// Whether the body is JSON
    pub fn is_json(&self) -> bool {
        self.encoding.trim() == "application/json"
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct LexXrpcError {
    pub description: Option<String>,
    pub name: SmolStr,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LexXrpcQuery {
    pub description: Option<String>,
    pub parameters: Option<LexXrpcParameters>,
    pub output: Option<LexXrpcBody>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<LexXrpcError>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LexXrpcProcedure {
    pub description: Option<String>,
    pub parameters: Option<LexXrpcParameters>,
    pub input: Option<LexXrpcBody>,
    pub output: Option<LexXrpcBody>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<LexXrpcError>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LexXrpcSubscription {
    pub description: Option<String>,
    pub parameters: Option<LexXrpcParameters>,
    #[serde(default, deserialize_with = "subscription_message")]
    pub message: Option<LexXrpcBody>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub infos: Vec<LexXrpcError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<LexXrpcError>,
}

fn subscription_message<'de, D>(deserializer: D) -> Result<Option<LexXrpcBody>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Message {
        description: Option<String>,
        encoding: Option<SmolStr>,
        schema: Option<Box<LexType>>,
    }

    let message = Option::<Message>::deserialize(deserializer)?;
    Ok(message.map(|m| LexXrpcBody {
        description: m.description,
        encoding: m.encoding.unwrap_or_else(|| SmolStr::new_static(DAG_CBOR)),
        schema: m.schema,
    }))
}

// database

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LexRecordSchema {
    Object(LexObject),
}

impl LexRecordSchema {
    pub fn object(&self) -> &LexObject {
        match self {
            Self::Object(obj) => obj,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LexRecord {
    pub description: Option<String>,
    pub key: SmolStr,
    pub record: LexRecordSchema,
}

// core

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LexType {
    // lexPrimitive
    Boolean(LexBoolean),
    Integer(LexInteger),
    Number(LexNumber),
    String(LexString),
    Unknown(LexUnknown),
    // lexIpldType
    Bytes(LexBytes),
    CidLink(LexCidLink),
    // lexRefVariant
    Ref(LexRef),
    #[serde(rename = "union")]
    RefUnion(LexRefUnion),
    // lexBlob
    Blob(LexBlob),
    // composites
    Object(LexObject),
    Array(LexArray),
    Token(LexToken),
    // lexRecord
    Record(LexRecord),
    // lexXrpc*
    #[serde(rename = "query")]
    XrpcQuery(LexXrpcQuery),
    #[serde(rename = "procedure")]
    XrpcProcedure(LexXrpcProcedure),
    #[serde(rename = "subscription")]
    XrpcSubscription(LexXrpcSubscription),
}

impl LexType {
    /// The `type` discriminator this node serializes with
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Unknown(_) => "unknown",
            Self::Bytes(_) => "bytes",
            Self::CidLink(_) => "cid-link",
            Self::Ref(_) => "ref",
            Self::RefUnion(_) => "union",
            Self::Blob(_) => "blob",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Token(_) => "token",
            Self::Record(_) => "record",
            Self::XrpcQuery(_) => "query",
            Self::XrpcProcedure(_) => "procedure",
            Self::XrpcSubscription(_) => "subscription",
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Boolean(t) => t.description.as_deref(),
            Self::Integer(t) => t.description.as_deref(),
            Self::Number(t) => t.description.as_deref(),
            Self::String(t) => t.description.as_deref(),
            Self::Unknown(t) => t.description.as_deref(),
            Self::Bytes(t) => t.description.as_deref(),
            Self::CidLink(t) => t.description.as_deref(),
            Self::Ref(t) => t.description.as_deref(),
            Self::RefUnion(t) => t.description.as_deref(),
            Self::Blob(t) => t.description.as_deref(),
            Self::Object(t) => t.description.as_deref(),
            Self::Array(t) => t.description.as_deref(),
            Self::Token(t) => t.description.as_deref(),
            Self::Record(t) => t.description.as_deref(),
            Self::XrpcQuery(t) => t.description.as_deref(),
            Self::XrpcProcedure(t) => t.description.as_deref(),
            Self::XrpcSubscription(t) => t.description.as_deref(),
        }
    }

    /// Kinds that may only appear as a named top-level definition
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            Self::Record(_)
                | Self::XrpcQuery(_)
                | Self::XrpcProcedure(_)
                | Self::XrpcSubscription(_)
                | Self::Token(_)
        )
    }

    /// Query, procedure or subscription
    pub fn is_rpc(&self) -> bool {
        matches!(
            self,
            Self::XrpcQuery(_) | Self::XrpcProcedure(_) | Self::XrpcSubscription(_)
        )
    }

    /// Every reference string in this node and its children, in document order
    pub fn refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        let object = |obj: &'a LexObject, out: &mut Vec<&'a str>| {
            for prop in obj.properties.values() {
                prop.collect_refs(out);
            }
        };
        let body = |body: &'a Option<LexXrpcBody>, out: &mut Vec<&'a str>| {
            if let Some(schema) = body.as_ref().and_then(|b| b.schema.as_deref()) {
                schema.collect_refs(out);
            }
        };
        match self {
            Self::Ref(r) => out.push(&r.r#ref),
            Self::RefUnion(u) => out.extend(u.refs.iter().map(SmolStr::as_str)),
            Self::Object(obj) => object(obj, out),
            Self::Array(arr) => arr.items.collect_refs(out),
            Self::Record(rec) => object(rec.record.object(), out),
            Self::XrpcQuery(q) => {
                if let Some(params) = &q.parameters {
                    object(params.object(), out);
                }
                body(&q.output, out);
            }
            Self::XrpcProcedure(p) => {
                if let Some(params) = &p.parameters {
                    object(params.object(), out);
                }
                body(&p.input, out);
                body(&p.output, out);
            }
            Self::XrpcSubscription(s) => {
                if let Some(params) = &s.parameters {
                    object(params.object(), out);
                }
                body(&s.message, out);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_dispatch() {
        let node: LexType = serde_json::from_value(serde_json::json!({
            "type": "array",
            "items": { "type": "ref", "ref": "#post" },
            "maxLength": 10
        }))
        .unwrap();
        match &node {
            LexType::Array(arr) => {
                assert_eq!(arr.max_length, Some(10));
                assert!(matches!(&*arr.items, LexType::Ref(r) if r.r#ref == "#post"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(node.refs(), vec!["#post"]);
    }

    #[test]
    fn union_and_cid_link_discriminators() {
        let union: LexType =
            serde_json::from_value(serde_json::json!({ "type": "union", "refs": ["#a", "#b"] }))
                .unwrap();
        assert_eq!(union.type_name(), "union");
        let link: LexType = serde_json::from_value(serde_json::json!({ "type": "cid-link" })).unwrap();
        assert!(matches!(link, LexType::CidLink(_)));
    }

    #[test]
    fn params_accepts_both_discriminators() {
        for tag in ["params", "object"] {
            let query: LexType = serde_json::from_value(serde_json::json!({
                "type": "query",
                "parameters": { "type": tag, "properties": { "limit": { "type": "integer" } } }
            }))
            .unwrap();
            let LexType::XrpcQuery(query) = query else {
                panic!("not a query")
            };
            let params = query.parameters.unwrap();
            assert!(params.object().properties.contains_key("limit"));
        }
    }

    #[test]
    fn subscription_message_defaults_encoding() {
        let sub: LexType = serde_json::from_value(serde_json::json!({
            "type": "subscription",
            "message": { "schema": { "type": "union", "refs": ["#commit"] } }
        }))
        .unwrap();
        let LexType::XrpcSubscription(sub) = sub else {
            panic!("not a subscription")
        };
        assert_eq!(sub.message.unwrap().encoding, DAG_CBOR);
    }

    #[test]
    fn serializes_back_without_absent_fields() {
        let node = LexType::String(LexString {
            format: Some(LexStringFormat::AtUri),
            max_length: Some(64),
            ..Default::default()
        });
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            serde_json::json!({ "type": "string", "format": "at-uri", "maxLength": 64 })
        );
    }

    #[test]
    fn local_targets() {
        let doc = LexiconDoc {
            lexicon: LEXICON_VERSION,
            id: Nsid::new("com.example.feed").unwrap(),
            revision: None,
            description: None,
            defs: BTreeMap::new(),
        };
        assert_eq!(doc.local_target("#post"), Some("post"));
        assert_eq!(doc.local_target("com.example.feed#post"), Some("post"));
        assert_eq!(doc.local_target("com.example.feed"), Some("main"));
        assert_eq!(doc.local_target("com.example.other#post"), None);
        assert_eq!(doc.def_ref("main"), "com.example.feed");
        assert_eq!(doc.def_ref("post"), "com.example.feed#post");
    }
}
