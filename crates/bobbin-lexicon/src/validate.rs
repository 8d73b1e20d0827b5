//! Semantic checks on parsed definitions
//!
//! Validation is fail-fast: the first violation found is returned and
//! nothing else is inspected. Locations are rendered as
//! `<document id>#<definition>.<field path>`.

use crate::error::{LexiconError, Result};
use crate::lexicon::{
    LexArray, LexBlob, LexBoolean, LexInteger, LexNumber, LexObject, LexRecord, LexString,
    LexType, LexXrpcBody, LexXrpcError, LexXrpcParameters, LexiconDoc,
};
use bobbin_common::types::Nsid;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static DEF_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").unwrap());

static MIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*|[a-zA-Z0-9][a-zA-Z0-9!#$&^_.+-]*)/(\*|[a-zA-Z0-9][a-zA-Z0-9!#$&^_.+-]*)$")
        .unwrap()
});

/// Whether `name` is usable as a definition name
pub fn is_def_name(name: &str) -> bool {
    DEF_NAME_REGEX.is_match(name)
}

/// Whether `value` looks like a `type/subtype` media type (wildcards allowed)
pub fn is_mime_like(value: &str) -> bool {
    MIME_REGEX.is_match(value)
}

/// Validate one top-level definition
///
/// `def_names` lists every definition of the enclosing document so local
/// references can be checked before the whole document has been built.
pub fn validate_def(doc_id: &Nsid, def_name: &str, node: &LexType, def_names: &[&str]) -> Result<()> {
    let validator = Validator { doc_id, def_names };
    validator.node(node, &format!("{doc_id}#{def_name}"), true)
}

/// Validate every definition of a document built in memory
pub fn validate_document(doc: &LexiconDoc) -> Result<()> {
    let def_names: Vec<&str> = doc.defs.keys().map(|k| k.as_str()).collect();
    for (name, node) in &doc.defs {
        validate_def(&doc.id, name, node, &def_names)?;
    }
    check_primary_defs(doc)
}

/// Documents carrying an XRPC definition must have a `main` definition
pub(crate) fn check_primary_defs(doc: &LexiconDoc) -> Result<()> {
    if doc.main().is_none() {
        if let Some((name, node)) = doc.defs.iter().find(|(_, node)| node.is_rpc()) {
            return Err(LexiconError::structural(
                format!("{}#{name}", doc.id),
                format!(
                    "a `{}` definition requires the document to define `main`",
                    node.type_name()
                ),
            ));
        }
    }
    Ok(())
}

struct Validator<'v> {
    doc_id: &'v Nsid,
    def_names: &'v [&'v str],
}

impl Validator<'_> {
    fn node(&self, node: &LexType, loc: &str, top_level: bool) -> Result<()> {
        if !top_level && node.is_primary() {
            return Err(LexiconError::structural(
                loc,
                format!(
                    "`{}` is only allowed as a top-level definition",
                    node.type_name()
                ),
            ));
        }
        match node {
            LexType::Boolean(b) => boolean(b, loc),
            LexType::Integer(i) => integer(i, loc),
            LexType::Number(n) => number(n, loc),
            LexType::String(s) => string(s, loc),
            LexType::Bytes(b) => length_bounds(b.min_length, b.max_length, loc),
            LexType::Array(arr) => self.array(arr, loc),
            LexType::Object(obj) => self.object(obj, loc),
            LexType::Ref(r) => self.reference(&r.r#ref, &format!("{loc}.ref")),
            LexType::RefUnion(union) => {
                if union.refs.is_empty() {
                    return Err(LexiconError::reference(
                        format!("{loc}.refs"),
                        "",
                        "a union must list at least one reference",
                    ));
                }
                for (i, r) in union.refs.iter().enumerate() {
                    self.reference(r, &format!("{loc}.refs[{i}]"))?;
                }
                Ok(())
            }
            LexType::Blob(blob) => blob_accept(blob, loc),
            LexType::Record(rec) => self.record(rec, loc),
            LexType::XrpcQuery(q) => {
                self.parameters(q.parameters.as_ref(), loc)?;
                self.body(q.output.as_ref(), &format!("{loc}.output"))?;
                unique_errors(&q.errors, loc)
            }
            LexType::XrpcProcedure(p) => {
                self.parameters(p.parameters.as_ref(), loc)?;
                self.body(p.input.as_ref(), &format!("{loc}.input"))?;
                self.body(p.output.as_ref(), &format!("{loc}.output"))?;
                unique_errors(&p.errors, loc)
            }
            LexType::XrpcSubscription(s) => {
                self.parameters(s.parameters.as_ref(), loc)?;
                self.body(s.message.as_ref(), &format!("{loc}.message"))?;
                unique_errors(&s.errors, loc)
            }
            LexType::Token(_) | LexType::Unknown(_) | LexType::CidLink(_) => Ok(()),
        }
    }

    fn array(&self, arr: &LexArray, loc: &str) -> Result<()> {
        length_bounds(arr.min_length, arr.max_length, loc)?;
        let items = format!("{loc}.items");
        if matches!(*arr.items, LexType::Array(_)) {
            return Err(LexiconError::structural(
                items,
                "arrays of arrays are not supported",
            ));
        }
        self.node(&arr.items, &items, false)
    }

    fn object(&self, obj: &LexObject, loc: &str) -> Result<()> {
        for (list, names) in [("required", &obj.required), ("nullable", &obj.nullable)] {
            for name in names.iter().flatten() {
                if !obj.properties.contains_key(name) {
                    return Err(LexiconError::structural(
                        format!("{loc}.{list}"),
                        format!("`{name}` is not one of the declared properties"),
                    ));
                }
            }
        }
        for (name, prop) in &obj.properties {
            self.node(prop, &format!("{loc}.properties.{name}"), false)?;
        }
        Ok(())
    }

    fn record(&self, rec: &LexRecord, loc: &str) -> Result<()> {
        let key = rec.key.as_str();
        let valid_key = matches!(key, "tid" | "nsid" | "any")
            || key.strip_prefix("literal:").is_some_and(|v| !v.is_empty());
        if !valid_key {
            return Err(LexiconError::structural(
                format!("{loc}.key"),
                format!("record key type `{key}` must be tid, nsid, any or literal:<value>"),
            ));
        }
        self.object(rec.record.object(), &format!("{loc}.record"))
    }

    fn parameters(&self, params: Option<&LexXrpcParameters>, loc: &str) -> Result<()> {
        let Some(params) = params else {
            return Ok(());
        };
        let loc = format!("{loc}.parameters");
        let obj = params.object();
        for (name, prop) in &obj.properties {
            let allowed = match prop {
                LexType::Array(arr) => is_param_primitive(&arr.items),
                other => is_param_primitive(other),
            };
            if !allowed {
                return Err(LexiconError::structural(
                    format!("{loc}.properties.{name}"),
                    format!(
                        "parameters must be primitives or arrays of primitives, found `{}`",
                        prop.type_name()
                    ),
                ));
            }
        }
        self.object(obj, &loc)
    }

    fn body(&self, body: Option<&LexXrpcBody>, loc: &str) -> Result<()> {
        let Some(body) = body else {
            return Ok(());
        };
        if !is_mime_like(body.encoding.trim()) {
            return Err(LexiconError::structural(
                format!("{loc}.encoding"),
                format!("`{}` is not a media type", body.encoding),
            ));
        }
        match &body.schema {
            Some(schema) => self.node(schema, &format!("{loc}.schema"), false),
            None => Ok(()),
        }
    }

    fn reference(&self, reference: &str, loc: &str) -> Result<()> {
        let invalid = |message: &str| Err(LexiconError::reference(loc, reference, message));
        if reference.is_empty() {
            return invalid("reference is empty");
        }
        let (nsid, name) = match reference.split_once('#') {
            Some((nsid, name)) => {
                if name.is_empty() {
                    return invalid("missing definition name after `#`");
                }
                if !is_def_name(name) {
                    return invalid("invalid definition name");
                }
                (nsid, name)
            }
            None => (reference, "main"),
        };
        if !nsid.is_empty() && Nsid::new(nsid).is_err() {
            return invalid(if reference.contains('#') {
                "invalid NSID before `#`"
            } else {
                "expected `#name`, `nsid` or `nsid#name`"
            });
        }
        let local = nsid.is_empty() || nsid == self.doc_id.as_str();
        if local && !self.def_names.contains(&name) {
            return invalid("no such definition in this document");
        }
        Ok(())
    }
}

fn is_param_primitive(node: &LexType) -> bool {
    matches!(
        node,
        LexType::Boolean(_)
            | LexType::Integer(_)
            | LexType::Number(_)
            | LexType::String(_)
            | LexType::Unknown(_)
    )
}

fn boolean(b: &LexBoolean, loc: &str) -> Result<()> {
    const_matches_default(b.r#const.as_ref(), b.default.as_ref(), loc)
}

fn integer(i: &LexInteger, loc: &str) -> Result<()> {
    value_bounds(
        i.minimum,
        i.maximum,
        i.exclusive_minimum,
        i.exclusive_maximum,
        loc,
    )?;
    const_matches_default(i.r#const.as_ref(), i.default.as_ref(), loc)
}

fn number(n: &LexNumber, loc: &str) -> Result<()> {
    value_bounds(
        n.minimum,
        n.maximum,
        n.exclusive_minimum,
        n.exclusive_maximum,
        loc,
    )
}

fn string(s: &LexString, loc: &str) -> Result<()> {
    length_bounds(s.min_length, s.max_length, loc)?;
    if let (Some(min), Some(max)) = (s.min_graphemes, s.max_graphemes) {
        if min > max {
            return Err(LexiconError::structural(
                loc,
                format!("minGraphemes {min} is greater than maxGraphemes {max}"),
            ));
        }
    }
    const_matches_default(s.r#const.as_ref(), s.default.as_ref(), loc)?;
    if let Some(pattern) = &s.pattern {
        if let Err(e) = Regex::new(pattern) {
            return Err(LexiconError::structural(
                format!("{loc}.pattern"),
                format!("invalid pattern: {e}"),
            ));
        }
    }
    Ok(())
}

fn blob_accept(blob: &LexBlob, loc: &str) -> Result<()> {
    for accept in blob.accept.iter().flatten() {
        if !is_mime_like(accept) {
            return Err(LexiconError::structural(
                format!("{loc}.accept"),
                format!("`{accept}` is not a media type pattern"),
            ));
        }
    }
    Ok(())
}

fn unique_errors(errors: &[LexXrpcError], loc: &str) -> Result<()> {
    let mut seen = BTreeSet::new();
    for err in errors {
        if !seen.insert(err.name.as_str()) {
            return Err(LexiconError::structural(
                format!("{loc}.errors"),
                format!("error `{}` is declared more than once", err.name),
            ));
        }
    }
    Ok(())
}

fn length_bounds(min: Option<usize>, max: Option<usize>, loc: &str) -> Result<()> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(LexiconError::structural(
            loc,
            format!("minLength {min} is greater than maxLength {max}"),
        )),
        _ => Ok(()),
    }
}

fn value_bounds<T>(
    minimum: Option<T>,
    maximum: Option<T>,
    exclusive_minimum: Option<T>,
    exclusive_maximum: Option<T>,
    loc: &str,
) -> Result<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    let out_of_order = |message: String| Err(LexiconError::structural(loc, message));
    if let (Some(min), Some(max)) = (minimum, maximum) {
        if min > max {
            return out_of_order(format!("minimum {min} is greater than maximum {max}"));
        }
    }
    if let (Some(min), Some(max)) = (exclusive_minimum, exclusive_maximum) {
        if min >= max {
            return out_of_order(format!(
                "exclusiveMinimum {min} must be less than exclusiveMaximum {max}"
            ));
        }
    }
    if let (Some(min), Some(max)) = (minimum, exclusive_maximum) {
        if min >= max {
            return out_of_order(format!(
                "minimum {min} must be less than exclusiveMaximum {max}"
            ));
        }
    }
    if let (Some(min), Some(max)) = (exclusive_minimum, maximum) {
        if min >= max {
            return out_of_order(format!(
                "exclusiveMinimum {min} must be less than maximum {max}"
            ));
        }
    }
    Ok(())
}

fn const_matches_default<T: PartialEq + std::fmt::Debug>(
    constant: Option<&T>,
    default: Option<&T>,
    loc: &str,
) -> Result<()> {
    match (constant, default) {
        (Some(c), Some(d)) if c != d => Err(LexiconError::structural(
            loc,
            format!("const {c:?} does not match default {d:?}"),
        )),
        _ => Ok(()),
    }
}
