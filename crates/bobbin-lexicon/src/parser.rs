//! Lexicon document parser
//!
//! Text goes through `serde_json` into a raw value tree first (rejecting
//! duplicate keys on the way), then the top-level fields are checked, and
//! finally every definition is dispatched on its `type` discriminator and
//! validated before the next one is looked at. Any failure aborts the whole
//! document.

use crate::error::{LexiconError, Result};
use crate::lexicon::{LEXICON_VERSION, LexType, LexiconDoc};
use crate::validate;
use bobbin_common::types::Nsid;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Deserialize)]
struct RawDocument {
    lexicon: i64,
    id: String,
    revision: Option<u32>,
    description: Option<String>,
    defs: StrictValue,
}

/// A JSON value whose objects never contain the same key twice
struct StrictValue(Value);

impl<'de> Deserialize<'de> for StrictValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StrictVisitor).map(StrictValue)
    }
}

struct StrictVisitor;

impl<'de> Visitor<'de> for StrictVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        StrictValue::deserialize(deserializer).map(|v| v.0)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(StrictValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            if object.contains_key(&key) {
                return Err(de::Error::custom(format_args!("duplicate key `{key}`")));
            }
            let StrictValue(value) = map.next_value()?;
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}

/// Parse and validate a Lexicon document from raw bytes
pub fn parse(bytes: &[u8]) -> Result<LexiconDoc> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        let prefix = &bytes[..e.valid_up_to()];
        let line = prefix.iter().filter(|b| **b == b'\n').count() + 1;
        let column = prefix.iter().rev().take_while(|b| **b != b'\n').count() + 1;
        LexiconError::syntax(
            "input is not valid UTF-8",
            line,
            column,
            &String::from_utf8_lossy(bytes),
        )
    })?;
    parse_str(text)
}

/// Parse and validate a Lexicon document from text
pub fn parse_str(text: &str) -> Result<LexiconDoc> {
    let raw: RawDocument = serde_json::from_str(text).map_err(|e| classify(e, text))?;

    if raw.lexicon != i64::from(LEXICON_VERSION) {
        return Err(LexiconError::structural(
            "lexicon",
            format!(
                "unsupported lexicon version {}, expected {LEXICON_VERSION}",
                raw.lexicon
            ),
        ));
    }

    let id = Nsid::new(&raw.id).map_err(|e| LexiconError::structural("id", e.to_string()))?;

    let Value::Object(raw_defs) = raw.defs.0 else {
        return Err(LexiconError::structural(
            format!("{id}.defs"),
            "defs must be an object",
        ));
    };
    if raw_defs.is_empty() {
        return Err(LexiconError::structural(
            format!("{id}.defs"),
            "a lexicon must define at least one definition",
        ));
    }

    let def_names: Vec<&str> = raw_defs.keys().map(String::as_str).collect();
    let mut defs = BTreeMap::new();
    for (name, node) in &raw_defs {
        let location = format!("{id}#{name}");
        if !validate::is_def_name(name) {
            return Err(LexiconError::structural(
                location,
                "definition names must start with a letter and contain only letters, digits and underscores",
            ));
        }
        let node = parse_def(node.clone(), &location)?;
        validate::validate_def(&id, name, &node, &def_names)?;
        defs.insert(SmolStr::new(name), node);
    }

    let doc = LexiconDoc {
        lexicon: LEXICON_VERSION,
        id,
        revision: raw.revision,
        description: raw.description,
        defs,
    };
    validate::check_primary_defs(&doc)?;
    tracing::debug!(id = %doc.id, defs = doc.defs.len(), "parsed lexicon");
    Ok(doc)
}

/// Read and parse one lexicon file
pub fn parse_file(path: impl AsRef<Path>) -> Result<LexiconDoc> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| LexiconError::io(path, e))?;
    parse(&bytes).map_err(|e| e.in_file(path))
}

fn parse_def(node: Value, location: &str) -> Result<LexType> {
    let Some(obj) = node.as_object() else {
        return Err(LexiconError::structural(
            location,
            "a definition must be an object",
        ));
    };
    match obj.get("type") {
        Some(Value::String(_)) => {}
        Some(_) => {
            return Err(LexiconError::structural(
                location,
                "the `type` discriminator must be a string",
            ));
        }
        None => {
            return Err(LexiconError::structural(
                location,
                "missing `type` discriminator",
            ));
        }
    }
    serde_json::from_value(node).map_err(|e| LexiconError::structural(location, e.to_string()))
}

fn classify(err: serde_json::Error, text: &str) -> LexiconError {
    use serde_json::error::Category;
    match err.classify() {
        Category::Syntax | Category::Eof | Category::Io => {
            LexiconError::syntax(err.to_string(), err.line(), err.column(), text)
        }
        Category::Data => LexiconError::structural("document", err.to_string()),
    }
}
