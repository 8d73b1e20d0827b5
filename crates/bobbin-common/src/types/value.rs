use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Untyped data for `unknown` fields: a string-keyed map of JSON values
pub type Data = BTreeMap<String, Value>;

/// Generic object for unions and refs that can't be resolved locally.
///
/// Union members carry a `$type` discriminator naming the concrete
/// definition; [`AnyObject::type_tag`] reads it and [`AnyObject::decode`]
/// converts once the caller knows the target type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnyObject(pub Value);

impl AnyObject {
    /// The `$type` discriminator, if this is an object carrying one
    pub fn type_tag(&self) -> Option<&str> {
        self.0.get("$type").and_then(Value::as_str)
    }

    /// Deserialize into a concrete type
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    /// The raw JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for AnyObject {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
