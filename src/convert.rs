//! Conversion between record trees and JSON.
//!
//! | JSON | record |
//! |---|---|
//! | array | [`Array`] (nulls dropped) |
//! | object | [`Hash`] (member order kept) |
//! | string | [`Scalar`](crate::Scalar) |
//! | number, boolean | [`Scalar`](crate::Scalar) holding the JSON text |
//! | null | absent |
//!
//! The reverse direction goes through the [`Serialize`] impls of the value
//! types: every scalar becomes a JSON string and absent becomes `null`.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;

use crate::{
    error::{FixError, Result},
    record::Record,
    value::{Array, Hash, Value},
};

/// Converts a JSON value. `null` has no counterpart and yields `None`.
pub fn json_to_value(json: JsonValue) -> Option<Value> {
    match json {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(Value::scalar(b.to_string())),
        JsonValue::Number(n) => Some(Value::scalar(n.to_string())),
        JsonValue::String(s) => Some(Value::scalar(s)),
        JsonValue::Array(items) => Some(Value::Array(items.into_iter().filter_map(json_to_value).collect())),
        JsonValue::Object(members) => Some(Value::Hash(
            members
                .into_iter()
                .filter_map(|(field, value)| json_to_value(value).map(|value| (field, value)))
                .collect(),
        )),
    }
}

/// Converts a JSON object into a record. `null` yields an empty record.
pub fn json_to_record(json: JsonValue) -> Result<Record> {
    match json_to_value(json) {
        Some(Value::Hash(hash)) => Ok(Record::from(hash)),
        Some(other) => Err(FixError::type_mismatch("Hash", other.value_type(), None)),
        None => Ok(Record::new()),
    }
}

/// Projects a value to JSON through its [`Serialize`] impl.
pub fn value_to_json(value: &Value) -> Result<JsonValue> {
    Ok(serde_json::to_value(value)?)
}

pub fn hash_to_json(hash: &Hash) -> Result<JsonValue> {
    Ok(serde_json::to_value(hash)?)
}

/// Projects an optional value; absent becomes `null`.
pub fn option_to_json(value: Option<&Value>) -> Result<JsonValue> {
    Ok(serde_json::to_value(value)?)
}

/// Flattens a tree into `(path, text)` pairs, one per scalar, using each
/// scalar's provenance path.
pub fn to_literals(hash: &Hash) -> Vec<(String, String)> {
    let mut literals = Vec::new();
    for value in hash.values() {
        collect_literals(value, &mut literals);
    }
    literals
}

fn collect_literals(value: &Value, literals: &mut Vec<(String, String)>) {
    match value {
        Value::Scalar(scalar) => literals.push((
            scalar.path().unwrap_or_default().to_string(),
            scalar.as_str().to_string(),
        )),
        Value::Array(array) => array.iter().for_each(|item| collect_literals(item, literals)),
        Value::Hash(hash) => hash.values().for_each(|item| collect_literals(item, literals)),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Array(array) => array.serialize(serializer),
            Value::Hash(hash) => hash.serialize(serializer),
            Value::Scalar(scalar) => serializer.serialize_str(scalar.as_str()),
        }
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl Serialize for Array {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self.iter() {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Hash::serialize(self, serializer)
    }
}
