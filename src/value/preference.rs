use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

/// Transport-safe preference value.
///
/// The closed set every native value is normalized into. Serializes as plain
/// JSON (`Bytes` as its base64 text) so any transport carrying these shapes
/// satisfies the consumer contract.
///
/// Equality is structural. `Float64` compares by bit pattern, which makes the
/// type `Eq` and keeps an unchanged NaN from looking like an update.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float64(f64),
    String(String),
    ListOfString(Vec<String>),
    /// Base64 (standard alphabet, padded) encoding of the raw bytes
    Bytes(String),
    Mapping(BTreeMap<String, PreferenceValue>),
}

impl PartialEq for PreferenceValue {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        use PreferenceValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float64(a), Float64(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (ListOfString(a), ListOfString(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Mapping(a), Mapping(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PreferenceValue {}

impl PreferenceValue {
    /// Encode raw bytes into the `Bytes` variant.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        PreferenceValue::Bytes(STANDARD.encode(bytes))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PreferenceValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PreferenceValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PreferenceValue::Float64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PreferenceValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PreferenceValue::ListOfString(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, PreferenceValue>> {
        match self {
            PreferenceValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Decode the `Bytes` variant back into raw bytes
    pub fn decode_bytes(&self) -> Option<Vec<u8>> {
        match self {
            PreferenceValue::Bytes(encoded) => STANDARD.decode(encoded).ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PreferenceValue::Null)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PreferenceValue::Null => "null",
            PreferenceValue::Bool(_) => "bool",
            PreferenceValue::Integer(_) => "integer",
            PreferenceValue::Float64(_) => "float64",
            PreferenceValue::String(_) => "string",
            PreferenceValue::ListOfString(_) => "list_of_string",
            PreferenceValue::Bytes(_) => "bytes",
            PreferenceValue::Mapping(_) => "mapping",
        }
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}

impl From<bool> for PreferenceValue {
    fn from(b: bool) -> Self {
        PreferenceValue::Bool(b)
    }
}

impl From<i64> for PreferenceValue {
    fn from(i: i64) -> Self {
        PreferenceValue::Integer(i)
    }
}

impl From<f64> for PreferenceValue {
    fn from(f: f64) -> Self {
        PreferenceValue::Float64(f)
    }
}

impl From<&str> for PreferenceValue {
    fn from(s: &str) -> Self {
        PreferenceValue::String(s.to_string())
    }
}

impl From<String> for PreferenceValue {
    fn from(s: String) -> Self {
        PreferenceValue::String(s)
    }
}

impl From<Vec<String>> for PreferenceValue {
    fn from(items: Vec<String>) -> Self {
        PreferenceValue::ListOfString(items)
    }
}

impl From<BTreeMap<String, PreferenceValue>> for PreferenceValue {
    fn from(map: BTreeMap<String, PreferenceValue>) -> Self {
        PreferenceValue::Mapping(map)
    }
}
