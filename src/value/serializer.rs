//! Native → [`PreferenceValue`] normalization.
//!
//! [`serialize`] is total: anything that cannot be represented degrades to
//! `Null`. [`try_serialize`] exposes the distinction so callers can skip a key
//! instead of publishing a meaningless `Null`.

use std::collections::BTreeMap;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use tracing::trace;

use crate::Error;
use crate::NativeValue;
use crate::PreferenceValue;
use crate::Result;

/// Normalize a native value. Unrepresentable values become `Null`.
pub fn serialize(value: &NativeValue) -> PreferenceValue {
    try_serialize(value).unwrap_or(PreferenceValue::Null)
}

/// Normalize a native value, returning `None` when it has no meaningful
/// representation.
pub fn try_serialize(value: &NativeValue) -> Option<PreferenceValue> {
    match value {
        NativeValue::Null => Some(PreferenceValue::Null),
        NativeValue::Bool(b) => Some(PreferenceValue::Bool(*b)),
        NativeValue::Int(i) => Some(PreferenceValue::Integer(i64::from(*i))),
        NativeValue::Long(i) => Some(PreferenceValue::Integer(*i)),
        // Exact IEEE widening: 3.14f32 becomes 3.140000104904175
        NativeValue::Float(f) => Some(PreferenceValue::Float64(f64::from(*f))),
        NativeValue::Double(f) => Some(PreferenceValue::Float64(*f)),
        NativeValue::String(s) => Some(PreferenceValue::String(s.clone())),
        NativeValue::StringSet(set) => {
            let mut items: Vec<String> = set.iter().cloned().collect();
            items.sort();
            Some(PreferenceValue::ListOfString(items))
        }
        NativeValue::Data(bytes) => Some(PreferenceValue::from_bytes(bytes)),
        NativeValue::Date(time) => Some(PreferenceValue::Float64(millis_since_epoch(*time))),
        NativeValue::Url(url) => Some(PreferenceValue::String(url.clone())),
        NativeValue::Array(items) => Some(serialize_array(items)),
        NativeValue::Dictionary(entries) => Some(serialize_dictionary(entries)),
        NativeValue::Opaque(description) => describe_opaque(description),
    }
}

/// Same as [`try_serialize`] but reports the skipped key as an error.
pub(crate) fn serialize_entry(
    key: &str,
    value: &NativeValue,
) -> Result<PreferenceValue> {
    try_serialize(value).ok_or_else(|| Error::SerializationSkipped {
        key: key.to_string(),
    })
}

fn serialize_array(items: &[NativeValue]) -> PreferenceValue {
    let mut strings = Vec::with_capacity(items.len());
    for item in items {
        match item {
            NativeValue::String(s) => strings.push(s.clone()),
            other => match try_serialize(other).and_then(scalar_as_string) {
                Some(s) => strings.push(s),
                None => {
                    trace!(element = other.type_name(), "Dropping array element");
                }
            },
        }
    }
    PreferenceValue::ListOfString(strings)
}

fn scalar_as_string(value: PreferenceValue) -> Option<String> {
    match value {
        PreferenceValue::String(s) | PreferenceValue::Bytes(s) => Some(s),
        PreferenceValue::Integer(i) => Some(i.to_string()),
        PreferenceValue::Float64(f) => Some(f.to_string()),
        PreferenceValue::Bool(b) => Some(b.to_string()),
        PreferenceValue::Null | PreferenceValue::ListOfString(_) | PreferenceValue::Mapping(_) => {
            None
        }
    }
}

fn serialize_dictionary(entries: &[(NativeValue, NativeValue)]) -> PreferenceValue {
    let mut map = BTreeMap::new();
    for (key, value) in entries {
        let NativeValue::String(key) = key else {
            trace!(key_type = key.type_name(), "Dropping non-string dictionary key");
            continue;
        };
        match try_serialize(value) {
            Some(v) => {
                map.insert(key.clone(), v);
            }
            None => {
                trace!(%key, "Dropping unrepresentable dictionary value");
            }
        }
    }
    PreferenceValue::Mapping(map)
}

/// Default object descriptions look like `<NSObject: 0x6000...>` and carry no
/// information.
fn describe_opaque(description: &str) -> Option<PreferenceValue> {
    let trimmed = description.trim();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        return None;
    }
    Some(PreferenceValue::String(description.to_string()))
}

/// Milliseconds since the Unix epoch; negative for earlier instants.
pub(crate) fn millis_since_epoch(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as f64 + f64::from(d.subsec_nanos() % 1_000_000) / 1_000_000.0,
        Err(e) => {
            let d = e.duration();
            -(d.as_millis() as f64 + f64::from(d.subsec_nanos() % 1_000_000) / 1_000_000.0)
        }
    }
}
