use std::collections::HashSet;
use std::time::SystemTime;

/// A value as the native store hands it out.
///
/// This is the union of what the supported platform stores can hold. Only
/// [`crate::serialize`] should look inside it; the rest of the engine treats
/// it as opaque.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    StringSet(HashSet<String>),
    Data(Vec<u8>),
    Date(SystemTime),
    Url(String),
    Array(Vec<NativeValue>),
    /// Keys are not guaranteed to be strings on every platform
    Dictionary(Vec<(NativeValue, NativeValue)>),
    /// A platform object that only offers a textual description
    Opaque(String),
}

impl NativeValue {
    pub fn string_set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NativeValue::StringSet(items.into_iter().map(Into::into).collect())
    }

    pub fn dictionary<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<NativeValue>,
        V: Into<NativeValue>,
    {
        NativeValue::Dictionary(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Short type name used in log fields.
    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Bool(_) => "bool",
            NativeValue::Int(_) => "int",
            NativeValue::Long(_) => "long",
            NativeValue::Float(_) => "float",
            NativeValue::Double(_) => "double",
            NativeValue::String(_) => "string",
            NativeValue::StringSet(_) => "string_set",
            NativeValue::Data(_) => "data",
            NativeValue::Date(_) => "date",
            NativeValue::Url(_) => "url",
            NativeValue::Array(_) => "array",
            NativeValue::Dictionary(_) => "dictionary",
            NativeValue::Opaque(_) => "opaque",
        }
    }
}

impl From<bool> for NativeValue {
    fn from(b: bool) -> Self {
        NativeValue::Bool(b)
    }
}

impl From<i32> for NativeValue {
    fn from(i: i32) -> Self {
        NativeValue::Int(i)
    }
}

impl From<i64> for NativeValue {
    fn from(i: i64) -> Self {
        NativeValue::Long(i)
    }
}

impl From<f32> for NativeValue {
    fn from(f: f32) -> Self {
        NativeValue::Float(f)
    }
}

impl From<f64> for NativeValue {
    fn from(f: f64) -> Self {
        NativeValue::Double(f)
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::String(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::String(s)
    }
}

impl From<SystemTime> for NativeValue {
    fn from(t: SystemTime) -> Self {
        NativeValue::Date(t)
    }
}

impl<T> From<Option<T>> for NativeValue
where
    T: Into<NativeValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => NativeValue::Null,
        }
    }
}
