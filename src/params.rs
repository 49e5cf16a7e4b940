//! Parameter model and URL/form encoding
//!
//! Callers hand over either a single scalar or a string-keyed mapping of
//! scalars. The set of accepted shapes is closed: anything else (booleans,
//! nulls, arrays, nested mappings) is rejected with
//! [`Error::UnsupportedType`] before a request is ever built.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::Value;
use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::error::{Error, Result};

/// A single scalar parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Signed integer of any width
    Int(i64),
    /// Unsigned integer of any width
    UInt(u64),
    /// Single precision float, kept narrow so it renders as written
    Float32(f32),
    /// Double precision float
    Float(f64),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Text
    Text(String),
}

impl Param {
    /// Canonical byte representation, before any escaping
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            Param::Bytes(bytes) => Cow::Borrowed(bytes),
            Param::Text(text) => Cow::Borrowed(text.as_bytes()),
            other => Cow::Owned(other.to_string().into_bytes()),
        }
    }

    /// Name of the value kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Param::Int(_) => "int",
            Param::UInt(_) => "uint",
            Param::Float32(_) => "float32",
            Param::Float(_) => "float64",
            Param::Bytes(_) => "bytes",
            Param::Text(_) => "string",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Int(v) => write!(f, "{}", v),
            Param::UInt(v) => write!(f, "{}", v),
            Param::Float32(v) => write!(f, "{}", v),
            Param::Float(v) => write!(f, "{}", v),
            Param::Bytes(v) => f.write_str(&String::from_utf8_lossy(v)),
            Param::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $wide:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Param::$variant(value as $wide)
                }
            }
        )*
    };
}

impl_from_int!(Int, i64: i8, i16, i32, i64, isize);
impl_from_int!(UInt, u64: u8, u16, u32, u64, usize);

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Param::Float32(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Float(value)
    }
}

impl From<Vec<u8>> for Param {
    fn from(value: Vec<u8>) -> Self {
        Param::Bytes(value)
    }
}

impl From<&[u8]> for Param {
    fn from(value: &[u8]) -> Self {
        Param::Bytes(value.to_vec())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl TryFrom<Value> for Param {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Param::Text(s)),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(Param::Int(v))
                } else if let Some(v) = n.as_u64() {
                    Ok(Param::UInt(v))
                } else {
                    n.as_f64()
                        .map(Param::Float)
                        .ok_or_else(|| Error::unsupported(format!("number {}", n)))
                }
            }
            other => Err(Error::unsupported(json_kind(&other))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "nested mapping",
    }
}

/// Ordered mapping of string keys to scalar parameters
///
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Param)>,
}

impl Params {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Param>) -> Option<Param> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Insert a value, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&Param> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as `key1=val1&key2=val2` with form escaping on keys and values
    pub fn to_form_urlencoded(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    byte_serialize(k.as_bytes()).collect::<String>(),
                    byte_serialize(&v.to_bytes()).collect::<String>()
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append the encoded mapping to the URL's query string.
    ///
    /// An empty mapping leaves the URL untouched.
    pub fn append_to_url(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let encoded = self.to_form_urlencoded();
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, encoded),
            _ => encoded,
        };
        url.set_query(Some(&query));
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<Param>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<String>,
    V: Into<Param>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl TryFrom<Value> for Params {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Params::new()),
            Value::Object(map) => {
                let mut params = Params::new();
                for (key, value) in map {
                    let param = Param::try_from(value).map_err(|e| match e {
                        Error::UnsupportedType(kind) => {
                            Error::unsupported(format!("{} for key '{}'", kind, key))
                        }
                        other => other,
                    })?;
                    params.insert(key, param);
                }
                Ok(params)
            }
            other => Err(Error::unsupported(format!(
                "{} where a mapping was expected",
                json_kind(&other)
            ))),
        }
    }
}

/// Request body input: a single scalar or a mapping
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Scalar(Param),
    Map(Params),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Map(Params::new())
    }
}

impl From<Param> for Payload {
    fn from(value: Param) -> Self {
        Payload::Scalar(value)
    }
}

impl From<Params> for Payload {
    fn from(value: Params) -> Self {
        Payload::Map(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Scalar(value.into())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Scalar(value.into())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Scalar(value.into())
    }
}

impl TryFrom<Value> for Payload {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(_) | Value::Null => Params::try_from(value).map(Payload::Map),
            other => Param::try_from(other).map(Payload::Scalar),
        }
    }
}

/// Conversion into a request body, checked at the call boundary
pub trait IntoPayload {
    fn into_payload(self) -> Result<Payload>;
}

/// Conversion into query or header parameters, checked at the call boundary
pub trait IntoParams {
    fn into_params(self) -> Result<Params>;
}

macro_rules! impl_into_payload {
    ($($ty:ty),*) => {
        $(
            impl IntoPayload for $ty {
                fn into_payload(self) -> Result<Payload> {
                    Ok(Payload::from(self))
                }
            }
        )*
    };
}

impl_into_payload!(Payload, Param, Params, &str, String, Vec<u8>);

impl IntoPayload for Value {
    fn into_payload(self) -> Result<Payload> {
        Payload::try_from(self)
    }
}

impl IntoParams for Params {
    fn into_params(self) -> Result<Params> {
        Ok(self)
    }
}

impl IntoParams for Value {
    fn into_params(self) -> Result<Params> {
        Params::try_from(self)
    }
}

// Entries keep the map's iteration order: sorted for `BTreeMap`, unspecified
// for `HashMap`.
macro_rules! impl_map_conversions {
    ($($map:ident),*) => {
        $(
            impl<K, V> IntoParams for $map<K, V>
            where
                K: Into<String>,
                V: Into<Param>,
            {
                fn into_params(self) -> Result<Params> {
                    Ok(self.into_iter().collect())
                }
            }

            impl<K, V> IntoPayload for $map<K, V>
            where
                K: Into<String>,
                V: Into<Param>,
            {
                fn into_payload(self) -> Result<Payload> {
                    Ok(Payload::Map(self.into_iter().collect()))
                }
            }
        )*
    };
}

impl_map_conversions!(HashMap, BTreeMap);

impl<T: IntoParams> IntoParams for Option<T> {
    fn into_params(self) -> Result<Params> {
        self.map_or_else(|| Ok(Params::new()), IntoParams::into_params)
    }
}
