//! Request parameter encoding for signed Gemini calls.
//!
//! Private calls carry all of their state in the `X-GEMINI-PAYLOAD` header:
//! - parameters are a key-sorted map of [`ParamValue`]s
//! - the map is serialized to compact JSON
//! - the JSON bytes are base64 encoded (standard alphabet, padded)
//!
//! Sorting keys keeps the payload byte-identical for identical input, so
//! signatures are reproducible. The exchange itself accepts any key order.
use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::GeminiError;
use crate::models::Id;

/// A single request parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Unsigned(u64),
    Boolean(bool),
    StringArray(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

/// Nonces are full-range `u64`; they are never clamped to `i64`.
impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        ParamValue::Unsigned(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Integer(i64::from(v))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Boolean(v)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::StringArray(v)
    }
}

/// Decimals travel as strings in plain (non-exponent) notation.
impl From<Decimal> for ParamValue {
    fn from(v: Decimal) -> Self {
        ParamValue::String(format_decimal(v))
    }
}

/// Order ids are integers on the wire; non-numeric ids are sent verbatim.
impl From<&Id> for ParamValue {
    fn from(id: &Id) -> Self {
        match id.as_str().parse::<i64>() {
            Ok(n) => ParamValue::Integer(n),
            Err(_) => ParamValue::String(id.as_str().to_string()),
        }
    }
}

/// Parameters of one request. Keys are kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestParams(BTreeMap<String, ParamValue>);

impl RequestParams {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert only when the value is present.
    pub fn with_opt<V: Into<ParamValue>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.insert(key, v);
        }
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Serialize parameters to canonical compact JSON.
pub fn canonical_json(params: &RequestParams) -> Result<String, GeminiError> {
    Ok(serde_json::to_string(params)?)
}

/// Canonical JSON, base64 encoded: the value of `X-GEMINI-PAYLOAD`.
pub fn encode_payload(params: &RequestParams) -> Result<String, GeminiError> {
    let json = canonical_json(params)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Format a decimal in fixed notation without trailing zeros.
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}
