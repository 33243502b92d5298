//! Query and provider parameter types
//!
//! A [`Query`] is a non-empty input string plus an ordered, key-unique set of
//! optional provider parameters. Values are rendered to strings only when the
//! request is signed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{WolframError, WolframResult};

/// A single provider parameter value
///
/// Deserializes untagged so JSON request bodies can pass values straight through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

/// Ordered provider parameters with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`QueryParams::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a parameter, replacing in place if the key already exists
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Overlay `other` on top of `self`; values from `other` win
    pub fn merged(&self, other: &QueryParams) -> QueryParams {
        let mut out = self.clone();
        for (k, v) in other.iter() {
            out.set(k, v.clone());
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

impl Serialize for QueryParams {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QueryParams {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = indexmap::IndexMap::<String, ParamValue>::deserialize(deserializer)?;
        Ok(map.into_iter().collect())
    }
}

/// A validated query: non-empty input plus optional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    input: String,
    params: QueryParams,
}

impl Query {
    /// Create a query with no extra parameters
    pub fn new(input: impl Into<String>) -> WolframResult<Self> {
        Self::with_params(input, QueryParams::new())
    }

    /// Create a query, rejecting empty or whitespace-only input
    pub fn with_params(input: impl Into<String>, params: QueryParams) -> WolframResult<Self> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(WolframError::InvalidInput(
                "query input must not be empty".to_string(),
            ));
        }
        Ok(Self { input, params })
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// A copy of this query with extra parameters overlaid
    pub fn overlay(&self, extra: &QueryParams) -> Query {
        Query {
            input: self.input.clone(),
            params: self.params.merged(extra),
        }
    }

    /// A copy of this query whose own parameters win over `defaults`
    pub fn with_defaults(&self, defaults: &QueryParams) -> Query {
        Query {
            input: self.input.clone(),
            params: defaults.merged(&self.params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(Query::new(""), Err(WolframError::InvalidInput(_))));
        assert!(matches!(Query::new("   \n"), Err(WolframError::InvalidInput(_))));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut params = QueryParams::new()
            .with("format", "plaintext")
            .with("output", "json");
        params.set("format", "image");

        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["format", "output"]);
        assert_eq!(params.get("format"), Some(&ParamValue::from("image")));
    }

    #[test]
    fn test_value_rendering() {
        assert_eq!(ParamValue::from(true).to_string(), "true");
        assert_eq!(ParamValue::from(10i64).to_string(), "10");
        assert_eq!(ParamValue::from(1.5).to_string(), "1.5");
        assert_eq!(ParamValue::from("a,b").to_string(), "a,b");
    }

    #[test]
    fn test_with_defaults_caller_wins() {
        let defaults = QueryParams::new().with("podtimeout", 10i64).with("format", "plaintext,image");
        let query = Query::with_params("pi", QueryParams::new().with("format", "plaintext")).unwrap();

        let merged = query.with_defaults(&defaults);
        assert_eq!(merged.params().get("format"), Some(&ParamValue::from("plaintext")));
        assert_eq!(merged.params().get("podtimeout"), Some(&ParamValue::Int(10)));
    }

    #[test]
    fn test_deserialize_untagged_values() {
        let params: QueryParams =
            serde_json::from_str(r#"{"width": 400, "reinterpret": true, "units": "metric"}"#).unwrap();
        assert_eq!(params.get("width"), Some(&ParamValue::Int(400)));
        assert_eq!(params.get("reinterpret"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("units"), Some(&ParamValue::from("metric")));
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["width", "reinterpret", "units"]);
    }
}
