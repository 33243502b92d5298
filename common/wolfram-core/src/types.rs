//! Response model for Wolfram|Alpha queries
//!
//! The provider's JSON is parsed once into explicit records. Raw JSON is kept
//! alongside for callers that pass the response through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WolframError, WolframResult};

/// Message used when the provider fails without saying why
pub const DID_NOT_UNDERSTAND: &str = "Wolfram|Alpha did not understand your input";

/// Parsed `queryresult`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Overall success flag
    pub success: bool,
    /// Provider error message; always set when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Pod count reported by the provider, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numpods: Option<u32>,
    /// The input as the provider understood it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_string: Option<String>,
    /// Pods that did not finish in time (comma-separated ids)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<String>,
    pub pods: Vec<Pod>,
}

/// A named section of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanner: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub subpods: Vec<Subpod>,
}

/// Smallest unit of pod content; images are not retained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subpod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub plaintext: Option<String>,
}

impl Subpod {
    /// Plain text, treating an empty string as absent
    pub fn text(&self) -> Option<&str> {
        self.plaintext.as_deref().filter(|t| !t.is_empty())
    }
}

impl Pod {
    /// Non-empty plaintexts in subpod order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.subpods.iter().filter_map(Subpod::text)
    }

    /// Composite label used as a section key
    pub fn label(&self) -> String {
        format!("{} ({})", self.title, self.id)
    }
}

impl QueryResult {
    /// Number of result sections, preferring the provider's own count
    pub fn section_count(&self) -> usize {
        self.numpods
            .map(|n| n as usize)
            .unwrap_or(self.pods.len())
    }

    /// Failure message, if the query was not successful
    pub fn failure_message(&self) -> Option<&str> {
        if self.success {
            None
        } else {
            Some(self.error.as_deref().unwrap_or(DID_NOT_UNDERSTAND))
        }
    }
}

/// Provider `error` may be `false`, a string, or `{code, msg}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawError {
    Flag(bool),
    Text(String),
    Detail {
        #[serde(default)]
        code: Option<Value>,
        #[serde(default)]
        msg: Option<String>,
    },
}

impl RawError {
    fn message(self) -> Option<String> {
        match self {
            RawError::Flag(_) => None,
            RawError::Text(text) if text.is_empty() => None,
            RawError::Text(text) => Some(text),
            RawError::Detail { msg: Some(msg), .. } => Some(msg),
            RawError::Detail { code: Some(code), .. } => Some(format!("error code {}", code)),
            RawError::Detail { .. } => None,
        }
    }
}

/// `numpods` arrives as a number or a numeric string depending on endpoint
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCount {
    Num(u32),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawQueryResult {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<RawError>,
    #[serde(default)]
    numpods: Option<RawCount>,
    #[serde(default)]
    inputstring: Option<String>,
    #[serde(default)]
    timedout: Option<String>,
    #[serde(default)]
    pods: Vec<Pod>,
}

impl From<RawQueryResult> for QueryResult {
    fn from(raw: RawQueryResult) -> Self {
        let mut error = raw.error.and_then(RawError::message);
        if !raw.success && error.is_none() {
            error = Some(DID_NOT_UNDERSTAND.to_string());
        }

        let numpods = raw.numpods.and_then(|count| match count {
            RawCount::Num(n) => Some(n),
            RawCount::Text(s) => s.trim().parse().ok(),
        });

        QueryResult {
            success: raw.success,
            error,
            numpods,
            input_string: raw.inputstring.filter(|s| !s.is_empty()),
            timed_out: raw.timedout.filter(|s| !s.is_empty()),
            pods: raw.pods,
        }
    }
}

/// A response parsed both ways
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    /// The provider JSON, untouched
    pub raw: Value,
    /// The typed record
    pub result: QueryResult,
}

/// Parse and validate a full-query response body
pub fn parse_response(body: &str) -> WolframResult<ParsedResponse> {
    let raw: Value = serde_json::from_str(body)?;
    let result = extract(&raw, "queryresult")?;
    Ok(ParsedResponse { raw, result })
}

/// Parse and validate a validatequery response body
pub fn parse_validation(body: &str) -> WolframResult<ParsedResponse> {
    let raw: Value = serde_json::from_str(body)?;
    let result = extract(&raw, "validatequeryresult")?;
    Ok(ParsedResponse { raw, result })
}

fn extract(raw: &Value, root: &str) -> WolframResult<QueryResult> {
    let inner = raw
        .get(root)
        .filter(|v| v.is_object())
        .ok_or_else(|| WolframError::MalformedResponse(format!("missing '{}' object", root)))?;

    let parsed: RawQueryResult = serde_json::from_value(inner.clone())
        .map_err(|e| WolframError::MalformedResponse(format!("unexpected '{}' shape: {}", root, e)))?;

    Ok(parsed.into())
}
