//! Error taxonomy for Wolfram|Alpha queries
//!
//! Every failure a query can hit maps onto one variant here. Facades decide
//! how to surface them (structured envelope, sentinel text, or propagation).

/// Errors produced while building, sending, or interpreting a query
#[derive(Debug, thiserror::Error)]
pub enum WolframError {
    /// The provider could not be reached (network, DNS, timeout, non-2xx)
    #[error("provider unreachable: {0}")]
    Transport(String),

    /// The provider answered but declared the query unresolvable
    #[error("{0}")]
    ProviderFailure(String),

    /// The response body was not the JSON shape we expect
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The query succeeded but the requested pod or subpod is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected at the boundary before any network call
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing or unreadable configuration
    #[error("config error: {0}")]
    Config(String),
}

impl WolframError {
    /// Short machine-friendly tag, used in logs and JSON envelopes
    pub fn kind(&self) -> &'static str {
        match self {
            WolframError::Transport(_) => "transport_error",
            WolframError::ProviderFailure(_) => "provider_failure",
            WolframError::MalformedResponse(_) => "malformed_response",
            WolframError::NotFound(_) => "not_found",
            WolframError::InvalidInput(_) => "invalid_input",
            WolframError::Config(_) => "config_error",
        }
    }
}

impl From<reqwest::Error> for WolframError {
    fn from(err: reqwest::Error) -> Self {
        WolframError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for WolframError {
    fn from(err: serde_json::Error) -> Self {
        WolframError::MalformedResponse(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type WolframResult<T> = Result<T, WolframError>;
