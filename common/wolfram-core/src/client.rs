//! Wolfram|Alpha client
//!
//! [`WolframClient`] is constructed explicitly with its signer, transport and
//! query defaults. It holds no mutable state, so one instance (or clones of
//! it) can serve any number of concurrent queries.
//!
//! Two failure policies are offered side by side:
//! - best-effort methods return [`Lookup`] so facades can render provider
//!   failures and missing pods as messages
//! - strict methods (`*_strict`, [`Lookup::into_result`]) raise them as
//!   [`WolframError`] for library-style callers

use serde_json::Value;
use std::sync::Arc;

use crate::config::{Config, QueryDefaults};
use crate::error::{WolframError, WolframResult};
use crate::normalize::{self, check_success, Lookup, PodMap};
use crate::params::{Query, QueryParams};
use crate::presets;
use crate::signer::{Endpoint, RequestSigner};
use crate::transport::{HttpTransport, Transport};
use crate::types::{parse_response, parse_validation, ParsedResponse, QueryResult};

/// Sentinel returned by convenience calls when the requested text is absent
pub const NO_RESULT: &str = "No result found";

/// A full query response plus whether the zero-pod fallback was used
#[derive(Debug, Clone)]
pub struct FetchedQuery {
    pub raw: Value,
    pub result: QueryResult,
    pub retried: bool,
}

/// Signed query client
#[derive(Clone)]
pub struct WolframClient {
    signer: RequestSigner,
    transport: Arc<dyn Transport>,
    defaults: QueryDefaults,
}

impl WolframClient {
    /// Build a client with the reqwest transport from validated config
    pub fn from_config(config: &Config) -> WolframResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.provider)?;
        Ok(Self::new(
            RequestSigner::from_config(&config.provider),
            Arc::new(transport),
            config.query.clone(),
        ))
    }

    pub fn new(signer: RequestSigner, transport: Arc<dyn Transport>, defaults: QueryDefaults) -> Self {
        Self {
            signer,
            transport,
            defaults,
        }
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    // ========================================================================
    // Raw access
    // ========================================================================

    /// Sign and send, returning the body as-is
    pub async fn query_text(&self, query: &Query, endpoint: Endpoint) -> WolframResult<String> {
        let signed = self.signer.sign(endpoint, query);
        tracing::info!(input = %query.input(), endpoint = endpoint.path(), "querying provider");
        self.transport.get(&signed.url).await
    }

    /// JSON query, parsed both ways
    ///
    /// Asks for plaintext unless the caller picked a `format`; `output=json`
    /// is always forced.
    pub async fn fetch(&self, query: &Query) -> WolframResult<ParsedResponse> {
        let query = query
            .with_defaults(&QueryParams::new().with("format", "plaintext"))
            .overlay(&QueryParams::new().with("output", "json"));
        let body = self.query_text(&query, Endpoint::Query).await?;
        parse_response(&body)
    }

    /// Pass-through JSON for a query
    pub async fn query(&self, query: &Query) -> WolframResult<Value> {
        Ok(self.fetch(query).await?.raw)
    }

    /// The validatequery endpoint, parsed both ways
    pub async fn validate(&self, input: &str) -> WolframResult<ParsedResponse> {
        let query = Query::with_params(input, QueryParams::new().with("output", "json"))?;
        let body = self.query_text(&query, Endpoint::ValidateQuery).await?;
        parse_validation(&body)
    }

    // ========================================================================
    // Full queries
    // ========================================================================

    /// Best-effort: provider failures come back as [`Lookup::ProviderFailure`]
    pub async fn fetch_full(&self, query: &Query) -> WolframResult<Lookup<QueryResult>> {
        let parsed = self.fetch(query).await?;
        Ok(check_success(parsed.result))
    }

    /// Strict: provider failures are raised as [`WolframError::ProviderFailure`]
    pub async fn fetch_full_strict(&self, query: &Query) -> WolframResult<QueryResult> {
        self.fetch_full(query).await?.into_result("query result")
    }

    /// Full query with the configured defaults and a single zero-pod retry
    ///
    /// When the first response reports no sections the query is re-sent once
    /// with [`presets::fallback_retry`]. The retry is only kept if it found
    /// something; otherwise the first response is returned.
    pub async fn fetch_with_fallback(&self, query: &Query) -> WolframResult<FetchedQuery> {
        let first_query = query.with_defaults(&self.defaults.to_params());
        let first = self.fetch(&first_query).await?;

        if first.result.section_count() > 0 {
            return Ok(FetchedQuery {
                raw: first.raw,
                result: first.result,
                retried: false,
            });
        }

        tracing::info!(input = %query.input(), "no pods in first response, retrying with relaxed parameters");
        let retry_query = first_query.overlay(&presets::fallback_retry());
        let retry = self.fetch(&retry_query).await?;

        if retry.result.section_count() > 0 {
            tracing::info!(pods = retry.result.section_count(), "retry returned pods");
            Ok(FetchedQuery {
                raw: retry.raw,
                result: retry.result,
                retried: true,
            })
        } else {
            tracing::info!("retry still empty, keeping first response");
            Ok(FetchedQuery {
                raw: first.raw,
                result: first.result,
                retried: true,
            })
        }
    }

    // ========================================================================
    // Normalized lookups
    // ========================================================================

    /// First subpod text of the first pod
    pub async fn primary_text(&self, query: &Query) -> WolframResult<Lookup<String>> {
        let result = self.fetch(query).await?.result;
        Ok(normalize::first_pod_text(&result))
    }

    /// Re-query constrained to one pod and return its first subpod text
    pub async fn pod_by_id(&self, input: &str, pod_id: &str) -> WolframResult<Lookup<String>> {
        if pod_id.trim().is_empty() {
            return Err(WolframError::InvalidInput("pod id must not be empty".to_string()));
        }
        let query = Query::with_params(input, QueryParams::new().with("includepodid", pod_id))?;
        let result = self.fetch(&query).await?.result;
        Ok(normalize::pod_text(&result, pod_id))
    }

    /// Every textual pod, keyed `"{title} ({id})"`
    pub async fn sections(&self, query: &Query) -> WolframResult<Lookup<PodMap>> {
        let result = self.fetch(query).await?.result;
        Ok(check_success(result).map(|r| normalize::all_pods_as_map(&r)))
    }

    /// Primary result pod only, positional first text
    pub async fn simple_result(&self, input: &str) -> WolframResult<Lookup<String>> {
        let query = Query::with_params(input, presets::simple())?;
        self.primary_text(&query).await
    }

    /// Step-by-step solution pods, with the full-query defaults and fallback
    pub async fn step_by_step(&self, input: &str) -> WolframResult<FetchedQuery> {
        let query = Query::with_params(input, presets::step_by_step())?;
        self.fetch_with_fallback(&query).await
    }

    /// Plot pods at `width`, with the full-query defaults and fallback
    pub async fn plot(&self, input: &str, width: u32) -> WolframResult<FetchedQuery> {
        let query = Query::with_params(input, presets::plot(width))?;
        self.fetch_with_fallback(&query).await
    }

    // ========================================================================
    // Function-call convenience surface
    //
    // Transport and malformed-response errors propagate; provider failures
    // and missing pods become sentinel text inside the Ok value.
    // ========================================================================

    /// Primary text, or a sentinel message
    pub async fn get_primary_text(&self, input: &str) -> WolframResult<String> {
        let query = Query::new(input)?;
        Ok(sentinel(self.primary_text(&query).await?))
    }

    /// Text of a specific pod, or a sentinel message
    pub async fn get_result_text(&self, input: &str, pod_id: &str) -> WolframResult<String> {
        Query::new(input)?;
        Ok(sentinel(self.pod_by_id(input, pod_id).await?))
    }

    /// All textual sections; a provider failure becomes a single `error` entry
    pub async fn get_all_sections(&self, input: &str) -> WolframResult<PodMap> {
        let query = Query::new(input)?;
        match self.sections(&query).await? {
            Lookup::Found(map) => Ok(map),
            Lookup::NotFound => Ok(PodMap::new()),
            Lookup::ProviderFailure(msg) => {
                let mut map = PodMap::new();
                map.insert("error".to_string(), vec![format!("Query failed: {}", msg)]);
                Ok(map)
            }
        }
    }
}

fn sentinel(lookup: Lookup<String>) -> String {
    match lookup {
        Lookup::Found(text) => text,
        Lookup::NotFound => NO_RESULT.to_string(),
        Lookup::ProviderFailure(msg) => format!("Query failed: {}", msg),
    }
}
