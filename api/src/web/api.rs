//! REST API handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::state::AppState;
use wolfram_core::{
    presets, Endpoint, FetchedQuery, ParamValue, PodMap, Query, QueryParams, QueryResult,
    WolframError, NO_RESULT,
};

const SERVICE_NAME: &str = "Wolfram|Alpha API Server";

/// Provider parameters accepted in a `POST /api/query` body
const PASS_THROUGH_PARAMS: &[&str] = &[
    "format",
    "includepodid",
    "excludepodid",
    "podtitle",
    "podindex",
    "scanner",
    "podtimeout",
    "scantimeout",
    "podstate",
    "assumption",
    "reinterpret",
    "translation",
    "ignorecase",
    "ip",
    "latlong",
    "location",
    "countrycode",
    "units",
    "width",
    "maxwidth",
    "plotwidth",
    "mag",
    "fontsize",
];

const ENDPOINTS: &[(&str, &str)] = &[
    ("GET /", "Service description"),
    ("GET /health", "Health check"),
    ("POST /api/query", "Full query; body {input, ...provider params}"),
    ("GET /api/query/<text>", "Quick query, provider JSON"),
    ("GET /api/result/<text>", "Primary result text"),
    ("GET /api/pods/<text>", "All text sections"),
    ("POST /api/pod", "Single pod; body {input, pod_id}"),
    ("GET /api/math/<text>", "Math query with step-by-step"),
    ("GET /api/science/<text>", "Science query"),
    ("POST /api/validate", "Validate a query; body {input}"),
    ("POST /api/stepbystep", "Step-by-step solution; body {input}"),
    ("POST /api/plot", "Plot; body {input, width?, height?}"),
];

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

// ============================================================================
// Envelopes
// ============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Pass-through provider data
///
/// `data` is the provider body untouched; `success` and `error` mirror the
/// provider's own verdict.
#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub query: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<QueryParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retried: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub data: Value,
    pub timestamp: String,
}

impl DataResponse {
    fn new(query: &str, data: Value) -> Self {
        Self {
            success: true,
            error: None,
            query: query.to_string(),
            kind: None,
            params: None,
            retried: None,
            width: None,
            height: None,
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Envelope for a parsed provider response
    fn from_result(query: &str, raw: Value, result: &QueryResult) -> Self {
        let mut response = Self::new(query, raw);
        if let Some(msg) = result.failure_message() {
            tracing::warn!(kind = "provider_failure", "Query failed: {}", msg);
            response.success = false;
            response.error = Some(format!("Query failed: {}", msg));
        }
        response
    }

    fn fetched(query: &str, fetched: FetchedQuery) -> Self {
        let mut response = Self::from_result(query, fetched.raw, &fetched.result);
        response.retried = Some(fetched.retried);
        response
    }

    fn kind(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// A single text result
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub success: bool,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_id: Option<String>,
    pub result: String,
}

/// Every text section, in provider order
#[derive(Debug, Serialize)]
pub struct PodsResponse {
    pub success: bool,
    pub query: String,
    pub pods: PodMap,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub uptime_seconds: i64,
}

// ============================================================================
// Error mapping
// ============================================================================

/// HTTP status for a query error
///
/// Provider failures and missing pods are logical outcomes, so they keep 200.
pub fn status_for(err: &WolframError) -> StatusCode {
    match err {
        WolframError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        WolframError::ProviderFailure(_) | WolframError::NotFound(_) => StatusCode::OK,
        WolframError::Transport(_) | WolframError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        WolframError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: WolframError, query: Option<&str>) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(kind = err.kind(), "Query failed: {}", err);
    } else {
        tracing::warn!(kind = err.kind(), "Query failed: {}", err);
    }

    let error = match &err {
        WolframError::ProviderFailure(msg) | WolframError::NotFound(msg) => {
            format!("Query failed: {}", msg)
        }
        other => other.to_string(),
    };

    (
        status,
        Json(ErrorResponse {
            success: false,
            error,
            kind: err.kind(),
            query: query.map(str::to_string),
        }),
    )
}

fn bad_body(rejection: JsonRejection) -> (StatusCode, Json<ErrorResponse>) {
    api_error(WolframError::InvalidInput(rejection.body_text()), None)
}

fn param_value(key: &str, value: &Value) -> Result<ParamValue, WolframError> {
    match value {
        Value::String(s) => Ok(ParamValue::Str(s.clone())),
        Value::Bool(b) => Ok(ParamValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(ParamValue::Int)
            .or_else(|| n.as_f64().map(ParamValue::Float))
            .ok_or_else(|| WolframError::InvalidInput(format!("parameter '{}' is out of range", key))),
        _ => Err(WolframError::InvalidInput(format!(
            "parameter '{}' must be a string, number or boolean",
            key
        ))),
    }
}

/// Split a query body into the query and its requested output type
fn query_from_body(body: &Map<String, Value>) -> Result<(Query, String), WolframError> {
    let input = body
        .get("input")
        .and_then(Value::as_str)
        .ok_or_else(|| WolframError::InvalidInput("missing required field 'input'".to_string()))?;

    let output = match body.get("output") {
        None => "json".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(WolframError::InvalidInput("'output' must be a string".to_string()));
        }
    };

    let mut params = QueryParams::new();
    for (key, value) in body {
        if PASS_THROUGH_PARAMS.contains(&key.as_str()) {
            params.set(key.clone(), param_value(key, value)?);
        } else if key != "input" && key != "output" {
            tracing::debug!("Ignoring unsupported parameter: {}", key);
        }
    }

    Ok((Query::with_params(input, params)?, output))
}

// ============================================================================
// Service info
// ============================================================================

/// Service description and endpoint list
pub async fn home() -> Json<Value> {
    let endpoints: Map<String, Value> = ENDPOINTS
        .iter()
        .map(|(route, what)| (route.to_string(), Value::from(*what)))
        .collect();

    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Signed Wolfram|Alpha queries with normalized results",
        "endpoints": endpoints,
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now.to_rfc3339(),
        uptime_seconds: (now - state.started_at).num_seconds(),
    })
}

/// Unknown route
pub async fn not_found() -> (StatusCode, Json<Value>) {
    let available: Vec<&str> = ENDPOINTS.iter().map(|(route, _)| *route).collect();
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Endpoint not found",
            "available_endpoints": available,
        })),
    )
}

// ============================================================================
// Queries
// ============================================================================

/// Full query with provider parameters
///
/// JSON output goes through the zero-pod fallback; any other output type is
/// returned as raw text.
pub async fn post_query(
    State(state): State<AppState>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<DataResponse> {
    let Json(body) = body.map_err(bad_body)?;
    let (query, output) = query_from_body(&body).map_err(|e| api_error(e, None))?;
    let passed = query.params().clone();

    let mut response = if output == "json" {
        let fetched = state
            .client
            .fetch_with_fallback(&query)
            .await
            .map_err(|e| api_error(e, Some(query.input())))?;
        DataResponse::fetched(query.input(), fetched)
    } else {
        let query = query
            .with_defaults(&QueryParams::new().with("format", "plaintext"))
            .overlay(&QueryParams::new().with("output", output.as_str()));
        let text = state
            .client
            .query_text(&query, Endpoint::Query)
            .await
            .map_err(|e| api_error(e, Some(query.input())))?;
        DataResponse::new(query.input(), Value::String(text))
    };

    response.params = Some(passed);
    Ok(Json(response))
}

/// Quick pass-through query
pub async fn quick_query(
    State(state): State<AppState>,
    Path(q): Path<String>,
) -> ApiResult<DataResponse> {
    let query = Query::new(q.as_str()).map_err(|e| api_error(e, Some(q.as_str())))?;
    let parsed = state
        .client
        .fetch(&query)
        .await
        .map_err(|e| api_error(e, Some(q.as_str())))?;
    Ok(Json(DataResponse::from_result(&q, parsed.raw, &parsed.result)))
}

/// Primary result text
pub async fn get_result(
    State(state): State<AppState>,
    Path(q): Path<String>,
) -> ApiResult<ResultResponse> {
    let result = state
        .client
        .simple_result(&q)
        .await
        .and_then(|lookup| lookup.into_result(NO_RESULT))
        .map_err(|e| api_error(e, Some(q.as_str())))?;

    Ok(Json(ResultResponse {
        success: true,
        query: q,
        pod_id: None,
        result,
    }))
}

/// All text sections
pub async fn get_pods(
    State(state): State<AppState>,
    Path(q): Path<String>,
) -> ApiResult<PodsResponse> {
    let query = Query::new(q.as_str()).map_err(|e| api_error(e, Some(q.as_str())))?;
    let pods = state
        .client
        .sections(&query)
        .await
        .and_then(|lookup| lookup.into_result(NO_RESULT))
        .map_err(|e| api_error(e, Some(q.as_str())))?;

    Ok(Json(PodsResponse {
        success: true,
        query: q,
        pods,
    }))
}

/// Single pod request
#[derive(Debug, Deserialize)]
pub struct PodRequest {
    pub input: String,
    pub pod_id: String,
}

/// Text of one pod, selected by id
pub async fn post_pod(
    State(state): State<AppState>,
    body: Result<Json<PodRequest>, JsonRejection>,
) -> ApiResult<ResultResponse> {
    let Json(req) = body.map_err(bad_body)?;
    Query::new(req.input.as_str()).map_err(|e| api_error(e, None))?;

    let missing = format!("pod '{}' has no text", req.pod_id);
    let result = state
        .client
        .pod_by_id(&req.input, &req.pod_id)
        .await
        .and_then(|lookup| lookup.into_result(&missing))
        .map_err(|e| api_error(e, Some(req.input.as_str())))?;

    Ok(Json(ResultResponse {
        success: true,
        query: req.input,
        pod_id: Some(req.pod_id),
        result,
    }))
}

// ============================================================================
// Specialized queries
// ============================================================================

/// Math query: results, solutions and plots with step-by-step expanded
pub async fn math_query(
    State(state): State<AppState>,
    Path(q): Path<String>,
) -> ApiResult<DataResponse> {
    let query = Query::with_params(q.as_str(), presets::math()).map_err(|e| api_error(e, Some(q.as_str())))?;
    let parsed = state
        .client
        .fetch(&query)
        .await
        .map_err(|e| api_error(e, Some(q.as_str())))?;
    Ok(Json(DataResponse::from_result(&q, parsed.raw, &parsed.result).kind("math")))
}

/// Science query
pub async fn science_query(
    State(state): State<AppState>,
    Path(q): Path<String>,
) -> ApiResult<DataResponse> {
    let query = Query::new(q.as_str()).map_err(|e| api_error(e, Some(q.as_str())))?;
    let parsed = state
        .client
        .fetch(&query)
        .await
        .map_err(|e| api_error(e, Some(q.as_str())))?;
    Ok(Json(DataResponse::from_result(&q, parsed.raw, &parsed.result).kind("science")))
}

/// Body carrying only the query text
#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub input: String,
}

/// Check whether the provider can interpret a query
pub async fn validate(
    State(state): State<AppState>,
    body: Result<Json<InputRequest>, JsonRejection>,
) -> ApiResult<DataResponse> {
    let Json(req) = body.map_err(bad_body)?;
    let parsed = state
        .client
        .validate(&req.input)
        .await
        .map_err(|e| api_error(e, Some(req.input.as_str())))?;
    Ok(Json(
        DataResponse::from_result(&req.input, parsed.raw, &parsed.result).kind("validate"),
    ))
}

/// Step-by-step solution pods
pub async fn step_by_step(
    State(state): State<AppState>,
    body: Result<Json<InputRequest>, JsonRejection>,
) -> ApiResult<DataResponse> {
    let Json(req) = body.map_err(bad_body)?;
    let fetched = state
        .client
        .step_by_step(&req.input)
        .await
        .map_err(|e| api_error(e, Some(req.input.as_str())))?;
    Ok(Json(DataResponse::fetched(&req.input, fetched).kind("stepbystep")))
}

fn default_width() -> u32 {
    400
}

fn default_height() -> u32 {
    300
}

/// Plot request
#[derive(Debug, Deserialize)]
pub struct PlotRequest {
    pub input: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

/// Plot pods at the requested width
pub async fn plot(
    State(state): State<AppState>,
    body: Result<Json<PlotRequest>, JsonRejection>,
) -> ApiResult<DataResponse> {
    let Json(req) = body.map_err(bad_body)?;
    let fetched = state
        .client
        .plot(&req.input, req.width)
        .await
        .map_err(|e| api_error(e, Some(req.input.as_str())))?;

    let mut response = DataResponse::fetched(&req.input, fetched).kind("plot");
    response.width = Some(req.width);
    response.height = Some(req.height);
    Ok(Json(response))
}
