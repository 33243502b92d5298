//! Route tests against an in-memory transport

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use wolfram_api::{create_router, AppState};
use wolfram_core::{
    QueryDefaults, RequestSigner, Transport, WolframClient, WolframError, WolframResult,
};

struct ScriptedTransport {
    responses: Mutex<VecDeque<WolframResult<String>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<WolframResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn replying(bodies: &[&str]) -> Arc<Self> {
        Self::new(bodies.iter().map(|b| Ok(b.to_string())).collect())
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn get(&self, url: &str) -> WolframResult<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(WolframError::Transport("no scripted response".into())))
    }
}

const TWO_PLUS_TWO: &str = r#"{"queryresult": {"success": true, "numpods": 2, "pods": [
    {"title": "Input", "id": "Input", "subpods": [{"plaintext": "2 + 2"}]},
    {"title": "Result", "id": "Result", "subpods": [{"plaintext": "4"}]}
]}}"#;

const RESULT_ONLY: &str = r#"{"queryresult": {"success": true, "numpods": 1, "pods": [
    {"title": "Result", "id": "Result", "subpods": [{"plaintext": "4"}]}
]}}"#;

const EMPTY: &str = r#"{"queryresult": {"success": true, "numpods": 0}}"#;

const FAILED: &str = r#"{"queryresult": {"success": false, "error": false}}"#;

const INVALID_APPID: &str =
    r#"{"queryresult": {"success": false, "error": {"code": "1", "msg": "Invalid appid"}}}"#;

fn app(transport: Arc<ScriptedTransport>) -> Router {
    let client = WolframClient::new(
        RequestSigner::new("api.wolframalpha.com", "TEST-APPID", "fixture-salt"),
        transport,
        QueryDefaults::default(),
    );
    create_router(AppState::new(client))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app(ScriptedTransport::replying(&[])), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "Wolfram|Alpha API Server");
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_home_lists_endpoints() {
    let (status, body) = get(app(ScriptedTransport::replying(&[])), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"]["POST /api/query"].is_string());
}

#[tokio::test]
async fn test_empty_input_is_rejected_before_any_call() {
    let transport = ScriptedTransport::replying(&[]);

    let (status, body) = post(app(transport.clone()), "/api/query", json!({"input": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "invalid_input");

    let (status, _) = post(app(transport.clone()), "/api/pod", json!({"input": "", "pod_id": "Result"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(app(transport.clone()), "/api/validate", json!({"input": " "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for uri in [
        "/api/query/%20",
        "/api/result/%20",
        "/api/pods/%20",
        "/api/math/%20",
        "/api/science/%20",
    ] {
        let (status, body) = get(app(transport.clone()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["kind"], "invalid_input");
    }

    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_unparsable_body_is_bad_request() {
    let transport = ScriptedTransport::replying(&[]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/query")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app(transport.clone()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = post(app(transport.clone()), "/api/pod", json!({"input": "2+2"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_result_route() {
    let transport = ScriptedTransport::replying(&[RESULT_ONLY]);
    let (status, body) = get(app(transport.clone()), "/api/result/2%2B2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["query"], "2+2");
    assert_eq!(body["result"], "4");
    assert!(transport.calls()[0].contains("includepodid=Result"));
}

#[tokio::test]
async fn test_provider_failure_is_ok_with_message() {
    let (status, body) = get(app(ScriptedTransport::replying(&[FAILED])), "/api/pods/asdfgh").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Query failed: Wolfram|Alpha did not understand your input");
    assert_eq!(body["query"], "asdfgh");
}

#[tokio::test]
async fn test_pass_through_routes_carry_provider_failure() {
    let (status, body) = post(
        app(ScriptedTransport::replying(&[INVALID_APPID, INVALID_APPID])),
        "/api/query",
        json!({"input": "2+2"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Query failed: Invalid appid");
    assert_eq!(body["data"]["queryresult"]["error"]["msg"], "Invalid appid");

    for uri in ["/api/query/2%2B2", "/api/math/2%2B2", "/api/science/2%2B2"] {
        let (status, body) = get(app(ScriptedTransport::replying(&[INVALID_APPID])), uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["success"], false, "{}", uri);
        assert_eq!(body["error"], "Query failed: Invalid appid", "{}", uri);
        assert!(body["data"]["queryresult"].is_object());
    }

    let (_, body) = get(app(ScriptedTransport::replying(&[TWO_PLUS_TWO])), "/api/query/2%2B2").await;
    assert_eq!(body["success"], true);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_pods_route_keeps_order() {
    let (status, body) = get(app(ScriptedTransport::replying(&[TWO_PLUS_TWO])), "/api/pods/2%2B2").await;

    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = body["pods"].as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Input (Input)", "Result (Result)"]);
}

#[tokio::test]
async fn test_missing_pod_is_ok_with_message() {
    let (status, body) = post(
        app(ScriptedTransport::replying(&[TWO_PLUS_TWO])),
        "/api/pod",
        json!({"input": "2+2", "pod_id": "NonexistentPodId"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_upstream_failures_are_bad_gateway() {
    let transport = ScriptedTransport::new(vec![Err(WolframError::Transport("connection refused".into()))]);
    let (status, body) = get(app(transport), "/api/query/2%2B2").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "transport_error");

    let (status, body) = get(app(ScriptedTransport::replying(&["<html>oops</html>"])), "/api/science/H2O").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "malformed_response");
}

#[tokio::test]
async fn test_post_query_uses_fallback() {
    let transport = ScriptedTransport::replying(&[EMPTY, TWO_PLUS_TWO]);
    let (status, body) = post(
        app(transport.clone()),
        "/api/query",
        json!({"input": "2+2", "podtimeout": 20, "unsupported": "x"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["retried"], true);
    assert_eq!(body["data"]["queryresult"]["numpods"], 2);
    assert_eq!(body["params"]["podtimeout"], 20);
    assert!(body["params"].get("unsupported").is_none());

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].contains("podtimeout=20"));
    assert!(calls[1].contains("podtimeout=15"));
    assert!(calls[1].contains("translation=true"));
}

#[tokio::test]
async fn test_post_query_plaintext_output_is_raw() {
    let transport = ScriptedTransport::replying(&["4"]);
    let (status, body) = post(
        app(transport.clone()),
        "/api/query",
        json!({"input": "2+2", "output": "plaintext"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "4");
    let call = &transport.calls()[0];
    assert!(call.contains("format=plaintext"));
    assert!(call.contains("output=plaintext"));
}

#[tokio::test]
async fn test_math_route_expands_step_by_step() {
    let transport = ScriptedTransport::replying(&[TWO_PLUS_TWO]);
    let (status, body) = get(app(transport.clone()), "/api/math/x%5E2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "math");
    let call = &transport.calls()[0];
    assert!(call.contains("includepodid=Result%2CSolution%2CPlot"));
    assert!(call.contains("podstate=Solution__Step-by-step+solution"));
}

#[tokio::test]
async fn test_plot_defaults() {
    let transport = ScriptedTransport::replying(&[TWO_PLUS_TWO]);
    let (status, body) = post(app(transport.clone()), "/api/plot", json!({"input": "sin x"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "plot");
    assert_eq!(body["width"], 400);
    assert_eq!(body["height"], 300);
    assert_eq!(body["retried"], false);
    let call = &transport.calls()[0];
    assert!(call.contains("plotwidth=400"));
    assert!(call.contains("podtimeout=10"));
    assert!(call.contains("scantimeout=5"));
}

#[tokio::test]
async fn test_step_by_step_route_retries_once() {
    let transport = ScriptedTransport::replying(&[EMPTY, TWO_PLUS_TWO]);
    let (status, body) = post(app(transport.clone()), "/api/stepbystep", json!({"input": "x^2 = 4"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "stepbystep");
    assert_eq!(body["success"], true);
    assert_eq!(body["retried"], true);

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].contains("podstate=Solution__Step-by-step+solution"));
    assert!(calls[0].contains("podtimeout=10"));
    assert!(calls[1].contains("podtimeout=15"));
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, body) = get(app(ScriptedTransport::replying(&[])), "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["available_endpoints"].as_array().unwrap().len() > 5);
}
