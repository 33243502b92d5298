//! Web server module for the Wolfram|Alpha HTTP API

pub mod api;
pub mod state;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use state::AppState;
use wolfram_core::WolframClient;

/// Configuration for the web server
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
}

/// Start the web server
pub async fn serve(config: ServeConfig, client: WolframClient) -> Result<()> {
    let state = AppState::new(client);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting Wolfram|Alpha API server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Queries
        .route("/query", post(api::post_query))
        .route("/query/{*q}", get(api::quick_query))
        .route("/result/{*q}", get(api::get_result))
        .route("/pods/{*q}", get(api::get_pods))
        .route("/pod", post(api::post_pod))
        // Specialized
        .route("/math/{*q}", get(api::math_query))
        .route("/science/{*q}", get(api::science_query))
        .route("/validate", post(api::validate))
        .route("/stepbystep", post(api::step_by_step))
        .route("/plot", post(api::plot));

    Router::new()
        .route("/", get(api::home))
        .route("/health", get(api::health_check))
        .nest("/api", api_routes)
        .fallback(api::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
