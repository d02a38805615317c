//! Diabetes Risk Prediction Server
//!
//! Loads the trained pipeline and its decision threshold once at startup and
//! serves them over HTTP.
//!
//! # Routes
//!
//! ```text
//! GET  /         liveness check        -> {"status": "ok"}
//! POST /predict  one patient record    -> {"probability": f, "prediction": 0|1}
//! ```

mod config;
mod error;
mod extract;
mod handlers;
mod models;


use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use risk_core::InferenceEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "risk_server=debug,risk_core=info,tower_http=debug".into());
    let (json_layer, text_layer) = if config.is_production() {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!("Diabetes risk server starting ({})...", config.environment);

    // Artifacts are loaded exactly once; any problem aborts startup
    let engine = InferenceEngine::load(&config.model_path, &config.threshold_path)
        .context("failed to load model artifacts")?;
    tracing::info!(
        "Serving {} model with threshold {:.4}",
        engine.family(),
        engine.threshold().value()
    );

    let state = AppState { engine: Arc::new(engine) };
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
