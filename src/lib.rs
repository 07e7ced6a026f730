//! OCR Relay Server Library
//!
//! Accepts batches of images (data URLs, bare base64 or remote URLs), relays
//! each one to a hosted OCR provider with bounded concurrency, and returns the
//! extracted text and keywords per image in input order.
//!
//! # Modules
//!
//! - `ocr`: image normalization, keyword extraction, provider client and the batch relay
//! - `routes`: HTTP endpoints
//! - `config`, `error`, `state`: ambient server plumbing

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod ocr;
pub mod routes;
pub mod state;

use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config().server.max_body_bytes;

    Router::new()
        .nest("/health", routes::health::router())
        .nest("/api/health", routes::health::router())
        .nest("/api/ocr", routes::ocr::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
