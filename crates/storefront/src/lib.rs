//! ArtHive storefront library.
//!
//! The HTTP surface of the marketplace: catalog pages backed by the hosted
//! platform, a session-held cart, account and profile management, artist
//! submissions and admin moderation. The binary in `main.rs` only adds
//! Sentry and starts the server; everything else is built here so it can be
//! exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod moderation;
pub mod platform;
pub mod routes;
pub mod state;

use axum::{
    Router,
    extract::State,
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tower_sessions::MemoryStore;

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the platform is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.platform().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Build the application router with sessions, request IDs and tracing.
///
/// Sessions are kept in `session_store`; pass a fresh [`MemoryStore`] per
/// server (or per test).
pub fn build_app(state: AppState, session_store: MemoryStore) -> Router {
    let session_layer =
        middleware::create_session_layer(session_store, state.config().is_https());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(session_layer)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
