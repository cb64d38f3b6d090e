//! Route table and middleware

use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        // Gate endpoint
        .route("/api", get(handlers::gate))
        // Health checks
        .route("/health/live", get(handlers::health_live))
        .route("/health/ready", get(handlers::health_ready))
        // Metrics
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
