//! Demo orders API instrumented with OpenTelemetry.
//!
//! Every JSON response echoes the request's trace id and span id, `/orders?fail=true`
//! produces an error span, and request metrics are served in Prometheus text
//! format from a separate router, together with the service's OpenTelemetry
//! resource attributes as `target_info`.

pub mod metrics;
pub mod otel_middleware;
pub mod resource;
pub mod rest;
pub mod state;
pub mod tracing_config;


use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    rest::order_service()
        // start OpenTelemetry trace on incoming request and echo it in the response
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            otel_middleware::otel_request_layer,
        ))
        .with_state(state)
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.failures.metrics_failing() {
        tracing::warn!("Simulated metrics exporter failure");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            "metrics exporter unavailable\n".to_string(),
        );
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render(),
    )
}

/// Served on its own listener, outside the traced API.
pub fn metrics_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
