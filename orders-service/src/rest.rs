use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::otel_middleware::current_ids;
use crate::state::{AppState, FailureState};

const STATUS_CODE_OK: u8 = 0;
const STATUS_CODE_ERROR: u8 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: u32,
    pub product: String,
    pub amount: f64,
    pub status: String,
}

fn sample_orders() -> Vec<Order> {
    [
        (1, "Laptop", 999.99, "completed"),
        (2, "Phone", 599.99, "pending"),
        (3, "Tablet", 299.99, "completed"),
    ]
    .into_iter()
    .map(|(id, product, amount, status)| Order {
        id,
        product: product.to_string(),
        amount,
        status: status.to_string(),
    })
    .collect()
}

/// Telemetry fields echoed back in every response body.
#[derive(Debug, Serialize)]
pub struct Telemetry {
    pub trace_id: String,
    pub span_id: String,
    pub telemetry_available: bool,
    pub service_name: String,
    pub status_code: u8,
    pub timestamp: String,
}

impl Telemetry {
    fn capture(state: &AppState, status_code: u8) -> Self {
        let (trace_id, span_id, telemetry_available) = if state.failures.trace_failing() {
            tracing::warn!("Simulated trace failure, continuing with degraded telemetry");
            ("telemetry-failed".to_string(), "telemetry-failed".to_string(), false)
        } else {
            match current_ids() {
                Some((trace_id, span_id)) => (trace_id, span_id, true),
                None => ("no-trace".to_string(), "no-span".to_string(), false),
            }
        };

        Self {
            trace_id,
            span_id,
            telemetry_available,
            service_name: state.service_name.to_string(),
            status_code,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    telemetry: Telemetry,
}

#[derive(Debug, Serialize)]
struct OrdersResponse {
    orders: Vec<Order>,
    message: &'static str,
    #[serde(flatten)]
    telemetry: Telemetry,
}

#[derive(Debug, Serialize)]
struct FailureResponse {
    error: &'static str,
    #[serde(flatten)]
    telemetry: Telemetry,
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    fail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimulateQuery {
    mode: Option<String>,
}

#[derive(Debug, Serialize)]
struct SimulateResponse {
    message: &'static str,
    #[serde(flatten)]
    state: FailureState,
}

#[derive(Debug, Serialize)]
struct SimulateError {
    error: &'static str,
    current_state: FailureState,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let telemetry = Telemetry::capture(&state, STATUS_CODE_OK);
    tracing::info!(
        trace_id = %telemetry.trace_id,
        span_id = %telemetry.span_id,
        service.name = %telemetry.service_name,
        "Health check"
    );

    Json(HealthResponse {
        status: "ok",
        telemetry,
    })
}

// Handlers run directly inside the request span so the ids they report are
// the ones sent back in `traceparent`.
async fn get_orders(State(state): State<AppState>, Query(query): Query<OrdersQuery>) -> Response {
    if query.fail.as_deref() == Some("true") {
        let telemetry = Telemetry::capture(&state, STATUS_CODE_ERROR);
        tracing::error!(
            trace_id = %telemetry.trace_id,
            span_id = %telemetry.span_id,
            status.code = STATUS_CODE_ERROR,
            "Simulated failure"
        );
        tracing::Span::current().record("otel.status_code", "error");

        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(FailureResponse {
                error: "Simulated failure",
                telemetry,
            }),
        )
            .into_response();
    }

    let telemetry = Telemetry::capture(&state, STATUS_CODE_OK);
    let orders = sample_orders();
    tracing::info!(
        trace_id = %telemetry.trace_id,
        span_id = %telemetry.span_id,
        num_orders = orders.len(),
        "Orders request"
    );

    Json(OrdersResponse {
        orders,
        message: "Orders retrieved successfully",
        telemetry,
    })
    .into_response()
}

async fn simulate_failure(
    State(state): State<AppState>,
    Query(query): Query<SimulateQuery>,
) -> Response {
    match query.mode.as_deref() {
        Some("trace") => {
            let on = state.failures.toggle_trace();
            tracing::warn!(on, "Trace failure simulation toggled");
        }
        Some("metrics") => {
            let on = state.failures.toggle_metrics();
            tracing::warn!(on, "Metrics failure simulation toggled");
        }
        Some("reset") => {
            state.failures.reset();
            tracing::info!("All failure simulations reset");
        }
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SimulateError {
                    error: "Invalid mode. Use: trace, metrics, or reset",
                    current_state: state.failures.snapshot(),
                }),
            )
                .into_response();
        }
    }

    Json(SimulateResponse {
        message: "Failure simulation updated",
        state: state.failures.snapshot(),
    })
    .into_response()
}

pub fn order_service() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/orders", get(get_orders))
        .route("/simulate-failure", get(simulate_failure))
}
