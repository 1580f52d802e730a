use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use orders_service::AppState;
use otel_validator::ValidatorConfig;
use std::sync::Once;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

static INIT_TRACING: Once = Once::new();

/// Global subscriber with an OpenTelemetry layer, shared by the harness and
/// the in-process service. Nothing is exported; the layer only mints ids.
pub fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

        let provider = SdkTracerProvider::builder().build();
        opentelemetry::global::set_tracer_provider(provider.clone());

        let subscriber = Registry::default()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("integration_test")));

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set global tracing subscriber");
    });
}

/// An orders service bound to ephemeral ports on localhost.
pub struct RunningService {
    pub base_url: String,
    pub metrics_url: String,
    pub state: AppState,
}

impl RunningService {
    /// Harness config pointed at this service, counting tokio gauges as runtime metrics.
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            base_url: self.base_url.clone(),
            metrics_url: self.metrics_url.clone(),
            runtime_metric_markers: vec!["tokio".to_string()],
            ..ValidatorConfig::default()
        }
    }
}

pub async fn spawn_orders_service() -> RunningService {
    let state = AppState::new("orders-service").expect("app state");

    let app_listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind app listener");
    let metrics_listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind metrics listener");

    let base_url = format!("http://{}", app_listener.local_addr().expect("app addr"));
    let metrics_url = format!(
        "http://{}/metrics",
        metrics_listener.local_addr().expect("metrics addr")
    );

    let app = orders_service::router(state.clone());
    let metrics = orders_service::metrics_router(state.clone());
    tokio::spawn(async move {
        axum::serve(app_listener, app).await.expect("app server");
    });
    tokio::spawn(async move {
        axum::serve(metrics_listener, metrics)
            .await
            .expect("metrics server");
    });

    RunningService {
        base_url,
        metrics_url,
        state,
    }
}

/// A localhost URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    format!("http://{addr}")
}
