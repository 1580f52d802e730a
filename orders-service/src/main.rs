use anyhow::Result;
use orders_service::{metrics_router, resource, router, tracing_config, AppState};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::info;

const APP_PORT: u16 = 3001;
const METRICS_PORT: u16 = 9090;
const SERVICE_NAME: &str = "orders-service";

fn env_port(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load env vars
    dotenv::dotenv().ok();

    let service_name = std::env::var("SERVICE_NAME").unwrap_or_else(|_| SERVICE_NAME.to_string());
    let app_port = env_port("APP_PORT", APP_PORT);
    let metrics_port = env_port("METRICS_PORT", METRICS_PORT);

    let service_resource = resource::service_resource(&service_name);
    let tracer_provider = tracing_config::init_tracing(service_resource.clone())?;

    info!(
        attributes = ?resource::resource_labels(&service_resource),
        "OpenTelemetry initialized with resource attributes"
    );

    let state = AppState::with_resource(&service_name, &service_resource)?;

    let app_listener = tokio::net::TcpListener::bind(("0.0.0.0", app_port)).await?;
    let metrics_listener = tokio::net::TcpListener::bind(("0.0.0.0", metrics_port)).await?;

    info!(%service_name, "Health check: http://localhost:{app_port}/health");
    info!("Orders: http://localhost:{app_port}/orders");
    info!("Error test: http://localhost:{app_port}/orders?fail=true");
    info!("Failure control: http://localhost:{app_port}/simulate-failure?mode=trace|metrics|reset");
    info!("Metrics: http://localhost:{metrics_port}/metrics");

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut signal_terminate = signal(SignalKind::terminate())?;
    let mut signal_interrupt = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = signal_terminate.recv() => tracing::debug!("Received SIGTERM."),
            _ = signal_interrupt.recv() => tracing::debug!("Received SIGINT."),
        }
        let _ = stop_tx.send(true);
    });

    let app_server = axum::serve(app_listener, router(state.clone()))
        .with_graceful_shutdown(wait_for_shutdown(stop_rx.clone()));
    let metrics_server = axum::serve(metrics_listener, metrics_router(state))
        .with_graceful_shutdown(wait_for_shutdown(stop_rx));

    info!("Starting webserver");
    tokio::try_join!(
        async { app_server.await },
        async { metrics_server.await }
    )?;

    info!("Shutting down OpenTelemetry");
    if let Err(e) = tracer_provider.shutdown() {
        tracing::warn!(error = %e, "Failed to shut down tracer provider");
    }

    Ok(())
}
