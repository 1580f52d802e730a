use anyhow::Result;
use otel_validator::{tracing_config, Validator, ValidatorConfig, Verdict};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load env vars
    dotenv::dotenv().ok();

    let config = ValidatorConfig::from_env();
    let tracing_guard = tracing_config::init_tracing(&config.service_name)?;

    info!(base_url = %config.base_url, metrics_url = %config.metrics_url, "Starting validation");

    let mut validator = Validator::new(config)?;
    let summary = validator.run_comprehensive_test().await;

    info!("Shutting down OpenTelemetry");
    tracing_guard.shutdown();

    if summary.verdict() == Verdict::Fail {
        std::process::exit(1);
    }
    Ok(())
}
