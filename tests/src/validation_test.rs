use integration_tests::{closed_port_url, init_test_tracing, spawn_orders_service};
use opentelemetry::trace::TraceContextExt;
use otel_validator::checks::check_endpoint;
use otel_validator::summary::MetricsOutcome;
use otel_validator::{ExpectedAttribute, Validator, ValidatorConfig, Verdict};
use std::time::Duration;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[tokio::test]
async fn test_full_run_against_orders_service_passes() {
    init_test_tracing();
    let service = spawn_orders_service().await;

    let mut validator = Validator::new(service.validator_config()).expect("http client");
    let summary = validator.run_comprehensive_test().await;

    assert_eq!(summary.total_tests, 3);
    assert_eq!(summary.passed_tests, 3);
    assert!(summary.traces_unique());
    assert_eq!(summary.verdict(), Verdict::Pass);
    assert!(matches!(summary.metrics, MetricsOutcome::Working { total_metrics } if total_metrics > 0));

    let results = validator.results();
    assert_eq!(results[2].endpoint, "/orders?fail=true");
    assert_eq!(results[2].http_status, 500);
    assert_eq!(results[2].status_code, Some(serde_json::json!(2)));
    for result in results {
        assert_eq!(
            result.trace_matches_header(),
            Some(true),
            "traceparent disagrees with body for {}",
            result.endpoint
        );
    }

    println!("✅ Full validation run passed");
}

#[tokio::test]
async fn test_metrics_report_counts_service_metrics() {
    init_test_tracing();
    let service = spawn_orders_service().await;
    let mut validator = Validator::new(service.validator_config()).expect("http client");

    validator.run_comprehensive_test().await;
    let report = validator
        .test_metrics_endpoint()
        .await
        .expect("metrics endpoint reachable");

    assert_eq!(report.status, 200);
    assert!(report.http_metrics >= 3, "expected per-route request lines");
    assert!(report.process_metrics > 0);
    assert!(report.runtime_metrics > 0, "tokio gauges missing");
    assert!(!report.breakdown.http_requests.is_empty());
}

#[tokio::test]
async fn test_service_resource_attributes_are_exposed() {
    init_test_tracing();
    let service = spawn_orders_service().await;
    let config = ValidatorConfig {
        resource_attributes: [
            "service.name=orders-service",
            "service.namespace=ecommerce",
            "service.instance.id=orders-service-001",
            "service.version",
            "deployment.environment",
        ]
        .iter()
        .filter_map(|raw| ExpectedAttribute::parse(raw))
        .collect(),
        ..service.validator_config()
    };

    let report = Validator::new(config)
        .expect("http client")
        .test_metrics_endpoint()
        .await
        .expect("metrics endpoint reachable");

    assert_eq!(report.resource_attributes.len(), 5);
    assert_eq!(report.resource_score(), Some(1.0), "{:?}", report.resource_attributes);
}

#[tokio::test]
async fn test_degraded_telemetry_fails_validation() {
    init_test_tracing();
    let service = spawn_orders_service().await;
    service.state.failures.toggle_trace();

    let mut validator = Validator::new(service.validator_config()).expect("http client");
    let summary = validator.run_comprehensive_test().await;

    // every request still answers, but with placeholder ids
    assert_eq!(summary.total_tests, 3);
    assert_eq!(summary.passed_tests, 0);
    assert_eq!(summary.verdict(), Verdict::Fail);
    assert!(validator
        .results()
        .iter()
        .all(|r| r.trace_id.as_deref() == Some("telemetry-failed") && !r.trace_valid));
}

#[tokio::test]
async fn test_metrics_failure_does_not_affect_endpoint_checks() {
    init_test_tracing();
    let service = spawn_orders_service().await;
    service.state.failures.toggle_metrics();

    let mut validator = Validator::new(service.validator_config()).expect("http client");
    let summary = validator.run_comprehensive_test().await;

    assert!(matches!(
        summary.metrics,
        MetricsOutcome::BadStatus { status: 503 }
    ));
    assert_eq!(summary.verdict(), Verdict::Pass);
}

#[tokio::test]
async fn test_unreachable_service_records_nothing() {
    init_test_tracing();
    let base_url = closed_port_url();
    let config = ValidatorConfig {
        metrics_url: format!("{base_url}/metrics"),
        base_url,
        endpoint_timeout: Duration::from_secs(2),
        metrics_timeout: Duration::from_secs(2),
        ..ValidatorConfig::default()
    };

    let mut validator = Validator::new(config).expect("http client");
    let summary = validator.run_comprehensive_test().await;

    assert!(validator.results().is_empty());
    assert_eq!(summary.total_tests, 0);
    assert!(matches!(summary.metrics, MetricsOutcome::Failed));
    assert_eq!(summary.verdict(), Verdict::Fail);
}

#[tokio::test]
async fn test_harness_propagates_trace_context() {
    init_test_tracing();
    let service = spawn_orders_service().await;
    let http_client = reqwest::Client::new();

    let root = tracing::info_span!("validation_root");
    let expected_trace_id = root.context().span().span_context().trace_id().to_string();

    let result = check_endpoint(
        &http_client,
        &service.base_url,
        "/health",
        200,
        Duration::from_secs(5),
    )
    .instrument(root)
    .await
    .expect("health check");

    assert!(result.passed());
    assert_eq!(result.trace_id.as_deref(), Some(expected_trace_id.as_str()));
}
