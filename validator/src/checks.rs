use opentelemetry_http::HeaderInjector;
use reqwest::header::HeaderMap;
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::error::TestResult;
use crate::ids::{validate_trace_format, Traceparent};
use crate::record::{EndpointResult, TelemetryBody};

/// Headers carrying the current span's context, so the service's server span
/// becomes a child of the harness's client span when tracing is exported.
pub(crate) fn propagation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let context = tracing::Span::current().context();
    opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&context, &mut HeaderInjector(&mut headers))
    });
    headers
}

/// Request one endpoint and validate the telemetry fields in its JSON body.
#[tracing::instrument(
    skip(http_client, base_url, timeout),
    fields(otel.kind = "client", http.status_code = tracing::field::Empty)
)]
pub async fn check_endpoint(
    http_client: &HttpClient,
    base_url: &str,
    endpoint: &str,
    expected_status: u16,
    timeout: Duration,
) -> TestResult<EndpointResult> {
    let url = format!("{base_url}{endpoint}");
    tracing::debug!(%url, "Sending request");

    let response = http_client
        .get(&url)
        .headers(propagation_headers())
        .timeout(timeout)
        .send()
        .await?;

    let http_status = response.status().as_u16();
    tracing::Span::current().record("http.status_code", http_status);

    let traceparent = response
        .headers()
        .get("traceparent")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| match Traceparent::parse(value) {
            Ok(tp) => Some(tp),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unparseable traceparent header");
                None
            }
        });

    let body_text = response.text().await?;
    let body = TelemetryBody::parse(&body_text)?;

    let (trace_valid, span_valid) =
        validate_trace_format(body.trace_id.as_deref(), body.span_id.as_deref());

    tracing::debug!(trace_valid, span_valid, "Validated telemetry ids");

    Ok(EndpointResult {
        endpoint: endpoint.to_string(),
        http_status,
        expected_status,
        trace_id: body.trace_id,
        span_id: body.span_id,
        trace_valid,
        span_valid,
        status_code: body.status_code,
        timestamp: chrono::Local::now().to_rfc3339(),
        traceparent,
    })
}
