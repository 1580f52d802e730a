use std::time::Duration;

use crate::metrics::ExpectedAttribute;

// Configuration constants
const BASE_URL: &str = "http://localhost:3001";
const METRICS_URL: &str = "http://localhost:9090/metrics";
const ENDPOINT_TIMEOUT_SECS: u64 = 5;
const METRICS_TIMEOUT_SECS: u64 = 10;
const RUNTIME_METRIC_MARKERS: &str = "nodejs,tokio";
const SERVICE_NAME: &str = "otel-validator";

/// Where to point the harness and how long to wait for each request.
///
/// Every field can be overridden from the environment (or a `.env` file);
/// the defaults match the orders service's default ports.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub base_url: String,
    pub metrics_url: String,
    pub endpoint_timeout: Duration,
    pub metrics_timeout: Duration,
    /// Substrings that mark a sample as a language-runtime metric.
    pub runtime_metric_markers: Vec<String>,
    /// Resource attributes the metrics must expose; empty skips the check.
    pub resource_attributes: Vec<ExpectedAttribute>,
    pub service_name: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            metrics_url: METRICS_URL.to_string(),
            endpoint_timeout: Duration::from_secs(ENDPOINT_TIMEOUT_SECS),
            metrics_timeout: Duration::from_secs(METRICS_TIMEOUT_SECS),
            runtime_metric_markers: split_list(RUNTIME_METRIC_MARKERS),
            resource_attributes: Vec::new(),
            service_name: SERVICE_NAME.to_string(),
        }
    }
}

impl ValidatorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to the
    /// defaults for anything missing or unparseable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            base_url: lookup("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            metrics_url: lookup("METRICS_URL").unwrap_or(defaults.metrics_url),
            endpoint_timeout: Duration::from_secs(
                lookup("ENDPOINT_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(ENDPOINT_TIMEOUT_SECS),
            ),
            metrics_timeout: Duration::from_secs(
                lookup("METRICS_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(METRICS_TIMEOUT_SECS),
            ),
            runtime_metric_markers: lookup("RUNTIME_METRIC_MARKERS")
                .map(|v| split_list(&v))
                .filter(|markers| !markers.is_empty())
                .unwrap_or(defaults.runtime_metric_markers),
            resource_attributes: lookup("EXPECTED_RESOURCE_ATTRIBUTES")
                .map(|v| {
                    split_list(&v)
                        .iter()
                        .filter_map(|raw| ExpectedAttribute::parse(raw))
                        .collect()
                })
                .unwrap_or(defaults.resource_attributes),
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
