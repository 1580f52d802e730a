//! Prometheus exposition checks.
//!
//! The counts are substring-based on whole sample lines, which is enough to
//! tell whether an exporter is wired up at all. It is not a full parser of
//! the exposition format: labels are kept as part of the metric name.

use reqwest::Client as HttpClient;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{TestResult, ValidationError};

// How many samples of each group are listed; event loop samples are all listed.
const MEMORY_SAMPLES: usize = 3;
const PROCESS_SAMPLES: usize = 2;
const HTTP_SAMPLES: usize = 3;

/// One parsed sample line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub name: String,
    pub value: SampleValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SampleValue {
    Number(f64),
    Raw(String),
}

impl std::fmt::Display for SampleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleValue::Number(v) => write!(f, "{v}"),
            SampleValue::Raw(v) => write!(f, "{v}"),
        }
    }
}

/// Sample names grouped by what they measure. Memory, process and HTTP
/// groups are capped at a few samples each.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricBreakdown {
    pub event_loop: Vec<Sample>,
    pub memory: Vec<Sample>,
    pub process: Vec<Sample>,
    pub http_requests: Vec<Sample>,
}

/// A resource attribute the metrics should carry as a label, e.g. from
/// `target_info`. Without a value only the label's presence is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedAttribute {
    pub label: String,
    pub value: Option<String>,
}

impl ExpectedAttribute {
    /// Parses `label=value` or a bare `label`. Dots in the label become
    /// underscores, as Prometheus label names do not allow them.
    pub fn parse(raw: &str) -> Option<Self> {
        let (label, value) = match raw.split_once('=') {
            Some((label, value)) => (label.trim(), Some(value.trim().to_string())),
            None => (raw.trim(), None),
        };
        if label.is_empty() {
            return None;
        }
        Some(Self {
            label: label.replace('.', "_"),
            value: value.filter(|v| !v.is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeCheck {
    pub label: String,
    pub expected: Option<String>,
    pub found: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub status: u16,
    pub total_metrics: usize,
    pub runtime_metrics: usize,
    pub http_metrics: usize,
    pub process_metrics: usize,
    pub breakdown: MetricBreakdown,
    /// Empty unless resource attributes were asked for.
    pub resource_attributes: Vec<AttributeCheck>,
}

impl MetricsReport {
    pub fn from_exposition(status: u16, text: &str, runtime_markers: &[String]) -> Self {
        let lines = metric_lines(text);
        let count_containing = |needle: &str| lines.iter().filter(|l| l.contains(needle)).count();

        Self {
            status,
            total_metrics: lines.len(),
            runtime_metrics: lines
                .iter()
                .filter(|l| runtime_markers.iter().any(|m| l.contains(m.as_str())))
                .count(),
            http_metrics: count_containing("http"),
            process_metrics: count_containing("process"),
            breakdown: MetricBreakdown::from_samples(&parse_samples(text)),
            resource_attributes: Vec::new(),
        }
    }

    /// Share of expected resource attributes found, `None` when none were expected.
    pub fn resource_score(&self) -> Option<f64> {
        if self.resource_attributes.is_empty() {
            return None;
        }
        let found = self.resource_attributes.iter().filter(|c| c.found).count();
        Some(found as f64 / self.resource_attributes.len() as f64)
    }
}

/// Look for each expected attribute among the sample lines' labels.
pub fn check_resource_attributes(text: &str, expected: &[ExpectedAttribute]) -> Vec<AttributeCheck> {
    let lines = metric_lines(text);
    expected
        .iter()
        .map(|attribute| {
            let needle = match &attribute.value {
                Some(value) => format!("{}=\"{}\"", attribute.label, value),
                None => format!("{}=\"", attribute.label),
            };
            AttributeCheck {
                label: attribute.label.clone(),
                expected: attribute.value.clone(),
                found: lines.iter().any(|line| line.contains(&needle)),
            }
        })
        .collect()
}

impl MetricBreakdown {
    pub fn from_samples(samples: &[Sample]) -> Self {
        let pick = |limit: usize, matches: &dyn Fn(&str) -> bool| -> Vec<Sample> {
            samples
                .iter()
                .filter(|s| matches(&s.name))
                .take(limit)
                .cloned()
                .collect()
        };

        Self {
            event_loop: pick(usize::MAX, &|name: &str| {
                name.contains("eventloop") || name.contains("lag")
            }),
            memory: pick(MEMORY_SAMPLES, &|name: &str| {
                name.contains("memory") || name.contains("heap")
            }),
            process: pick(PROCESS_SAMPLES, &|name: &str| {
                name.contains("process") || name.contains("cpu") || name.contains("nodejs_version")
            }),
            http_requests: pick(HTTP_SAMPLES, &|name: &str| {
                name.contains("http")
                    && (name.contains("request")
                        || name.contains("duration")
                        || name.contains("total"))
            }),
        }
    }
}

/// Sample lines: non-empty, not a `#` comment, and containing a space.
pub fn metric_lines(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| !line.is_empty() && !line.starts_with('#') && line.contains(' '))
        .collect()
}

/// Split every sample line at its first space into name and value.
///
/// Names are unique: a repeated name keeps its first position and takes the
/// value of its last line.
pub fn parse_samples(text: &str) -> Vec<Sample> {
    let mut samples: Vec<Sample> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for line in text.lines() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = line.split_once(' ') else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        let value = parse_value(value.trim());
        match positions.get(name) {
            Some(&i) => samples[i].value = value,
            None => {
                positions.insert(name, samples.len());
                samples.push(Sample {
                    name: name.to_string(),
                    value,
                });
            }
        }
    }
    samples
}

// leading number of the value, so a trailing timestamp does not make it raw
fn parse_value(raw: &str) -> SampleValue {
    raw.split_whitespace()
        .next()
        .and_then(|first| first.parse::<f64>().ok())
        .map(SampleValue::Number)
        .unwrap_or_else(|| SampleValue::Raw(raw.to_string()))
}

/// Fetch the metrics endpoint and summarise what it exposes.
#[tracing::instrument(
    skip(http_client, timeout, runtime_markers, expected_attributes),
    fields(otel.kind = "client")
)]
pub async fn check_metrics(
    http_client: &HttpClient,
    metrics_url: &str,
    timeout: Duration,
    runtime_markers: &[String],
    expected_attributes: &[ExpectedAttribute],
) -> TestResult<MetricsReport> {
    let response = http_client
        .get(metrics_url)
        .headers(crate::checks::propagation_headers())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| ValidationError::new("metrics_request", e.to_string()))?;

    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| ValidationError::new("metrics_body", e.to_string()))?;

    tracing::debug!(status, bytes = text.len(), "Fetched metrics exposition");

    let mut report = MetricsReport::from_exposition(status, &text, runtime_markers);
    report.resource_attributes = check_resource_attributes(&text, expected_attributes);
    Ok(report)
}
