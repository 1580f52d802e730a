// Prometheus metrics for the orders service

use metrics::{Label, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::time::Duration;

const REQUESTS_TOTAL: &str = "http_requests_total";
const REQUEST_DURATION: &str = "http_request_duration_seconds";
const TARGET_INFO: &str = "target_info";
const TOKIO_WORKERS: &str = "tokio_workers_count";
const TOKIO_ALIVE_TASKS: &str = "tokio_alive_tasks";

const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Request counters and durations, process and runtime gauges, and the
/// service resource as a `target_info` gauge.
///
/// Each instance owns its own recorder, so separate routers (and tests) never
/// share counts.
pub struct HttpMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    process: metrics_process::Collector,
}

impl HttpMetrics {
    pub fn new(resource_labels: &[(String, String)]) -> anyhow::Result<Self> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), DURATION_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();
        let process = metrics_process::Collector::default();

        let target_info: Vec<Label> = resource_labels
            .iter()
            .map(|(key, value)| Label::new(key.clone(), value.clone()))
            .collect();

        metrics::with_local_recorder(&recorder, || {
            metrics::describe_counter!(REQUESTS_TOTAL, Unit::Count, "Total number of HTTP requests.");
            metrics::describe_histogram!(
                REQUEST_DURATION,
                Unit::Seconds,
                "Time spent serving HTTP requests."
            );
            metrics::describe_gauge!(TARGET_INFO, "Target metadata.");
            metrics::describe_gauge!(TOKIO_WORKERS, "Number of tokio worker threads.");
            metrics::describe_gauge!(TOKIO_ALIVE_TASKS, "Number of alive tokio tasks.");
            process.describe();

            metrics::gauge!(TARGET_INFO, target_info).set(1.0);
        });

        Ok(Self {
            recorder,
            handle,
            process,
        })
    }

    /// Record one finished request.
    pub fn observe(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(
                REQUESTS_TOTAL,
                "method" => method.to_string(),
                "route" => route.to_string(),
                "status" => status.to_string()
            )
            .increment(1);
            metrics::histogram!(
                REQUEST_DURATION,
                "method" => method.to_string(),
                "route" => route.to_string()
            )
            .record(elapsed.as_secs_f64());
        });
    }

    /// Refresh the process and runtime gauges and render everything in the
    /// Prometheus text format.
    pub fn render(&self) -> String {
        metrics::with_local_recorder(&self.recorder, || {
            self.process.collect();

            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let runtime = handle.metrics();
                metrics::gauge!(TOKIO_WORKERS).set(runtime.num_workers() as f64);
                metrics::gauge!(TOKIO_ALIVE_TASKS).set(runtime.num_alive_tasks() as f64);
            }
        });

        self.handle.render()
    }
}

/// Value of the first sample of `name` carrying every one of `labels`.
#[cfg(test)]
pub(crate) fn sample_value(text: &str, name: &str, labels: &[&str]) -> Option<f64> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| line.starts_with(&format!("{name}{{")) || line.starts_with(&format!("{name} ")))
        .find(|line| labels.iter().all(|label| line.contains(label)))
        .and_then(|line| line.rsplit_once(' '))
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<(String, String)> {
        vec![
            ("service_name".to_string(), "orders-test".to_string()),
            ("service_version".to_string(), "1.2.3".to_string()),
        ]
    }

    #[test]
    fn counts_by_method_route_and_status() {
        let metrics = HttpMetrics::new(&labels()).unwrap();
        metrics.observe("GET", "/orders", 200, Duration::from_millis(5));
        metrics.observe("GET", "/orders", 200, Duration::from_millis(5));
        metrics.observe("GET", "/orders", 500, Duration::from_millis(1));

        let text = metrics.render();
        let ok = ["method=\"GET\"", "route=\"/orders\"", "status=\"200\""];
        let failed = ["method=\"GET\"", "route=\"/orders\"", "status=\"500\""];
        assert_eq!(sample_value(&text, REQUESTS_TOTAL, &ok), Some(2.0));
        assert_eq!(sample_value(&text, REQUESTS_TOTAL, &failed), Some(1.0));
        assert_eq!(
            sample_value(&text, "http_request_duration_seconds_count", &["route=\"/orders\""]),
            Some(3.0)
        );
        assert!(text.contains("http_request_duration_seconds_bucket{"));
    }

    #[test]
    fn separate_instances_do_not_share_counts() {
        let first = HttpMetrics::new(&labels()).unwrap();
        let second = HttpMetrics::new(&labels()).unwrap();
        first.observe("GET", "/health", 200, Duration::from_millis(1));

        assert_eq!(sample_value(&first.render(), REQUESTS_TOTAL, &[]), Some(1.0));
        assert_eq!(sample_value(&second.render(), REQUESTS_TOTAL, &[]), None);
    }

    #[test]
    fn exposes_resource_as_target_info() {
        let text = HttpMetrics::new(&labels()).unwrap().render();
        assert_eq!(
            sample_value(
                &text,
                TARGET_INFO,
                &["service_name=\"orders-test\"", "service_version=\"1.2.3\""]
            ),
            Some(1.0)
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn exposes_process_gauges() {
        let text = HttpMetrics::new(&labels()).unwrap().render();
        assert!(text.lines().any(|l| l.starts_with("process_resident_memory_bytes ")));
        assert!(text.lines().any(|l| l.starts_with("process_start_time_seconds ")));
    }

    #[tokio::test]
    async fn exposes_runtime_gauges_inside_tokio() {
        let text = HttpMetrics::new(&labels()).unwrap().render();
        assert!(text.lines().any(|l| l.starts_with("tokio_workers_count ")));
        assert!(text.lines().any(|l| l.starts_with("tokio_alive_tasks ")));
    }
}
