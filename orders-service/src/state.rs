use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use opentelemetry_sdk::Resource;

use crate::metrics::HttpMetrics;
use crate::resource::{resource_labels, service_resource};

/// Runtime switches for degrading telemetry on purpose.
#[derive(Debug, Default)]
pub struct FailureFlags {
    trace: AtomicBool,
    metrics: AtomicBool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FailureState {
    pub trace_failure: bool,
    pub metrics_failure: bool,
}

impl FailureFlags {
    /// Flip trace failure, returning the new value.
    pub fn toggle_trace(&self) -> bool {
        !self.trace.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn toggle_metrics(&self) -> bool {
        !self.metrics.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.trace.store(false, Ordering::SeqCst);
        self.metrics.store(false, Ordering::SeqCst);
    }

    pub fn trace_failing(&self) -> bool {
        self.trace.load(Ordering::SeqCst)
    }

    pub fn metrics_failing(&self) -> bool {
        self.metrics.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> FailureState {
        FailureState {
            trace_failure: self.trace_failing(),
            metrics_failure: self.metrics_failing(),
        }
    }
}

/// Shared by the API router and the metrics router.
#[derive(Clone)]
pub struct AppState {
    pub service_name: Arc<str>,
    pub failures: Arc<FailureFlags>,
    pub metrics: Arc<HttpMetrics>,
}

impl AppState {
    pub fn new(service_name: &str) -> anyhow::Result<Self> {
        Self::with_resource(service_name, &service_resource(service_name))
    }

    /// State whose metrics carry the attributes of `resource`.
    pub fn with_resource(service_name: &str, resource: &Resource) -> anyhow::Result<Self> {
        Ok(Self {
            service_name: Arc::from(service_name),
            failures: Arc::new(FailureFlags::default()),
            metrics: Arc::new(HttpMetrics::new(&resource_labels(resource))?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_and_resets() {
        let flags = FailureFlags::default();
        assert!(flags.toggle_trace());
        assert!(flags.trace_failing());
        assert!(!flags.toggle_trace());
        assert!(flags.toggle_metrics());
        assert_eq!(
            flags.snapshot(),
            FailureState {
                trace_failure: false,
                metrics_failure: true
            }
        );
        flags.reset();
        assert!(!flags.metrics_failing());
    }
}
