//! Validation harness for an OpenTelemetry-instrumented HTTP service.
//!
//! Requests a few endpoints, checks that every JSON response carries a
//! well-formed trace id and span id and the expected status, inspects the
//! Prometheus metrics endpoint, and prints a pass/fail summary.

pub mod checks;
pub mod config;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod record;
pub mod runner;
pub mod summary;
pub mod tracing_config;

pub use config::ValidatorConfig;
pub use error::{TestResult, ValidationError};
pub use ids::{validate_trace_format, Traceparent};
pub use metrics::{ExpectedAttribute, MetricsReport};
pub use record::EndpointResult;
pub use runner::{EndpointCheck, Validator};
pub use summary::{Summary, Verdict};
