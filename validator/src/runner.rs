use reqwest::Client as HttpClient;

use crate::checks::check_endpoint;
use crate::config::ValidatorConfig;
use crate::error::TestResult;
use crate::ids::short_id;
use crate::metrics::{check_metrics, MetricsReport, Sample};
use crate::record::{display_status_code, EndpointResult};
use crate::summary::{mark, Summary};

const RESOURCE_PASS_SCORE: f64 = 0.8;

/// One endpoint request and the HTTP status it should answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCheck {
    pub endpoint: String,
    pub expected_status: u16,
}

impl EndpointCheck {
    pub fn new(endpoint: &str, expected_status: u16) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            expected_status,
        }
    }

    /// Health, a successful order listing, and the simulated failure.
    pub fn default_plan() -> Vec<Self> {
        vec![
            Self::new("/health", 200),
            Self::new("/orders", 200),
            Self::new("/orders?fail=true", 500),
        ]
    }
}

/// Runs the checks one after another and keeps a record per completed request.
pub struct Validator {
    config: ValidatorConfig,
    http_client: HttpClient,
    results: Vec<EndpointResult>,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> TestResult<Self> {
        let http_client = HttpClient::builder().build()?;
        Ok(Self::with_client(config, http_client))
    }

    pub fn with_client(config: ValidatorConfig, http_client: HttpClient) -> Self {
        Self {
            config,
            http_client,
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[EndpointResult] {
        &self.results
    }

    /// Checks one endpoint, printing the outcome. A failed request is printed
    /// and contributes no record.
    pub async fn test_endpoint(&mut self, check: &EndpointCheck) -> Option<&EndpointResult> {
        println!("\n🔍 Testing {}", check.endpoint);

        match check_endpoint(
            &self.http_client,
            &self.config.base_url,
            &check.endpoint,
            check.expected_status,
            self.config.endpoint_timeout,
        )
        .await
        {
            Ok(result) => {
                print_endpoint_result(&result);
                self.results.push(result);
                self.results.last()
            }
            Err(e) => {
                tracing::warn!(endpoint = %check.endpoint, error = %e, "Endpoint check failed");
                println!("   ❌ Error: {e}");
                None
            }
        }
    }

    pub async fn test_metrics_endpoint(&self) -> Option<MetricsReport> {
        println!("\n📊 Testing Metrics Endpoint");

        match check_metrics(
            &self.http_client,
            &self.config.metrics_url,
            self.config.metrics_timeout,
            &self.config.runtime_metric_markers,
            &self.config.resource_attributes,
        )
        .await
        {
            Ok(report) => {
                print_metrics_report(&report);
                Some(report)
            }
            Err(e) => {
                tracing::warn!(url = %self.config.metrics_url, error = %e, "Metrics check failed");
                println!("   ❌ Error: {e}");
                None
            }
        }
    }

    pub async fn run_comprehensive_test(&mut self) -> Summary {
        self.run_plan(&EndpointCheck::default_plan()).await
    }

    #[tracing::instrument(skip_all, fields(checks = plan.len()))]
    pub async fn run_plan(&mut self, plan: &[EndpointCheck]) -> Summary {
        println!("🧪 === OPENTELEMETRY TRACE VALIDATION ===");
        println!("🎯 Target: {}", self.config.base_url);

        for check in plan {
            self.test_endpoint(check).await;
        }

        let metrics = self.test_metrics_endpoint().await;
        let summary = Summary::from_results(&self.results, metrics.as_ref());

        println!("\n📋 === VALIDATION SUMMARY ===");
        println!("{summary}");

        tracing::info!(
            passed = summary.passed_tests,
            total = summary.total_tests,
            verdict = ?summary.verdict(),
            "Validation finished"
        );
        summary
    }
}

fn print_endpoint_result(result: &EndpointResult) {
    println!(
        "   HTTP Status: {} ({})",
        result.http_status,
        mark(result.status_matches())
    );
    println!(
        "   Trace ID: {} ({})",
        short_id(result.trace_id.as_deref()),
        mark(result.trace_valid)
    );
    println!(
        "   Span ID: {} ({})",
        short_id(result.span_id.as_deref()),
        mark(result.span_valid)
    );
    match &result.status_code {
        Some(code) => println!("   Status Code: {} (✅)", display_status_code(code)),
        None => println!("   Status Code: (missing) (❌)"),
    }
    if let Some(matches) = result.trace_matches_header() {
        println!("   traceparent: trace id {} body", if matches { "matches" } else { "differs from" });
    }
}

fn print_metrics_report(report: &MetricsReport) {
    println!("   Status: {} ({})", report.status, mark(report.status == 200));
    println!("   Total Metrics: {}", report.total_metrics);
    println!(
        "   Runtime Metrics: {} ({})",
        report.runtime_metrics,
        mark(report.runtime_metrics > 0)
    );
    println!(
        "   HTTP Metrics: {} ({})",
        report.http_metrics,
        mark(report.http_metrics > 0)
    );
    println!(
        "   Process Metrics: {} ({})",
        report.process_metrics,
        mark(report.process_metrics > 0)
    );

    if let Some(score) = report.resource_score() {
        let found = report.resource_attributes.iter().filter(|c| c.found).count();
        println!(
            "   Resource Attributes: {found}/{} ({:.1}%) ({})",
            report.resource_attributes.len(),
            score * 100.0,
            mark(score >= RESOURCE_PASS_SCORE)
        );
        for check in &report.resource_attributes {
            let status = if check.found { "✅ FOUND" } else { "❌ MISSING" };
            match &check.expected {
                Some(value) => println!("      {}: {status} (expected: {value})", check.label),
                None => println!("      {}: {status}", check.label),
            }
        }
    }

    let groups: [(&str, &[Sample]); 4] = [
        ("Event Loop", &report.breakdown.event_loop),
        ("Memory", &report.breakdown.memory),
        ("Process", &report.breakdown.process),
        ("HTTP Requests", &report.breakdown.http_requests),
    ];
    for (label, samples) in groups {
        if samples.is_empty() {
            continue;
        }
        println!("   {label}:");
        for sample in samples {
            println!("      {}: {}", sample.name, sample.value);
        }
    }
}
