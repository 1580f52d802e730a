use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::metrics::MetricsReport;
use crate::record::EndpointResult;

pub(crate) fn mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "✅ PASS"),
            Verdict::Fail => write!(f, "❌ FAIL"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum MetricsOutcome {
    Working { total_metrics: usize },
    BadStatus { status: u16 },
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub trace_ids: usize,
    pub unique_traces: usize,
    pub metrics: MetricsOutcome,
}

impl Summary {
    pub fn from_results(results: &[EndpointResult], metrics: Option<&MetricsReport>) -> Self {
        let trace_ids: Vec<&str> = results
            .iter()
            .filter_map(|r| r.trace_id.as_deref())
            .filter(|id| !id.is_empty())
            .collect();
        let unique_traces = trace_ids.iter().collect::<HashSet<_>>().len();

        let metrics = match metrics {
            Some(report) if report.status == 200 => MetricsOutcome::Working {
                total_metrics: report.total_metrics,
            },
            Some(report) => MetricsOutcome::BadStatus {
                status: report.status,
            },
            None => MetricsOutcome::Failed,
        };

        Self {
            total_tests: results.len(),
            passed_tests: results.iter().filter(|r| r.passed()).count(),
            trace_ids: trace_ids.len(),
            unique_traces,
            metrics,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total_tests == 0 {
            return 0.0;
        }
        self.passed_tests as f64 / self.total_tests as f64 * 100.0
    }

    /// Every recorded endpoint check passed. A run that recorded nothing fails.
    pub fn verdict(&self) -> Verdict {
        if self.total_tests > 0 && self.passed_tests == self.total_tests {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub fn traces_unique(&self) -> bool {
        self.unique_traces == self.trace_ids
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Endpoint Tests: {}", self.total_tests)?;
        writeln!(
            f,
            "Passed Tests: {}/{} ({:.1}%)",
            self.passed_tests,
            self.total_tests,
            self.pass_rate()
        )?;
        match &self.metrics {
            MetricsOutcome::Working { total_metrics } => {
                writeln!(f, "Metrics Endpoint: ✅ Working ({total_metrics} metrics)")?
            }
            MetricsOutcome::BadStatus { status } => {
                writeln!(f, "Metrics Endpoint: ❌ Status {status}")?
            }
            MetricsOutcome::Failed => writeln!(f, "Metrics Endpoint: ❌ Failed")?,
        }
        writeln!(
            f,
            "Unique Trace IDs: {}/{} ({})",
            self.unique_traces,
            self.trace_ids,
            mark(self.traces_unique())
        )?;
        write!(f, "\n🎉 Validation: {}", self.verdict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsReport;
    use crate::record::fixtures::result;

    fn distinct(mut r: EndpointResult, trace_id: &str) -> EndpointResult {
        r.trace_id = Some(trace_id.to_string());
        r
    }

    #[test]
    fn counts_only_fully_valid_records() {
        let mut bad_span = distinct(result("/orders", 200, 200), &"b".repeat(32));
        bad_span.span_valid = false;

        let results = vec![
            distinct(result("/health", 200, 200), &"a".repeat(32)),
            bad_span,
            distinct(result("/orders?fail=true", 200, 500), &"c".repeat(32)),
        ];

        let summary = Summary::from_results(&results, None);
        assert_eq!(summary.total_tests, 3);
        assert_eq!(summary.passed_tests, 1);
        assert_eq!(summary.verdict(), Verdict::Fail);
        assert!((summary.pass_rate() - 33.333).abs() < 0.01);
    }

    #[test]
    fn all_passing_is_pass() {
        let results = vec![
            distinct(result("/health", 200, 200), &"a".repeat(32)),
            distinct(result("/orders", 200, 200), &"b".repeat(32)),
            distinct(result("/orders?fail=true", 500, 500), &"c".repeat(32)),
        ];
        let summary = Summary::from_results(&results, None);
        assert_eq!(summary.verdict(), Verdict::Pass);
        assert!(summary.traces_unique());
        assert_eq!(summary.unique_traces, 3);
    }

    #[test]
    fn empty_run_fails_without_dividing_by_zero() {
        let summary = Summary::from_results(&[], None);
        assert_eq!(summary.pass_rate(), 0.0);
        assert_eq!(summary.verdict(), Verdict::Fail);
        assert!(summary.to_string().contains("Passed Tests: 0/0 (0.0%)"));
    }

    #[test]
    fn repeated_trace_ids_are_flagged() {
        let results = vec![result("/health", 200, 200), result("/orders", 200, 200)];
        let summary = Summary::from_results(&results, None);
        assert_eq!(summary.trace_ids, 2);
        assert_eq!(summary.unique_traces, 1);
        assert!(!summary.traces_unique());
    }

    #[test]
    fn missing_trace_ids_are_not_counted() {
        let mut r = result("/health", 200, 200);
        r.trace_id = None;
        let summary = Summary::from_results(&[r], None);
        assert_eq!(summary.trace_ids, 0);
    }

    #[test]
    fn renders_metrics_outcome() {
        let ok = MetricsReport::from_exposition(200, "a_total 1\nb_total 2\n", &[]);
        let summary = Summary::from_results(&[], Some(&ok));
        assert!(summary
            .to_string()
            .contains("Metrics Endpoint: ✅ Working (2 metrics)"));

        let unavailable = MetricsReport::from_exposition(503, "", &[]);
        let summary = Summary::from_results(&[], Some(&unavailable));
        assert!(summary.to_string().contains("Metrics Endpoint: ❌ Status 503"));

        let summary = Summary::from_results(&[], None);
        assert!(summary.to_string().contains("Metrics Endpoint: ❌ Failed"));
        assert!(summary.to_string().ends_with("❌ FAIL"));
    }
}
