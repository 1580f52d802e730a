use regex::Regex;
use serde::Serialize;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::ValidationError;

static TRACE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{32}$").expect("static trace id pattern"));
static SPAN_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{16}$").expect("static span id pattern"));

pub fn is_valid_trace_id(trace_id: &str) -> bool {
    TRACE_ID_PATTERN.is_match(trace_id)
}

pub fn is_valid_span_id(span_id: &str) -> bool {
    SPAN_ID_PATTERN.is_match(span_id)
}

/// Validate trace and span id formats.
///
/// Ids must be lowercase hex, 32 characters for a trace and 16 for a span.
/// A missing id is checked as the empty string and is therefore invalid.
pub fn validate_trace_format(trace_id: Option<&str>, span_id: Option<&str>) -> (bool, bool) {
    (
        is_valid_trace_id(trace_id.unwrap_or("")),
        is_valid_span_id(span_id.unwrap_or("")),
    )
}

/// First eight characters of an id, for the per-check printout.
pub fn short_id(id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{}...", id.chars().take(8).collect::<String>()),
        None => "(missing)".to_string(),
    }
}

/// A parsed W3C `traceparent` header: `version-trace_id-span_id-flags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Traceparent {
    pub version: String,
    pub trace_id: String,
    pub span_id: String,
    pub flags: String,
}

impl Traceparent {
    pub fn parse(header: &str) -> Result<Self, ValidationError> {
        header.parse()
    }

    pub fn is_sampled(&self) -> bool {
        u8::from_str_radix(&self.flags, 16)
            .map(|flags| flags & 0x01 == 0x01)
            .unwrap_or(false)
    }
}

impl FromStr for Traceparent {
    type Err = ValidationError;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = header.trim().split('-').collect();
        if parts.len() != 4 {
            return Err(ValidationError::new(
                "traceparent",
                format!("Invalid traceparent format: {header}"),
            ));
        }

        Ok(Self {
            version: parts[0].to_string(),
            trace_id: parts[1].to_string(),
            span_id: parts[2].to_string(),
            flags: parts[3].to_string(),
        })
    }
}
