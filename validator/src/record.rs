use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{TestResult, ValidationError};
use crate::ids::Traceparent;

/// Telemetry fields the instrumented service echoes back in every JSON body.
/// Anything else in the body is ignored.
#[derive(Debug, Default, PartialEq)]
pub struct TelemetryBody {
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    /// Whatever the service sent, `null` counting as absent.
    pub status_code: Option<Value>,
}

impl TelemetryBody {
    /// Pick the telemetry fields out of a response body, which must be a JSON object.
    ///
    /// An id that is absent, `null` or otherwise empty (`false`, `0`, `[]`, `{}`)
    /// is treated as missing and later fails validation. Any other non-string id
    /// makes the body unusable.
    pub fn from_value(body: Value) -> TestResult<Self> {
        let Value::Object(fields) = body else {
            return Err(ValidationError::new(
                "json_body",
                format!("expected a JSON object, got {}", kind(&body)),
            ));
        };

        Ok(Self {
            trace_id: id_field(&fields, "trace_id")?,
            span_id: id_field(&fields, "span_id")?,
            status_code: fields.get("status_code").filter(|v| !v.is_null()).cloned(),
        })
    }

    pub fn parse(text: &str) -> TestResult<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }
}

fn id_field(fields: &Map<String, Value>, key: &str) -> TestResult<Option<String>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.clone())),
        Some(value) if is_empty(value) => Ok(None),
        Some(value) => Err(ValidationError::new(
            "json_body",
            format!("{key} is a {}, not a string", kind(value)),
        )),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Null => true,
        Value::String(s) => s.is_empty(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `status_code` as printed next to each result: strings without quotes,
/// anything else as JSON.
pub fn display_status_code(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Outcome of one endpoint request that produced a parseable response.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointResult {
    pub endpoint: String,
    pub http_status: u16,
    pub expected_status: u16,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub trace_valid: bool,
    pub span_valid: bool,
    /// OpenTelemetry span status code reported by the service (0 ok, 2 error).
    /// Kept as sent; only its presence is checked.
    pub status_code: Option<Value>,
    pub timestamp: String,
    pub traceparent: Option<Traceparent>,
}

impl EndpointResult {
    pub fn status_matches(&self) -> bool {
        self.http_status == self.expected_status
    }

    pub fn passed(&self) -> bool {
        self.status_matches() && self.trace_valid && self.span_valid
    }

    /// Whether the body trace id agrees with the `traceparent` response header.
    /// `None` when the service sent no header.
    pub fn trace_matches_header(&self) -> Option<bool> {
        self.traceparent
            .as_ref()
            .map(|tp| self.trace_id.as_deref() == Some(tp.trace_id.as_str()))
    }
}
