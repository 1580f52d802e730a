/// Result type shared by every check in the harness.
pub type TestResult<T> = Result<T, ValidationError>;

/// A single check that could not produce a result.
///
/// `operation` names the step that failed (`http_request`, `json_body`,
/// `metrics_request`, ...) so the printed error points at the stage rather
/// than just the underlying transport message.
#[derive(Debug, thiserror::Error)]
#[error("{operation}: {message}")]
pub struct ValidationError {
    pub operation: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(operation: &str, message: impl Into<String>) -> Self {
        Self {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ValidationError {
    fn from(e: reqwest::Error) -> Self {
        let operation = if e.is_timeout() {
            "http_timeout"
        } else if e.is_connect() {
            "http_connect"
        } else if e.is_decode() {
            "http_body"
        } else {
            "http_request"
        };
        Self::new(operation, e.to_string())
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(e: serde_json::Error) -> Self {
        Self::new("json_body", e.to_string())
    }
}
