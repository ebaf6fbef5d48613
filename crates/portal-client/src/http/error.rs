//! API error classification and normalization
//!
//! Every failed call surfaces as an [`ApiError`]: raw transport errors, parse
//! failures and server rejections are all folded into this one shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Field name to ordered validation messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Status used when the transport never produced a response
pub const NETWORK_STATUS: u16 = 0;

/// Status used for client-side deadline expiry
pub const TIMEOUT_STATUS: u16 = 408;

/// Where a failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The attempt exceeded its deadline and was cancelled
    Timeout,
    /// The server could not be reached
    Network,
    /// The caller cancelled the call
    Cancelled,
    /// A request body or response payload could not be (de)serialized
    Encoding,
    /// The server answered with a failing status
    Response,
}

/// Coarse classification for UI branching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClassification {
    /// Deadline expired - a retry might help
    Timeout,
    /// Server unreachable - a retry might help
    Network,
    /// Caller gave up
    Cancelled,
    /// 401/403 - credentials missing or rejected
    Authentication,
    /// 4xx carrying field-level errors
    Validation,
    /// Other 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// Anything else
    Unknown,
}

/// Normalized API error representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status, 0 for network failure, 408 for client-side timeout
    pub status: u16,
    /// Human-readable error message
    pub message: String,
    /// Per-field validation messages, when the server sent them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    /// Origin of the failure
    pub kind: ErrorKind,
}

impl ApiError {
    /// Build an error from a failing server response
    pub fn from_response(
        status: u16,
        message: impl Into<String>,
        errors: Option<FieldErrors>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            errors,
            kind: ErrorKind::Response,
        }
    }

    /// Deadline expiry for a single attempt
    pub fn timeout() -> Self {
        Self {
            status: TIMEOUT_STATUS,
            message: "Request timeout".to_string(),
            errors: None,
            kind: ErrorKind::Timeout,
        }
    }

    /// The transport could not reach the server
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: NETWORK_STATUS,
            message: message.into(),
            errors: None,
            kind: ErrorKind::Network,
        }
    }

    /// The caller's cancellation signal fired
    pub fn cancelled() -> Self {
        Self {
            status: NETWORK_STATUS,
            message: "Request cancelled".to_string(),
            errors: None,
            kind: ErrorKind::Cancelled,
        }
    }

    /// A payload could not be encoded or decoded
    pub fn encoding(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
            kind: ErrorKind::Encoding,
        }
    }

    /// Only network failures and timeouts are treated as transient.
    /// A parsed server response is deterministic and is never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout | ErrorKind::Network)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Response && self.status == 401
    }

    /// Messages reported for one field, if any
    pub fn field_errors(&self, field: &str) -> Option<&[String]> {
        self.errors
            .as_ref()
            .and_then(|errors| errors.get(field))
            .map(Vec::as_slice)
    }

    pub fn classification(&self) -> ErrorClassification {
        match self.kind {
            ErrorKind::Timeout => ErrorClassification::Timeout,
            ErrorKind::Network => ErrorClassification::Network,
            ErrorKind::Cancelled => ErrorClassification::Cancelled,
            ErrorKind::Encoding => ErrorClassification::Unknown,
            ErrorKind::Response => match self.status {
                401 | 403 => ErrorClassification::Authentication,
                400..=499 if self.errors.as_ref().is_some_and(|e| !e.is_empty()) => {
                    ErrorClassification::Validation
                }
                400..=499 => ErrorClassification::ClientError,
                500..=599 => ErrorClassification::ServerError,
                _ => ErrorClassification::Unknown,
            },
        }
    }
}

/// Read an `errors` object leniently: arrays keep their string entries,
/// a bare string becomes a one-element list, anything else is skipped.
pub(crate) fn parse_field_errors(value: Option<&Value>) -> Option<FieldErrors> {
    let object = value?.as_object()?;
    let mut errors = FieldErrors::new();

    for (field, messages) in object {
        let messages: Vec<String> = match messages {
            Value::String(message) => vec![message.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => continue,
        };
        errors.insert(field.clone(), messages);
    }

    Some(errors)
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API Error [{}]: {} ({:?})", self.status, self.message, self.kind)
    }
}

impl std::error::Error for ApiError {}
