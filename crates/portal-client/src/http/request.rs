//! Logical request description and request bodies

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::http::error::{ApiError, NETWORK_STATUS};
use crate::http::headers::Headers;

/// A request body as the caller hands it over
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Structured payload, serialized to JSON on the wire
    Json(Value),
    /// Pre-encoded text, sent verbatim
    Text(String),
    /// Opaque binary payload
    Bytes(Vec<u8>),
    /// `multipart/form-data` payload
    Multipart(MultipartForm),
}

impl Body {
    /// Serialize any value into a JSON body
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(|e| {
                ApiError::encoding(
                    NETWORK_STATUS,
                    format!("Failed to serialize request body: {}", e),
                )
            })
    }

    /// Binary bodies let the transport pick their own Content-Type
    pub fn is_binary(&self) -> bool {
        matches!(self, Body::Bytes(_) | Body::Multipart(_))
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<MultipartForm> for Body {
    fn from(form: MultipartForm) -> Self {
        Body::Multipart(form)
    }
}

/// One part of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    },
}

/// Multipart payload kept as plain data so each attempt can rebuild it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<MultipartPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(MultipartPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime_type: mime_type.map(str::to_string),
            bytes,
        });
        self
    }

    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }
}

/// Immutable description of one logical call
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub body: Option<Body>,
    pub headers: Option<Headers>,
    /// Attach the configured credential (bearer header or cookies)
    pub credentials_required: bool,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: None,
            credentials_required: true,
        }
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials_required = false;
        self
    }

    pub fn has_binary_body(&self) -> bool {
        self.body.as_ref().is_some_and(Body::is_binary)
    }
}

/// Per-call options for the facade verbs
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Extra headers, overriding same-named defaults
    pub headers: Option<Headers>,
    /// Caller cancellation, composed with the per-attempt deadline
    pub cancel: Option<CancellationToken>,
    /// Deadline override for each attempt of this call
    pub timeout: Option<Duration>,
    pub credentials_required: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            headers: None,
            cancel: None,
            timeout: None,
            credentials_required: true,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header; repeated names overwrite case-insensitively
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(Headers::new).insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials_required = false;
        self
    }
}
