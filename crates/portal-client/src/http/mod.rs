//! Resilient HTTP client layer for the portal API
//!
//! This module provides:
//! - Request target building from a base URL and caller paths
//! - Header composition with bearer, cookie or no credentials
//! - Per-attempt deadlines with cancellation
//! - Retry of transient failures with a fixed delay
//! - Normalization of any response into one envelope or one error

pub mod auth;
pub mod builder;
pub mod client;
pub mod envelope;
pub mod error;
pub mod headers;
pub mod normalizer;
pub mod request;
pub mod retry;
pub mod timeout;
pub mod transport;

pub use auth::{CredentialMode, CredentialProvider, SharedTokenStore, StaticToken};
pub use builder::build_url;
pub use client::ApiClient;
pub use envelope::ApiResponseEnvelope;
pub use error::{ApiError, ErrorClassification, ErrorKind, FieldErrors};
pub use headers::{compose_headers, ComposedHeaders, Headers};
pub use normalizer::normalize_response;
pub use request::{Body, MultipartForm, MultipartPart, RequestOptions, RequestSpec};
pub use retry::{execute_with_retry, AttemptState, RetryDecision, RetryPolicy};
pub use timeout::with_deadline;
pub use transport::{RawRequest, RawResponse, ReqwestTransport, Transport, TransportError, WireBody};

// Re-export commonly used types
pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
