//! Unified API client orchestrating all components
//!
//! One call path per HTTP verb: build the URL, compose headers, encode the
//! body, then run attempts under the retry policy, each attempt under its
//! own deadline, normalizing whatever the server sends back.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::http::builder::build_url;
use crate::http::envelope::ApiResponseEnvelope;
use crate::http::error::ApiError;
use crate::http::headers::{compose_headers, Headers};
use crate::http::normalizer::normalize_response;
use crate::http::request::{Body, RequestOptions, RequestSpec};
use crate::http::retry::execute_with_retry;
use crate::http::timeout::with_deadline;
use crate::http::transport::{RawRequest, ReqwestTransport, Transport, WireBody};
use crate::Result;

/// Resilient client for the portal API
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Create a client on top of `reqwest`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client on top of any transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// New client with different configuration, sharing the transport
    pub fn with_config(&self, config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
            transport: self.transport.clone(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> std::result::Result<ApiResponseEnvelope<T>, ApiError> {
        self.request(RequestSpec::new(Method::GET, path), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> std::result::Result<ApiResponseEnvelope<T>, ApiError> {
        self.request(RequestSpec::new(Method::DELETE, path), options).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl Into<Body>,
        options: RequestOptions,
    ) -> std::result::Result<ApiResponseEnvelope<T>, ApiError> {
        self.request(RequestSpec::new(Method::POST, path).with_body(body), options)
            .await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl Into<Body>,
        options: RequestOptions,
    ) -> std::result::Result<ApiResponseEnvelope<T>, ApiError> {
        self.request(RequestSpec::new(Method::PUT, path).with_body(body), options)
            .await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl Into<Body>,
        options: RequestOptions,
    ) -> std::result::Result<ApiResponseEnvelope<T>, ApiError> {
        self.request(RequestSpec::new(Method::PATCH, path).with_body(body), options)
            .await
    }

    /// Execute an arbitrary request description
    pub async fn request<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
        options: RequestOptions,
    ) -> std::result::Result<ApiResponseEnvelope<T>, ApiError> {
        let raw = self.prepare(spec, &options);
        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());
        let cancel = options.cancel.as_ref();
        let transport = &self.transport;

        debug!(method = %raw.method, url = %raw.url, "dispatching request");

        let (status, envelope) = execute_with_retry(self.config.retry_policy(), cancel, |attempt| {
            let raw = raw.clone();
            async move {
                debug!(attempt, method = %raw.method, url = %raw.url, "starting attempt");
                with_deadline(timeout, cancel, |token| async move {
                    let response = transport.send(raw, token).await.map_err(ApiError::from)?;
                    debug!(attempt, status = response.status, "attempt settled");
                    let envelope = normalize_response(&response)?;
                    Ok::<_, ApiError>((response.status, envelope))
                })
                .await
            }
        })
        .await?;

        envelope.decode(status)
    }

    /// Turn a logical request into the wire request shared by all attempts
    fn prepare(&self, spec: RequestSpec, options: &RequestOptions) -> RawRequest {
        let url = build_url(self.config.base_url(), &spec.path);
        let per_call = merge_per_call(spec.headers.as_ref(), options.headers.as_ref());
        let credentials_required = spec.credentials_required && options.credentials_required;

        let composed = compose_headers(
            self.config.default_headers(),
            per_call.as_ref(),
            spec.has_binary_body(),
            self.config.credentials(),
            credentials_required,
        );

        RawRequest {
            method: spec.method,
            url,
            headers: composed.headers,
            body: encode_body(spec.body),
            include_credentials: composed.include_credentials,
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("config", &self.config).finish()
    }
}

fn merge_per_call(spec: Option<&Headers>, options: Option<&Headers>) -> Option<Headers> {
    match (spec, options) {
        (None, None) => None,
        (Some(headers), None) | (None, Some(headers)) => Some(headers.clone()),
        (Some(spec), Some(options)) => {
            let mut merged = spec.clone();
            merged.extend(options);
            Some(merged)
        }
    }
}

/// Serialize structured bodies; text and binary go out untouched
fn encode_body(body: Option<Body>) -> WireBody {
    match body {
        None => WireBody::Empty,
        Some(Body::Json(value)) => WireBody::Text(value.to_string()),
        Some(Body::Text(text)) => WireBody::Text(text),
        Some(Body::Bytes(bytes)) => WireBody::Bytes(bytes),
        Some(Body::Multipart(form)) => WireBody::Multipart(form),
    }
}
