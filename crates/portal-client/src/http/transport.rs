//! Network primitive the client is layered on
//!
//! A [`Transport`] issues exactly one HTTP request and hands back status,
//! headers and body text. It must abort the in-flight call once the
//! cancellation token fires.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::http::error::{ApiError, NETWORK_STATUS};
use crate::http::headers::Headers;
use crate::http::request::{MultipartForm, MultipartPart};
use crate::{Error, Result};

/// Body as it goes on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum WireBody {
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    Multipart(MultipartForm),
}

/// One fully composed request
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: WireBody,
    pub include_credentials: bool,
}

/// One raw response, not yet interpreted
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: String,
}

impl RawResponse {
    /// Response with the canonical reason phrase for `status`
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();

        Self {
            status,
            status_text,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request aborted")]
    Aborted,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Single-request HTTP capability
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request`, aborting as soon as `cancel` fires
    async fn send(
        &self,
        request: RawRequest,
        cancel: CancellationToken,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    /// Client with a cookie store, used for "include credentials" calls
    cookie_client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = ReqwestClient::builder().build().map_err(|e| Error::Transport {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
        })?;

        let cookie_client = ReqwestClient::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Transport {
                message: format!("Failed to create cookie-aware HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, cookie_client })
    }

    fn build_headers(headers: &Headers) -> std::result::Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::new();
        for (name, value) in headers.iter() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::InvalidRequest(format!("header name {}: {}", name, e))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::InvalidRequest(format!("header value for {}: {}", name, e))
            })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    fn build_form(
        form: &MultipartForm,
    ) -> std::result::Result<reqwest::multipart::Form, TransportError> {
        let mut multipart = reqwest::multipart::Form::new();
        for part in form.parts() {
            multipart = match part {
                MultipartPart::Text { name, value } => multipart.text(name.clone(), value.clone()),
                MultipartPart::File {
                    name,
                    file_name,
                    mime_type,
                    bytes,
                } => {
                    let mut file =
                        reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = mime_type {
                        file = file.mime_str(mime).map_err(|e| {
                            TransportError::InvalidRequest(format!("mime type {}: {}", mime, e))
                        })?;
                    }
                    multipart.part(name.clone(), file)
                }
            };
        }
        Ok(multipart)
    }

    async fn execute(
        &self,
        request: RawRequest,
    ) -> std::result::Result<RawResponse, TransportError> {
        let client = if request.include_credentials {
            &self.cookie_client
        } else {
            &self.client
        };

        let mut builder = client
            .request(request.method, &request.url)
            .headers(Self::build_headers(&request.headers)?);

        builder = match request.body {
            WireBody::Empty => builder,
            WireBody::Text(text) => builder.body(text),
            WireBody::Bytes(bytes) => builder.body(bytes),
            WireBody::Multipart(form) => builder.multipart(Self::build_form(&form)?),
        };

        let response = builder.send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(classify_reqwest_error)?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: RawRequest,
        cancel: CancellationToken,
    ) -> std::result::Result<RawResponse, TransportError> {
        // Dropping the reqwest future aborts the connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Aborted),
            result = self.execute(request) => result,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Network(message) => ApiError::network(message),
            TransportError::Aborted => ApiError::cancelled(),
            TransportError::InvalidRequest(message) => ApiError::encoding(NETWORK_STATUS, message),
        }
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_status_text() {
        let response = RawResponse::new(404, "");
        assert_eq!(response.status_text, "Not Found");
        assert!(!response.is_ok());

        let response = RawResponse::new(299, "");
        assert_eq!(response.status_text, "");
        assert!(response.is_ok());
    }

    #[test]
    fn test_transport_errors_map_to_api_errors() {
        use crate::http::error::ErrorKind;

        let err = ApiError::from(TransportError::Network("refused".to_string()));
        assert_eq!((err.status, err.kind), (0, ErrorKind::Network));
        assert!(err.is_retryable());

        let err = ApiError::from(TransportError::Aborted);
        assert_eq!(err.kind, ErrorKind::Cancelled);

        let err = ApiError::from(TransportError::InvalidRequest("bad header".to_string()));
        assert_eq!(err.kind, ErrorKind::Encoding);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let headers: Headers = [("X-Bad", "line\nbreak")].into_iter().collect();
        let err = ReqwestTransport::build_headers(&headers).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[test]
    fn test_invalid_mime_is_rejected() {
        let form = MultipartForm::new().file("file", "a.bin", Some("not a mime"), vec![1]);
        let err = ReqwestTransport::build_form(&form).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_before_sending() {
        let transport = ReqwestTransport::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let request = RawRequest {
            method: Method::GET,
            url: "http://10.255.255.1/unroutable".to_string(),
            headers: Headers::new(),
            body: WireBody::Empty,
            include_credentials: false,
        };

        let result = transport.send(request, cancel).await;
        assert_eq!(result.unwrap_err(), TransportError::Aborted);
    }
}
