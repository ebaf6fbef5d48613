//! Portal Client - resilient API client for the business portal
//!
//! Turns a logical request (path, method, body, headers) into a network call
//! that tolerates transient failure, respects a per-attempt deadline, and
//! always resolves to either an [`ApiResponseEnvelope`] or an [`ApiError`].
//!
//! # Main Components
//!
//! - **Configuration**: immutable [`ClientConfig`] built once at startup
//! - **Credentials**: bearer tokens from an injected provider, or cookie sessions
//! - **Resilience**: fixed-delay retry of network failures and timeouts
//! - **Normalization**: heterogeneous server responses into one envelope
//!
//! # Example
//!
//! ```no_run
//! use portal_client::{ApiClient, ClientConfig, RequestOptions};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder("https://portal.example.com/api").build()?;
//!     let client = ApiClient::new(config)?;
//!     let employees: portal_client::ApiResponseEnvelope = client
//!         .get("/employees", RequestOptions::new())
//!         .await?;
//!     println!("{}", employees.message);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;

// Re-export main types for convenience
pub use config::{ClientConfig, ClientConfigBuilder, Environment};
pub use error::{Error, Result};
pub use http::{
    // Facade
    ApiClient, RequestOptions, RequestSpec, Body, MultipartForm,

    // Outcomes
    ApiResponseEnvelope, ApiError, ErrorClassification, ErrorKind, FieldErrors,

    // Credentials
    CredentialMode, CredentialProvider, SharedTokenStore, StaticToken,

    // Transport seam
    Transport, RawRequest, RawResponse, TransportError, ReqwestTransport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
