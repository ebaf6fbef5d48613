//! Error types for the portal client library
//!
//! Construction and configuration failures surface as [`Error`]. Failures of
//! an individual API call are reported as [`crate::http::ApiError`] instead,
//! so page code only ever has to branch on one shape per call.

use thiserror::Error;

/// Main error type for client construction and configuration
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The underlying HTTP transport could not be created
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Environment variable present but unusable
    #[error("Environment error: {variable} - {message}")]
    Environment { variable: String, message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("base URL is empty");
        assert_eq!(err.to_string(), "Configuration error: base URL is empty");

        let err = Error::Environment {
            variable: "PORTAL_API_TIMEOUT_MS".to_string(),
            message: "not a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Environment error: PORTAL_API_TIMEOUT_MS - not a number"
        );
    }

    #[test]
    fn test_configuration_source_is_exposed() {
        let err = Error::Configuration {
            message: "bad url".to_string(),
            source: Some(anyhow::anyhow!("relative URL without a base")),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("relative URL without a base"));
    }
}
