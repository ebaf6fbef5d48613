//! Client configuration
//!
//! [`ClientConfig`] is built once, validated, and never mutated afterwards.
//! A different configuration means a new value (see
//! [`ClientConfig::to_builder`]) and a new client.

pub mod loader;

use std::str::FromStr;
use std::time::Duration;

use crate::http::auth::CredentialMode;
use crate::http::headers::{Headers, ACCEPT, CONTENT_TYPE};
use crate::http::retry::RetryPolicy;
use crate::{Error, Result};

pub use loader::load_from_env;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Deployment profile; decides the default retry budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Fail fast, no retries
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn default_max_retries(&self) -> u32 {
        match self {
            Environment::Development => 0,
            Environment::Production => 2,
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" | "test" => Ok(Environment::Development),
            "production" | "prod" | "staging" => Ok(Environment::Production),
            other => Err(Error::configuration(format!("Unknown environment: {}", other))),
        }
    }
}

/// Immutable client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    default_headers: Headers,
    timeout_ms: u64,
    max_retries: u32,
    retry_delay_ms: u64,
    credentials: CredentialMode,
}

impl ClientConfig {
    /// Start a builder with production defaults
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Start a builder whose retry default follows `environment`
    pub fn for_environment(
        base_url: impl Into<String>,
        environment: Environment,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url).environment(environment)
    }

    /// Builder seeded with this configuration
    pub fn to_builder(&self) -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: self.base_url.clone(),
            default_headers: self.default_headers.clone(),
            timeout_ms: self.timeout_ms,
            max_retries: Some(self.max_retries),
            retry_delay_ms: self.retry_delay_ms,
            credentials: self.credentials.clone(),
            environment: Environment::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_delay_ms(&self) -> u64 {
        self.retry_delay_ms
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries).with_delay(Duration::from_millis(self.retry_delay_ms))
    }

    pub fn credentials(&self) -> &CredentialMode {
        &self.credentials
    }
}

/// Fluent builder for [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: String,
    default_headers: Headers,
    timeout_ms: u64,
    max_retries: Option<u32>,
    retry_delay_ms: u64,
    credentials: CredentialMode,
    environment: Environment,
}

impl ClientConfigBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        let default_headers = [(CONTENT_TYPE, "application/json"), (ACCEPT, "application/json")]
            .into_iter()
            .collect();

        Self {
            base_url: base_url.into(),
            default_headers,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: None,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            credentials: CredentialMode::None,
            environment: Environment::default(),
        }
    }

    /// Profile used when `max_retries` is not set explicitly
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Set a default header; same-named headers are replaced
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Replace the whole default header set
    pub fn default_headers(mut self, headers: Headers) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn credentials(mut self, credentials: CredentialMode) -> Self {
        self.credentials = credentials;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = self.base_url.trim().to_string();
        validate_base_url(&base_url)?;

        if self.timeout_ms == 0 {
            return Err(Error::configuration("Timeout cannot be zero"));
        }

        Ok(ClientConfig {
            base_url,
            default_headers: self.default_headers,
            timeout_ms: self.timeout_ms,
            max_retries: self
                .max_retries
                .unwrap_or_else(|| self.environment.default_max_retries()),
            retry_delay_ms: self.retry_delay_ms,
            credentials: self.credentials,
        })
    }
}

fn validate_base_url(base_url: &str) -> Result<()> {
    if base_url.is_empty() {
        return Err(Error::configuration("Base URL cannot be empty"));
    }

    let parsed = url::Url::parse(base_url).map_err(|e| Error::Configuration {
        message: format!("Invalid base URL: {}", base_url),
        source: Some(anyhow::Error::new(e)),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::configuration(format!(
            "Unsupported base URL scheme: {}",
            scheme
        ))),
    }
}
