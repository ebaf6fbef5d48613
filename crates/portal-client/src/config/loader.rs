//! Environment-driven configuration loading
//!
//! Reads `PORTAL_*` variables (optionally from a `.env` file) and produces a
//! validated [`ClientConfig`]. The deployment profile is read explicitly
//! from `PORTAL_ENV`; nothing else is inferred.

use std::str::FromStr;

use tracing::debug;

use crate::config::{ClientConfig, Environment};
use crate::http::auth::{CredentialMode, SharedTokenStore};
use crate::{Error, Result};

pub const ENV_BASE_URL: &str = "PORTAL_API_URL";
pub const ENV_PROFILE: &str = "PORTAL_ENV";
pub const ENV_TIMEOUT_MS: &str = "PORTAL_API_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "PORTAL_API_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "PORTAL_API_RETRY_DELAY_MS";
pub const ENV_AUTH: &str = "PORTAL_API_AUTH";
pub const ENV_TOKEN: &str = "PORTAL_API_TOKEN";

/// Load configuration from the process environment.
///
/// A `.env` file in the working directory is applied first when present.
/// Bearer mode is backed by a [`SharedTokenStore`] seeded from
/// `PORTAL_API_TOKEN`; use [`load_with`] to supply another provider.
pub fn load_from_env() -> Result<ClientConfig> {
    if dotenv::dotenv().is_ok() {
        debug!("loaded .env file");
    }
    load_with(|name| std::env::var(name).ok(), None)
}

/// Load configuration from an arbitrary variable lookup.
///
/// `bearer` replaces the default token store when `PORTAL_API_AUTH=bearer`.
pub fn load_with<F>(lookup: F, bearer: Option<CredentialMode>) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = lookup(ENV_BASE_URL).ok_or_else(|| Error::Environment {
        variable: ENV_BASE_URL.to_string(),
        message: "not set".to_string(),
    })?;

    let environment = match lookup(ENV_PROFILE) {
        Some(value) => value.parse::<Environment>().map_err(|e| Error::Environment {
            variable: ENV_PROFILE.to_string(),
            message: e.to_string(),
        })?,
        None => Environment::default(),
    };

    let mut builder = ClientConfig::for_environment(base_url, environment);

    if let Some(timeout_ms) = parse_var::<u64, _>(&lookup, ENV_TIMEOUT_MS)? {
        builder = builder.timeout_ms(timeout_ms);
    }
    if let Some(max_retries) = parse_var::<u32, _>(&lookup, ENV_MAX_RETRIES)? {
        builder = builder.max_retries(max_retries);
    }
    if let Some(retry_delay_ms) = parse_var::<u64, _>(&lookup, ENV_RETRY_DELAY_MS)? {
        builder = builder.retry_delay_ms(retry_delay_ms);
    }

    let credentials = match lookup(ENV_AUTH).map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("none") => CredentialMode::None,
        Some("cookie") | Some("session") => CredentialMode::CookieSession,
        Some("bearer") | Some("token") => match bearer {
            Some(mode) => mode,
            None => {
                let store = match lookup(ENV_TOKEN) {
                    Some(token) => SharedTokenStore::with_token(token),
                    None => SharedTokenStore::new(),
                };
                CredentialMode::bearer(store)
            }
        },
        Some(other) => {
            return Err(Error::Environment {
                variable: ENV_AUTH.to_string(),
                message: format!("unknown credential mode '{}'", other),
            })
        }
    };

    let config = builder.credentials(credentials).build()?;
    debug!(
        base_url = config.base_url(),
        environment = ?environment,
        max_retries = config.max_retries(),
        credentials = config.credentials().name(),
        "client configuration loaded"
    );
    Ok(config)
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| Error::Environment {
            variable: name.to_string(),
            message: format!("'{}': {}", raw, e),
        }),
    }
}
