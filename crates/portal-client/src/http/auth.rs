//! Credential handling for API requests
//!
//! Supports three credential modes:
//! - Bearer tokens read from an injected provider
//! - Cookie sessions carried by the transport
//! - No credentials at all

use std::fmt;
use std::sync::{Arc, RwLock};

/// Source of the current bearer token.
///
/// The client only ever reads from a provider; writes (login, logout) happen
/// elsewhere in the host application.
pub trait CredentialProvider: Send + Sync {
    /// Current token, or `None` when the user is not signed in
    fn token(&self) -> Option<String>;
}

/// How the client proves identity to the server
#[derive(Clone, Default)]
pub enum CredentialMode {
    /// No credential is attached
    #[default]
    None,
    /// `Authorization: Bearer <token>` from the provider
    BearerToken(Arc<dyn CredentialProvider>),
    /// Session cookies travel with every request
    CookieSession,
}

impl CredentialMode {
    pub fn bearer(provider: impl CredentialProvider + 'static) -> Self {
        CredentialMode::BearerToken(Arc::new(provider))
    }

    /// Whether requests must be issued with "include credentials" semantics
    pub fn includes_cookies(&self) -> bool {
        matches!(self, CredentialMode::CookieSession)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CredentialMode::None => "none",
            CredentialMode::BearerToken(_) => "bearer",
            CredentialMode::CookieSession => "cookie",
        }
    }
}

impl fmt::Debug for CredentialMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialMode::None => write!(f, "None"),
            CredentialMode::BearerToken(_) => write!(f, "BearerToken(..)"),
            CredentialMode::CookieSession => write!(f, "CookieSession"),
        }
    }
}

/// Fixed token, mostly useful for service accounts and tests
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// Shared, replaceable token slot.
///
/// Clones share the same slot, so the login flow can hold one handle and
/// the client configuration another.
#[derive(Debug, Clone, Default)]
pub struct SharedTokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl SharedTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(token);
        store
    }

    /// Replace the stored token
    pub fn set_token(&self, token: impl Into<String>) {
        let mut slot = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(token.into());
    }

    /// Forget the stored token
    pub fn clear(&self) {
        let mut slot = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }
}

impl CredentialProvider for SharedTokenStore {
    fn token(&self) -> Option<String> {
        let slot = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.clone().filter(|token| !token.is_empty())
    }
}
