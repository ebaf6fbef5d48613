//! Header set and header composition
//!
//! Merges default headers, per-call headers and the active credential into
//! the final header set sent with one request.

use crate::http::auth::CredentialMode;

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";

/// Ordered header list with case-insensitive names.
///
/// Inserting a name that already exists replaces it in place, so the last
/// write wins without reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.entries[index].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|index| self.entries.remove(index).1)
    }

    /// Overlay `other` on top of `self`
    pub fn extend(&mut self, other: &Headers) {
        for (name, value) in &other.entries {
            self.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Result of header composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedHeaders {
    pub headers: Headers,
    /// Issue the call with "include credentials" semantics
    pub include_credentials: bool,
}

/// Compose the header set for one request.
///
/// Defaults go first, per-call headers overwrite them. Binary bodies lose
/// any explicit `Content-Type` so the transport can set its own. The
/// credential is applied last and never overrides a caller-supplied
/// `Authorization` header.
pub fn compose_headers(
    defaults: &Headers,
    per_call: Option<&Headers>,
    binary_body: bool,
    credentials: &CredentialMode,
    credentials_required: bool,
) -> ComposedHeaders {
    let mut headers = defaults.clone();
    if let Some(per_call) = per_call {
        headers.extend(per_call);
    }

    if binary_body {
        headers.remove(CONTENT_TYPE);
    }

    let mut include_credentials = false;
    if credentials_required {
        match credentials {
            CredentialMode::BearerToken(provider) => {
                if !headers.contains(AUTHORIZATION) {
                    if let Some(token) = provider.token() {
                        headers.insert(AUTHORIZATION, format!("Bearer {}", token));
                    }
                }
            }
            CredentialMode::CookieSession => include_credentials = true,
            CredentialMode::None => {}
        }
    }

    ComposedHeaders {
        headers,
        include_credentials,
    }
}
