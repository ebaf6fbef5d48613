//! Shared test support utilities for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use portal_client::http::CancellationToken;
use portal_client::{
    ApiClient, ClientConfig, CredentialMode, RawRequest, RawResponse, Transport, TransportError,
};

/// One scripted transport outcome
#[derive(Debug, Clone)]
pub enum Step {
    /// Answer with this response
    Respond(RawResponse),
    /// Fail below the HTTP layer
    Fail(TransportError),
    /// Never settle until cancelled
    Hang,
}

impl Step {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Step::Respond(RawResponse::new(status, body.to_string()))
    }

    pub fn text(status: u16, body: &str) -> Self {
        Step::Respond(RawResponse::new(status, body))
    }

    pub fn network() -> Self {
        Step::Fail(TransportError::Network("connection refused".to_string()))
    }
}

/// In-memory transport that replays a script.
///
/// The last step repeats once the script runs out. Every request and every
/// cancellation token handed to the transport is recorded.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<RawRequest>>,
    tokens: Mutex<Vec<CancellationToken>>,
    aborted: AtomicU32,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            ..Default::default()
        })
    }

    pub fn attempts(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RawRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<CancellationToken> {
        self.tokens.lock().unwrap().clone()
    }

    /// Hanging attempts that observed their cancellation
    pub fn aborted(&self) -> u32 {
        self.aborted.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or(Step::Hang)
        }
    }
}

/// Bumps the abort counter when a hanging attempt is dropped after cancellation
struct AbortGuard<'a> {
    token: CancellationToken,
    counter: &'a AtomicU32,
}

impl Drop for AbortGuard<'_> {
    fn drop(&mut self) {
        if self.token.is_cancelled() {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: RawRequest,
        cancel: CancellationToken,
    ) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.tokens.lock().unwrap().push(cancel.clone());

        match self.next_step() {
            Step::Respond(response) => Ok(response),
            Step::Fail(error) => Err(error),
            Step::Hang => {
                let _guard = AbortGuard {
                    token: cancel.clone(),
                    counter: &self.aborted,
                };
                cancel.cancelled().await;
                Err(TransportError::Aborted)
            }
        }
    }
}

/// Config with fast timings for tests
pub fn fast_config(max_retries: u32, credentials: CredentialMode) -> ClientConfig {
    ClientConfig::builder("https://portal.example.com/api")
        .max_retries(max_retries)
        .retry_delay_ms(5)
        .timeout_ms(200)
        .credentials(credentials)
        .build()
        .expect("valid test config")
}

/// Client over a scripted transport
pub fn scripted_client(
    steps: Vec<Step>,
    max_retries: u32,
) -> (ApiClient, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new(steps);
    let config = fast_config(max_retries, CredentialMode::None);
    let client = ApiClient::with_transport(config, transport.clone());
    (client, transport)
}
