//! Test doubles for wiring an instance without a network.
//!
//! Provides:
//! - [`Journal`]: a shared, ordered log of named steps
//! - [`RecordingTransport`]: a transport that records every request
//! - [`RecordingLogger`]: a logger that keeps every message
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use beacon_runtime::testing::{RecordingLogger, RecordingTransport};
//!
//! let transport = Arc::new(RecordingTransport::new().with_response(serde_json::json!({})));
//! let logger = Arc::new(RecordingLogger::new());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use beacon_core::traits::{Logger, RequestOptions, Transport};
use beacon_core::types::Payload;
use beacon_core::{AppError, AppResult};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared ordered record of steps, for asserting cross-collaborator ordering.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn record(&self, step: impl Into<String>) {
        lock(&self.0).push(step.into());
    }

    /// Steps recorded so far.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }
}

/// One request seen by a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// `payload.to_json()` at send time.
    pub body: Value,
    /// Flags passed with the request.
    pub options: RequestOptions,
}

/// Transport that records requests and answers with a canned outcome.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    response: Option<Value>,
    failure: Option<AppError>,
    journal: Option<Journal>,
    expects_response: bool,
    use_id_third_party_domain: bool,
}

impl RecordingTransport {
    /// A transport that resolves with no response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every request with `response`.
    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Fails every request with `error`.
    pub fn failing(mut self, error: AppError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Records `sendRequest` in `journal` on every request.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Flags set on every payload this transport creates.
    pub fn with_payload_flags(mut self, expects_response: bool, use_id_third_party_domain: bool) -> Self {
        self.expects_response = expects_response;
        self.use_id_third_party_domain = use_id_third_party_domain;
        self
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests seen so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn create_payload(&self) -> Payload {
        let payload = Payload::new();
        if self.expects_response {
            payload.expect_response();
        }
        if self.use_id_third_party_domain {
            payload.use_id_third_party_domain();
        }
        payload
    }

    async fn send_request(
        &self,
        payload: &Payload,
        options: RequestOptions,
    ) -> AppResult<Option<Value>> {
        if let Some(journal) = &self.journal {
            journal.record("sendRequest");
        }
        lock(&self.requests).push(RecordedRequest {
            body: payload.to_json(),
            options,
        });
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.response.clone()),
        }
    }
}

/// Logger that keeps everything it is given, regardless of the switch.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    enabled: AtomicBool,
    infos: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<AppError>>,
}

impl RecordingLogger {
    /// Creates a disabled, empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Informational messages seen so far.
    pub fn infos(&self) -> Vec<String> {
        lock(&self.infos).clone()
    }

    /// Warnings seen so far.
    pub fn warnings(&self) -> Vec<String> {
        lock(&self.warnings).clone()
    }

    /// Errors seen so far.
    pub fn errors(&self) -> Vec<AppError> {
        lock(&self.errors).clone()
    }
}

impl Logger for RecordingLogger {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn info(&self, message: &str) {
        lock(&self.infos).push(message.to_string());
    }

    fn warn(&self, message: &str) {
        lock(&self.warnings).push(message.to_string());
    }

    fn error(&self, error: &AppError) {
        lock(&self.errors).push(error.clone());
    }
}
