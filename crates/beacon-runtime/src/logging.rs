//! Instance logger backed by `tracing`.

use std::sync::atomic::{AtomicBool, Ordering};

use beacon_core::AppError;
use beacon_core::traits::Logger;

/// Logger that prefixes messages with `[namespace]` and forwards them to
/// `tracing` while enabled.
///
/// Starts disabled; the `debug` setting and the `log` command turn it on.
#[derive(Debug)]
pub struct TracingLogger {
    prefix: String,
    enabled: AtomicBool,
}

impl TracingLogger {
    /// Creates a disabled logger for a namespace.
    pub fn new(namespace: &str) -> Self {
        Self {
            prefix: format!("[{namespace}]"),
            enabled: AtomicBool::new(false),
        }
    }

    /// The message prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Logger for TracingLogger {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn info(&self, message: &str) {
        if self.is_enabled() {
            tracing::info!("{} {}", self.prefix, message);
        }
    }

    fn warn(&self, message: &str) {
        if self.is_enabled() {
            tracing::warn!("{} {}", self.prefix, message);
        }
    }

    fn error(&self, error: &AppError) {
        if self.is_enabled() {
            tracing::error!(kind = %error.kind, "{} {}", self.prefix, error.message);
        }
    }
}
