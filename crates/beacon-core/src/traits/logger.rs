//! Logger collaborator.

use crate::error::AppError;

/// Instance logger used to report isolated failures.
///
/// Output is gated by a runtime switch so the `debug` setting and the
/// `log` command can turn it on and off.
pub trait Logger: Send + Sync {
    /// Whether output is currently enabled.
    fn is_enabled(&self) -> bool;

    /// Turns output on or off.
    fn set_enabled(&self, enabled: bool);

    /// Logs an informational message.
    fn info(&self, message: &str);

    /// Logs a warning.
    fn warn(&self, message: &str);

    /// Reports an error.
    fn error(&self, error: &AppError);
}
