//! Unified error types for Beacon.
//!
//! Registry, hook, consent, dispatcher and transport failures all surface
//! as [`AppError`] so they propagate through the `?` operator and can be
//! handed to the [`Logger`](crate::traits::logger::Logger) collaborator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A component with the same name is already registered.
    DuplicateComponent,
    /// A command with the same name is already contributed by another component.
    DuplicateCommand,
    /// The registration phase has been closed.
    RegistrationClosed,
    /// The dispatcher cannot resolve a command name.
    UnknownCommand,
    /// A command other than `configure` ran before configuration.
    NotConfigured,
    /// `configure` ran more than once.
    AlreadyConfigured,
    /// A lifecycle hook handler failed.
    HookRejection,
    /// The user declined consent.
    ConsentDeclined,
    /// A user-supplied callback failed.
    Callback,
    /// Network dispatch failed.
    Transport,
    /// Input validation failed.
    Validation,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateComponent => write!(f, "DUPLICATE_COMPONENT"),
            Self::DuplicateCommand => write!(f, "DUPLICATE_COMMAND"),
            Self::RegistrationClosed => write!(f, "REGISTRATION_CLOSED"),
            Self::UnknownCommand => write!(f, "UNKNOWN_COMMAND"),
            Self::NotConfigured => write!(f, "NOT_CONFIGURED"),
            Self::AlreadyConfigured => write!(f, "ALREADY_CONFIGURED"),
            Self::HookRejection => write!(f, "HOOK_REJECTION"),
            Self::ConsentDeclined => write!(f, "CONSENT_DECLINED"),
            Self::Callback => write!(f, "CALLBACK"),
            Self::Transport => write!(f, "TRANSPORT"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified error used throughout Beacon.
///
/// Crate-specific failures are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a duplicate-component error.
    pub fn duplicate_component(name: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateComponent,
            format!("A component named '{name}' is already registered"),
        )
    }

    /// Create a duplicate-command error.
    pub fn duplicate_command(component: &str, commands: &[String]) -> Self {
        Self::new(
            ErrorKind::DuplicateCommand,
            format!(
                "Could not register {component} because it has existing command(s): {}",
                commands.join(",")
            ),
        )
    }

    /// Create a registration-closed error.
    pub fn registration_closed(name: &str) -> Self {
        Self::new(
            ErrorKind::RegistrationClosed,
            format!("Cannot register '{name}': the registration phase is closed"),
        )
    }

    /// Create an unknown-command error.
    pub fn unknown_command(name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownCommand,
            format!("The {name} command does not exist."),
        )
    }

    /// Create a not-configured error.
    pub fn not_configured() -> Self {
        Self::new(
            ErrorKind::NotConfigured,
            "The library must be configured first. Please do so by executing the configure command.",
        )
    }

    /// Create an already-configured error.
    pub fn already_configured() -> Self {
        Self::new(
            ErrorKind::AlreadyConfigured,
            "The library has already been configured and may only be configured once.",
        )
    }

    /// Create a hook-rejection error.
    pub fn hook_rejection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HookRejection, message)
    }

    /// Create a consent-declined error.
    pub fn consent_declined() -> Self {
        Self::new(ErrorKind::ConsentDeclined, "The user declined consent.")
    }

    /// Create a callback error.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Callback, message)
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns whether this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(
            ErrorKind::Validation,
            format!("Invalid configuration: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("boom");
        let err = AppError::with_source(ErrorKind::Transport, "send failed", io);
        assert!(std::error::Error::source(&err).is_some());

        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Transport);
        assert_eq!(cloned.message, "send failed");
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::unknown_command("fooBar");
        assert_eq!(
            err.to_string(),
            "UNKNOWN_COMMAND: The fooBar command does not exist."
        );
        assert!(err.is(ErrorKind::UnknownCommand));
    }

    #[test]
    fn test_duplicate_command_lists_names() {
        let err = AppError::duplicate_command("Privacy", &["setConsent".to_string()]);
        assert!(err.message.contains("Privacy"));
        assert!(err.message.contains("setConsent"));
    }
}
