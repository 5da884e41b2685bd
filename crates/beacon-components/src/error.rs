//! Error type for the built-in components.
//!
//! Maps onto `beacon_core::AppError` so command handlers can use `?`.

use beacon_core::{AppError, ErrorKind};
use thiserror::Error;

/// Failures raised by the built-in components.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// `setConsent` received a value other than `in` or `out`.
    #[error("Invalid consent value '{value}'. Expected \"in\" or \"out\".")]
    InvalidConsent {
        /// The rejected value.
        value: String,
    },

    /// Command options failed validation.
    #[error("Invalid {command} options: {source}")]
    InvalidOptions {
        /// The command whose options were rejected.
        command: &'static str,
        /// Validation details.
        #[source]
        source: validator::ValidationErrors,
    },
}

impl From<ComponentError> for AppError {
    fn from(err: ComponentError) -> Self {
        let kind = match &err {
            ComponentError::InvalidConsent { .. } | ComponentError::InvalidOptions { .. } => {
                ErrorKind::Validation
            }
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_validation() {
        let err: AppError = ComponentError::InvalidConsent {
            value: "maybe".into(),
        }
        .into();
        assert!(err.is(ErrorKind::Validation));
        assert!(err.message.contains("maybe"));
    }
}
