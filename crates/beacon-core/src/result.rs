//! Convenience result type alias for Beacon.

use crate::error::AppError;

/// A specialized `Result` type for Beacon operations.
///
/// Every crate in the workspace returns this so that command handlers,
/// hook handlers and transports share one failure channel.
pub type AppResult<T> = Result<T, AppError>;
