//! # beacon-core
//!
//! Core crate for the Beacon telemetry SDK. Contains the unified error
//! system, configuration schemas, the outgoing `Event` and `Payload`
//! types, and the traits that collaborators (transport, logger) implement.
//!
//! This crate has **no** internal dependencies on other Beacon crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
