//! Configuration schemas.
//!
//! [`EdgeConfig`] is what the `configure` command receives; it is plain
//! data and can be deserialized from JSON options or from TOML files.
//! [`Configuration`] is the validated, read-only view the runtime hands to
//! every component, with the optional user callback attached.
//! [`AppConfig`] is the file/environment configuration used by the binary.

pub mod edge;
pub mod logging;

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::edge::{DefaultConsent, EdgeConfig};
pub use self::logging::{LogFormat, LoggingConfig};

use crate::error::{AppError, ErrorKind};
use crate::types::event::BeforeSendCallback;

/// Root configuration for the replay binary.
///
/// Deserialized from the merged TOML files (default + environment overlay)
/// and `BEACON__*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Instance configuration passed to the `configure` command.
    pub edge: EdgeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default`, the environment-specific overlay and
    /// environment variables prefixed with `BEACON__`. An explicit file path
    /// is layered on top when given.
    pub fn load(env: &str, path: Option<&str>) -> Result<Self, AppError> {
        Self::load_with(env, path, environment())
    }

    fn load_with(
        env: &str,
        path: Option<&str>,
        environment: config::Environment,
    ) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(environment)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

/// `BEACON__SECTION__KEY` variables. Keys arrive lowercased.
fn environment() -> config::Environment {
    config::Environment::with_prefix("BEACON")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Validated instance configuration, read-only to the core.
#[derive(Clone)]
pub struct Configuration {
    /// The validated edge settings.
    pub edge: EdgeConfig,
    /// User callback invoked with each event's final shape before it is sent.
    pub on_before_event_send: Option<BeforeSendCallback>,
}

impl Configuration {
    /// Validates `edge` and attaches the optional user callback.
    pub fn new(
        edge: EdgeConfig,
        on_before_event_send: Option<BeforeSendCallback>,
    ) -> Result<Self, AppError> {
        edge.validate()?;
        Ok(Self {
            edge,
            on_before_event_send,
        })
    }

    /// Parses `configure` command options into a configuration.
    pub fn from_options(
        options: &serde_json::Value,
        on_before_event_send: Option<BeforeSendCallback>,
    ) -> Result<Self, AppError> {
        let edge: EdgeConfig = serde_json::from_value(options.clone()).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid configure options: {e}"),
                e,
            )
        })?;
        Self::new(edge, on_before_event_send)
    }

    /// Organization identifier sent in the gateway metadata.
    pub fn ims_org_id(&self) -> &str {
        &self.edge.ims_org_id
    }

    /// Dataset events are validated against, if any.
    pub fn dataset_id(&self) -> Option<&str> {
        self.edge.dataset_id.as_deref()
    }

    /// Schema events are validated against, if any.
    pub fn schema_id(&self) -> Option<&str> {
        self.edge.schema_id.as_deref()
    }

    /// Whether debug logging was requested.
    pub fn debug(&self) -> bool {
        self.edge.debug
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("edge", &self.edge)
            .field(
                "on_before_event_send",
                &self.on_before_event_send.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}
