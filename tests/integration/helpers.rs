//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};

use beacon_core::AppResult;
use beacon_runtime::testing::{RecordingLogger, RecordingTransport};
use beacon_runtime::{CONFIGURE, CommandOptions, ComponentCreator, Instance};

/// Test instance context
pub struct TestInstance {
    /// The instance under test, wired with the built-in components
    pub instance: Instance,
    /// Transport recording every request
    pub transport: Arc<RecordingTransport>,
    /// Logger recording every message
    pub logger: Arc<RecordingLogger>,
}

impl TestInstance {
    /// Create an unconfigured instance with a transport that returns no response
    pub fn new() -> Self {
        Self::with_transport(RecordingTransport::new())
    }

    /// Create an unconfigured instance around the given transport
    pub fn with_transport(transport: RecordingTransport) -> Self {
        Self::with_components(transport, Vec::new())
    }

    /// Create an unconfigured instance with extra components after the built-in ones
    pub fn with_components(
        transport: RecordingTransport,
        extra: Vec<Arc<dyn ComponentCreator>>,
    ) -> Self {
        let transport = Arc::new(transport);
        let logger = Arc::new(RecordingLogger::new());
        let mut creators = beacon_components::default_creators();
        creators.extend(extra);
        let instance = Instance::with_logger("alloy", transport.clone(), creators, logger.clone());
        Self {
            instance,
            transport,
            logger,
        }
    }

    /// Run `configure` with the given options merged over a valid org id
    pub async fn configure(&self, options: Value) -> AppResult<Value> {
        self.configure_with(CommandOptions::new(with_org_id(options)))
            .await
    }

    /// Run `configure` with fully-built options
    pub async fn configure_with(&self, options: CommandOptions) -> AppResult<Value> {
        self.instance.execute(CONFIGURE, options).await
    }

    /// Execute a command and wait for its result
    pub async fn execute(&self, command: &str, options: Value) -> AppResult<Value> {
        self.instance.execute(command, options).await
    }
}

/// Add `imsOrgId` to configure options that lack one
pub fn with_org_id(mut options: Value) -> Value {
    if let Value::Object(map) = &mut options {
        map.entry("imsOrgId").or_insert_with(|| json!("ABC123@AdobeOrg"));
        return options;
    }
    json!({ "imsOrgId": "ABC123@AdobeOrg" })
}
