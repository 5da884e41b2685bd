//! Per-namespace instance: owns the context objects and the command queue.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use beacon_core::AppResult;
use beacon_core::traits::{Logger, Transport};

use crate::command::configure::ConfigureCommand;
use crate::command::dispatcher::CommandRouter;
use crate::command::log::LogCommand;
use crate::command::{CommandDispatcher, CommandOptions, ErrorPolicy, LOG};
use crate::component::ComponentCreator;
use crate::consent::ConsentGate;
use crate::hooks::{HookDispatcher, HookRegistry};
use crate::logging::TracingLogger;
use crate::registry::ComponentRegistry;

/// One entry of a pre-load command queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandCall {
    /// Command name.
    pub command: String,
    /// JSON options.
    #[serde(default)]
    pub options: Value,
}

impl CommandCall {
    /// Creates a call.
    pub fn new(command: impl Into<String>, options: Value) -> Self {
        Self {
            command: command.into(),
            options,
        }
    }
}

/// A configured-on-demand SDK instance.
///
/// Everything is created once here and shared by reference; nothing is
/// global, so several namespaces can coexist.
pub struct Instance {
    namespace: String,
    dispatcher: CommandDispatcher,
    registry: Arc<ComponentRegistry>,
    hooks: HookDispatcher,
    consent: Arc<ConsentGate>,
    logger: Arc<dyn Logger>,
}

impl Instance {
    /// Creates an instance that logs through `tracing`.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(
        namespace: &str,
        transport: Arc<dyn Transport>,
        creators: Vec<Arc<dyn ComponentCreator>>,
    ) -> Self {
        Self::with_logger(
            namespace,
            transport,
            creators,
            Arc::new(TracingLogger::new(namespace)),
        )
    }

    /// Creates an instance with a custom logger.
    pub fn with_logger(
        namespace: &str,
        transport: Arc<dyn Transport>,
        creators: Vec<Arc<dyn ComponentCreator>>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let registry = Arc::new(ComponentRegistry::new());
        let hooks = HookDispatcher::new(Arc::new(HookRegistry::new()));
        let consent = Arc::new(ConsentGate::new());
        let policy = Arc::new(ErrorPolicy::new(Arc::clone(&logger)));

        let configure = ConfigureCommand::new(
            namespace,
            creators,
            Arc::clone(&registry),
            hooks.clone(),
            Arc::clone(&consent),
            transport,
            Arc::clone(&logger),
            Arc::clone(&policy),
        );
        let router = CommandRouter::new(Arc::new(configure), Arc::clone(&registry))
            .with_core_command(LOG, Arc::new(LogCommand::new(Arc::clone(&logger))));
        let dispatcher = CommandDispatcher::spawn(router, policy);

        info!(namespace = %namespace, "Instance created");

        Self {
            namespace: namespace.to_string(),
            dispatcher,
            registry,
            hooks,
            consent,
            logger,
        }
    }

    /// Executes a command and waits for its result.
    pub async fn execute(&self, name: &str, options: impl Into<CommandOptions>) -> AppResult<Value> {
        self.dispatcher.execute(name, options.into()).await
    }

    /// Enqueues a command now and returns a future for its result.
    ///
    /// The command runs even if the returned future is dropped.
    pub fn submit<T: Into<CommandOptions>>(
        &self,
        name: &str,
        options: T,
    ) -> impl Future<Output = AppResult<Value>> + Send + use<T> {
        self.dispatcher.submit(name, options.into())
    }

    /// Replays a pre-load queue: every call is enqueued in order before
    /// any result is awaited. Results are returned in call order.
    pub async fn replay(&self, calls: Vec<CommandCall>) -> Vec<AppResult<Value>> {
        info!(namespace = %self.namespace, count = calls.len(), "Replaying queued commands");
        let pending: Vec<_> = calls
            .into_iter()
            .map(|call| self.submit(&call.command, call.options))
            .collect();
        join_all(pending).await
    }

    /// Instance namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The consent gate.
    pub fn consent(&self) -> &Arc<ConsentGate> {
        &self.consent
    }

    /// The instance logger.
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// The component registry.
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// The hook dispatcher, for collaborators that fire transport hooks.
    pub fn hooks(&self) -> &HookDispatcher {
        &self.hooks
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("namespace", &self.namespace)
            .field("consent", &self.consent.state())
            .finish_non_exhaustive()
    }
}
