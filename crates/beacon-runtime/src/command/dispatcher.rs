//! Command dispatcher: a single worker task that runs commands in submission order.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use beacon_core::traits::Logger;
use beacon_core::{AppError, AppResult};

use super::{CONFIGURE, CommandHandler, CommandOptions, CommandOutput};
use crate::registry::ComponentRegistry;

/// What happens to a failed command's error.
pub struct ErrorPolicy {
    errors_enabled: AtomicBool,
    logger: Arc<dyn Logger>,
}

impl ErrorPolicy {
    /// Errors are returned to callers until told otherwise.
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            errors_enabled: AtomicBool::new(true),
            logger,
        }
    }

    /// Chooses between returning errors and logging them.
    pub fn set_errors_enabled(&self, enabled: bool) {
        self.errors_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether failed commands return their error.
    pub fn errors_enabled(&self) -> bool {
        self.errors_enabled.load(Ordering::SeqCst)
    }

    /// Applies the policy to a command's final result.
    ///
    /// With errors disabled, a failure is logged and the command resolves
    /// with `null`.
    pub fn apply(&self, result: AppResult<Value>) -> AppResult<Value> {
        match result {
            Err(err) if !self.errors_enabled() => {
                self.logger.error(&err);
                Ok(Value::Null)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorPolicy")
            .field("errors_enabled", &self.errors_enabled())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Unconfigured,
    Configured,
    Failed(AppError),
}

/// Resolves command names to handlers and enforces configure-first.
pub struct CommandRouter {
    phase: Phase,
    configure: Arc<dyn CommandHandler>,
    core: HashMap<String, Arc<dyn CommandHandler>>,
    registry: Arc<ComponentRegistry>,
}

impl CommandRouter {
    /// Creates a router with the `configure` handler and the component registry.
    pub fn new(configure: Arc<dyn CommandHandler>, registry: Arc<ComponentRegistry>) -> Self {
        Self {
            phase: Phase::Unconfigured,
            configure,
            core: HashMap::new(),
            registry,
        }
    }

    /// Adds a core command that is available before configuration.
    pub fn with_core_command(mut self, name: &str, handler: Arc<dyn CommandHandler>) -> Self {
        self.core.insert(name.to_string(), handler);
        self
    }

    /// Runs the serialized phase of one command.
    pub async fn route(&mut self, name: &str, options: CommandOptions) -> AppResult<CommandOutput> {
        if name == CONFIGURE {
            if !matches!(self.phase, Phase::Unconfigured) {
                return Err(AppError::already_configured());
            }
            let result = self.configure.run(options).await;
            self.phase = match &result {
                Ok(_) => Phase::Configured,
                Err(err) => Phase::Failed(err.clone()),
            };
            return result;
        }

        if let Some(handler) = self.core.get(name) {
            return handler.run(options).await;
        }

        match &self.phase {
            Phase::Unconfigured => return Err(AppError::not_configured()),
            Phase::Failed(err) => return Err(err.clone()),
            Phase::Configured => {}
        }

        let handler = self
            .registry
            .command(name)
            .await
            .ok_or_else(|| AppError::unknown_command(name))?;
        handler.run(options).await
    }
}

struct QueuedCommand {
    name: String,
    options: CommandOptions,
    respond: oneshot::Sender<Reply>,
}

/// What the queue worker hands back once a command leaves the queue.
enum Reply {
    /// The final result, with the error policy applied.
    Ready(AppResult<Value>),
    /// The deferred phase, already running on its own task.
    Running(JoinHandle<AppResult<Value>>),
}

/// Handle to the serialized command queue.
#[derive(Clone)]
pub struct CommandDispatcher {
    sender: mpsc::UnboundedSender<QueuedCommand>,
    policy: Arc<ErrorPolicy>,
}

impl CommandDispatcher {
    /// Spawns the queue worker. Must be called within a Tokio runtime.
    pub fn spawn(router: CommandRouter, policy: Arc<ErrorPolicy>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_queue(router, Arc::clone(&policy), receiver));
        Self { sender, policy }
    }

    /// Enqueues a command and returns its eventual result.
    ///
    /// The command is placed on the queue before this returns, so the order
    /// of `submit` calls is the execution order regardless of when the
    /// returned futures are awaited. The command runs to completion even if
    /// the returned future is dropped.
    pub fn submit(
        &self,
        name: &str,
        options: CommandOptions,
    ) -> impl Future<Output = AppResult<Value>> + Send + use<> {
        let (respond, response) = oneshot::channel();
        let queued = QueuedCommand {
            name: name.to_string(),
            options,
            respond,
        };
        let enqueued = self.sender.send(queued).is_ok();
        if enqueued {
            tracing::debug!(command = %name, "Command queued");
        } else {
            tracing::error!(command = %name, "Command queue is closed");
        }
        let policy = Arc::clone(&self.policy);
        let name = name.to_string();

        async move {
            match response.await {
                Ok(Reply::Ready(result)) => result,
                Ok(Reply::Running(handle)) => handle.await.unwrap_or_else(|_| {
                    policy.apply(Err(AppError::internal(format!(
                        "The {name} command was cancelled."
                    ))))
                }),
                Err(_) => policy.apply(Err(AppError::internal("The command queue stopped"))),
            }
        }
    }

    /// Enqueues a command and waits for its result.
    pub async fn execute(&self, name: &str, options: CommandOptions) -> AppResult<Value> {
        self.submit(name, options).await
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("closed", &self.sender.is_closed())
            .field("policy", &self.policy)
            .finish()
    }
}

fn panicked(name: &str) -> AppError {
    AppError::internal(format!("The {name} command panicked."))
}

async fn run_queue(
    mut router: CommandRouter,
    policy: Arc<ErrorPolicy>,
    mut receiver: mpsc::UnboundedReceiver<QueuedCommand>,
) {
    while let Some(command) = receiver.recv().await {
        let QueuedCommand {
            name,
            options,
            respond,
        } = command;
        tracing::debug!(command = %name, "Running command");

        let routed = AssertUnwindSafe(router.route(&name, options))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(panicked(&name)));

        let reply = match routed {
            Ok(CommandOutput::Done(value)) => Reply::Ready(Ok(value)),
            Ok(output) => {
                let policy = Arc::clone(&policy);
                let task_name = name.clone();
                Reply::Running(tokio::spawn(async move {
                    let result = AssertUnwindSafe(output.resolve())
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| Err(panicked(&task_name)));
                    if let Err(err) = &result {
                        tracing::debug!(command = %task_name, error = %err, "Command failed");
                    }
                    policy.apply(result)
                }))
            }
            Err(err) => {
                tracing::debug!(command = %name, error = %err, "Command failed");
                Reply::Ready(policy.apply(Err(err)))
            }
        };

        if respond.send(reply).is_err() {
            tracing::trace!(command = %name, "Command caller went away");
        }
    }
    tracing::debug!("Command queue closed");
}
