//! Commands: the named operations callers execute against an instance.
//!
//! A command runs in two phases. [`CommandHandler::run`] executes on the
//! dispatcher's serialized queue, one command at a time in submission order.
//! It may finish there ([`CommandOutput::Done`]) or hand back a
//! continuation ([`CommandOutput::Deferred`]) that the caller drives outside
//! the queue, so a send waiting on consent never blocks the commands
//! queued behind it.

pub mod configure;
pub mod dispatcher;
pub mod log;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use beacon_core::types::BeforeSendCallback;
use beacon_core::{AppError, AppResult};

pub use self::dispatcher::{CommandDispatcher, ErrorPolicy};

/// Name of the command that configures an instance.
pub const CONFIGURE: &str = "configure";

/// Name of the core command that toggles logging.
pub const LOG: &str = "log";

/// Options passed to a command.
#[derive(Clone, Default)]
pub struct CommandOptions {
    /// JSON parameters.
    pub params: Value,
    /// Callback carried by `configure`; JSON cannot express it.
    pub on_before_event_send: Option<BeforeSendCallback>,
}

impl CommandOptions {
    /// Options with the given JSON parameters.
    pub fn new(params: Value) -> Self {
        Self {
            params,
            on_before_event_send: None,
        }
    }

    /// Options with no parameters.
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// Attaches an `onBeforeEventSend` callback.
    pub fn with_before_send<F>(mut self, callback: F) -> Self
    where
        F: Fn(&beacon_core::types::EventSnapshot) -> AppResult<()> + Send + Sync + 'static,
    {
        self.on_before_event_send = Some(Arc::new(callback));
        self
    }

    /// Returns a single parameter, if present.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Deserializes the parameters into a typed options struct.
    ///
    /// A missing (`null`) parameter object is treated as `{}`.
    pub fn parse<T: DeserializeOwned>(&self, command: &str) -> AppResult<T> {
        let params = match &self.params {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };
        serde_json::from_value(params).map_err(|e| {
            AppError::validation(format!("Invalid options for the {command} command: {e}"))
        })
    }
}

impl From<Value> for CommandOptions {
    fn from(params: Value) -> Self {
        Self::new(params)
    }
}

impl fmt::Debug for CommandOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandOptions")
            .field("params", &self.params)
            .field(
                "on_before_event_send",
                &self.on_before_event_send.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

/// Result of the serialized phase of a command.
pub enum CommandOutput {
    /// The command finished.
    Done(Value),
    /// The command continues outside the queue.
    Deferred(BoxFuture<'static, AppResult<Value>>),
}

impl CommandOutput {
    /// Drives the output to its final value.
    pub async fn resolve(self) -> AppResult<Value> {
        match self {
            Self::Done(value) => Ok(value),
            Self::Deferred(future) => future.await,
        }
    }
}

impl fmt::Debug for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done(value) => f.debug_tuple("Done").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Trait for command implementations contributed by components.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Runs the serialized phase of the command.
    async fn run(&self, options: CommandOptions) -> AppResult<CommandOutput>;
}

/// A closure-based command handler that completes on the queue.
pub struct ClosureCommand<F> {
    handler: F,
}

#[async_trait]
impl<F, Fut> CommandHandler for ClosureCommand<F>
where
    F: Fn(CommandOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<Value>> + Send + 'static,
{
    async fn run(&self, options: CommandOptions) -> AppResult<CommandOutput> {
        (self.handler)(options).await.map(CommandOutput::Done)
    }
}

/// Wraps an async closure into a shareable command handler.
pub fn command_fn<F, Fut>(handler: F) -> Arc<dyn CommandHandler>
where
    F: Fn(CommandOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<Value>> + Send + 'static,
{
    Arc::new(ClosureCommand { handler })
}
