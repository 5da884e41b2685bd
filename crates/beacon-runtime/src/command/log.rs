//! The `log` core command.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use beacon_core::AppResult;
use beacon_core::traits::Logger;

use super::{CommandHandler, CommandOptions, CommandOutput, LOG};

#[derive(Debug, Deserialize)]
struct LogOptions {
    enabled: bool,
}

/// Turns instance logging on or off. Available before `configure`.
pub struct LogCommand {
    logger: Arc<dyn Logger>,
}

impl LogCommand {
    /// Creates the command for an instance logger.
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl CommandHandler for LogCommand {
    async fn run(&self, options: CommandOptions) -> AppResult<CommandOutput> {
        let LogOptions { enabled } = options.parse(LOG)?;
        self.logger.set_enabled(enabled);
        Ok(CommandOutput::Done(Value::Null))
    }
}
