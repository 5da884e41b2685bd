//! Data collection component: the `sendEvent` command.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use beacon_core::AppResult;
use beacon_runtime::{
    CommandHandler, CommandOptions, CommandOutput, Component, ComponentContext, ComponentCreator,
    EventManager, SendOptions,
};

use crate::error::ComponentError;

/// Component name.
pub const NAME: &str = "DataCollector";

/// Command name.
pub const SEND_EVENT: &str = "sendEvent";

/// Options accepted by `sendEvent`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendEventOptions {
    /// XDM content merged into the event.
    #[serde(default)]
    pub xdm: Value,
    /// Free-form data merged into the event.
    #[serde(default)]
    pub data: Value,
    /// Shorthand for `xdm.eventType`.
    #[serde(default, rename = "type")]
    #[validate(length(min = 1))]
    pub event_type: Option<String>,
    /// Shorthand for `xdm.eventMergeId`.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub merge_id: Option<String>,
    /// The page is unloading.
    #[serde(default)]
    pub document_unloading: bool,
    /// The event starts a new view.
    #[serde(default)]
    pub view_start: bool,
}

/// Builds the data collection component.
#[derive(Debug, Default)]
pub struct DataCollector;

impl ComponentCreator for DataCollector {
    fn name(&self) -> &str {
        NAME
    }

    fn create(&self, ctx: &ComponentContext) -> AppResult<Component> {
        let command = SendEventCommand {
            event_manager: Arc::clone(&ctx.event_manager),
        };
        Ok(Component::new(NAME).with_command(SEND_EVENT, Arc::new(command)))
    }
}

/// Creates an event from the options and defers to the event pipeline.
pub struct SendEventCommand {
    event_manager: Arc<EventManager>,
}

#[async_trait]
impl CommandHandler for SendEventCommand {
    async fn run(&self, options: CommandOptions) -> AppResult<CommandOutput> {
        let options: SendEventOptions = options.parse(SEND_EVENT)?;
        options
            .validate()
            .map_err(|source| ComponentError::InvalidOptions {
                command: SEND_EVENT,
                source,
            })?;

        let event = self.event_manager.create_event();
        event.merge_xdm(&options.xdm);
        event.merge_data(&options.data);
        if let Some(event_type) = &options.event_type {
            event.merge_xdm(&json!({ "eventType": event_type }));
        }
        if let Some(merge_id) = &options.merge_id {
            event.merge_xdm(&json!({ "eventMergeId": merge_id }));
        }
        if options.document_unloading {
            event.document_will_unload();
        }

        tracing::debug!(event_id = %event.id(), view_start = options.view_start, "Event created");

        let manager = Arc::clone(&self.event_manager);
        let send = SendOptions {
            is_view_start: options.view_start,
        };
        Ok(CommandOutput::Deferred(Box::pin(async move {
            manager.send_event(event, send).await?.to_value()
        })))
    }
}
