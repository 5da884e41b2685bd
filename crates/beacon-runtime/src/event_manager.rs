//! Event manager: drives one event through the staged send pipeline.
//!
//! Stages, in strict order:
//! 1. fresh payload from the transport
//! 2. `onBeforeEvent`
//! 3. consent
//! 4. event and configuration metadata added to the payload
//! 5. last-chance callback with the event's final snapshot
//! 6. `onBeforeDataCollection`
//! 7. transport request
//! 8. result with copies of the request and response bodies
//!
//! A failing hook, declined consent or a transport failure aborts the run.
//! A failing `onBeforeEventSend` callback is logged and ignored.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use beacon_core::config::Configuration;
use beacon_core::traits::{Logger, RequestOptions, Transport};
use beacon_core::types::{BeforeSendCallback, Event, EventSnapshot, LastChanceCallback};
use beacon_core::{AppError, AppResult, ErrorKind};

use crate::consent::ConsentGate;
use crate::hooks::HookDispatcher;

/// Caller options for one send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    /// The event starts a new view.
    #[serde(default)]
    pub is_view_start: bool,
}

/// Outcome of a completed send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    /// Copy of the payload as sent.
    pub request_body: Value,
    /// Copy of the transport's response, if it returned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
}

impl SendResult {
    /// JSON form returned by the `sendEvent` command.
    pub fn to_value(&self) -> AppResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Runs the send pipeline for events of one instance.
pub struct EventManager {
    config: Arc<Configuration>,
    hooks: HookDispatcher,
    consent: Arc<ConsentGate>,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn Logger>,
}

impl EventManager {
    /// Creates an event manager.
    pub fn new(
        config: Arc<Configuration>,
        hooks: HookDispatcher,
        consent: Arc<ConsentGate>,
        transport: Arc<dyn Transport>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            config,
            hooks,
            consent,
            transport,
            logger,
        }
    }

    /// Creates an event carrying this instance's last-chance callback.
    pub fn create_event(&self) -> Arc<Event> {
        Arc::new(Event::with_last_chance_callback(self.last_chance_callback()))
    }

    /// Sends one event through the pipeline.
    pub async fn send_event(&self, event: Arc<Event>, options: SendOptions) -> AppResult<SendResult> {
        let payload = Arc::new(self.transport.create_payload());

        debug!(event_id = %event.id(), is_view_start = options.is_view_start, "onBeforeEvent");
        self.hooks.on_before_event(Arc::clone(&event), options).await?;

        debug!(event_id = %event.id(), consent = %self.consent.state(), "Waiting for consent");
        self.consent.when_opted_in().await?;

        if !event.has_last_chance_callback() {
            event.set_last_chance_callback(self.last_chance_callback());
        }
        payload.add_event(&event);
        payload.merge_meta(&self.metadata());
        event.finalize();

        debug!(event_id = %event.id(), "onBeforeDataCollection");
        self.hooks
            .on_before_data_collection(Arc::clone(&event), Arc::clone(&payload))
            .await?;

        let request = RequestOptions {
            expects_response: payload.expects_response(),
            document_unloading: event.is_document_unloading(),
            use_id_third_party_domain: payload.should_use_id_third_party_domain(),
        };
        debug!(event_id = %event.id(), ?request, "Sending request");
        let response = self
            .transport
            .send_request(&payload, request)
            .await
            .map_err(as_transport_error)?;

        Ok(SendResult {
            request_body: payload.to_json(),
            response_body: response,
        })
    }

    /// Configuration-derived metadata merged into every payload.
    pub fn metadata(&self) -> Value {
        let mut collect = Map::new();
        collect.insert("synchronousValidation".to_string(), Value::Bool(true));
        if let Some(dataset_id) = self.config.dataset_id() {
            collect.insert("datasetId".to_string(), json!(dataset_id));
        }
        if let Some(schema_id) = self.config.schema_id() {
            collect.insert("schemaId".to_string(), json!(schema_id));
        }
        json!({
            "gateway": { "imsOrgId": self.config.ims_org_id() },
            "collect": collect,
        })
    }

    fn last_chance_callback(&self) -> LastChanceCallback {
        let callback = self.config.on_before_event_send.clone();
        let logger = Arc::clone(&self.logger);
        Arc::new(move |snapshot: &EventSnapshot| {
            if let Some(callback) = &callback {
                if let Err(err) = run_guarded(callback, snapshot) {
                    logger.error(&err);
                }
            }
        })
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("config", &self.config)
            .field("consent", &self.consent.state())
            .finish_non_exhaustive()
    }
}

fn run_guarded(callback: &BeforeSendCallback, snapshot: &EventSnapshot) -> AppResult<()> {
    match catch_unwind(AssertUnwindSafe(|| callback(snapshot))) {
        Ok(result) => result,
        Err(panic) => Err(AppError::callback(format!(
            "onBeforeEventSend panicked: {}",
            panic_message(panic.as_ref())
        ))),
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn as_transport_error(err: AppError) -> AppError {
    if err.is(ErrorKind::Transport) {
        return err;
    }
    let message = format!("Request failed: {}", err.message);
    AppError::with_source(ErrorKind::Transport, message, err)
}
