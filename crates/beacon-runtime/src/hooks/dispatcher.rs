//! Hook dispatcher: fans a hook invocation out to every subscribed handler and joins them.
//!
//! - Handlers start concurrently, in registration order.
//! - The invocation settles only after every handler has settled.
//! - If any handler fails, the first failure observed (in completion order)
//!   is returned as a `HookRejection`; siblings still run to completion.
//! - A panicking handler counts as a failed one.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, warn};

use beacon_core::types::{Event, Payload};
use beacon_core::{AppError, AppResult, ErrorKind};
use serde_json::Value;

use super::definitions::{HookArgs, HookPoint};
use super::registry::HookRegistry;
use crate::event_manager::{SendOptions, panic_message};

/// Dispatches hook invocations to all registered handlers.
#[derive(Debug, Clone)]
pub struct HookDispatcher {
    registry: Arc<HookRegistry>,
}

impl HookDispatcher {
    /// Creates a new hook dispatcher.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// Invokes every handler subscribed to the hook point of `args`.
    pub async fn invoke(&self, args: HookArgs) -> AppResult<()> {
        let point = args.point();
        let subscriptions = self.registry.subscriptions(point).await;
        if subscriptions.is_empty() {
            return Ok(());
        }

        debug!(
            hook = %point,
            handler_count = subscriptions.len(),
            "Dispatching hook"
        );

        let mut pending: FuturesUnordered<_> = subscriptions
            .iter()
            .map(|subscription| {
                let args = &args;
                async move {
                    let component = subscription.component.as_str();
                    let result = AssertUnwindSafe(subscription.handler.handle(args))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            Err(AppError::hook_rejection(format!(
                                "[{component}] {point} handler panicked: {}",
                                panic_message(panic.as_ref())
                            )))
                        });
                    (component, result)
                }
            })
            .collect();

        let mut first_failure = None;
        while let Some((component, result)) = pending.next().await {
            if let Err(err) = result {
                warn!(
                    hook = %point,
                    component = %component,
                    error = %err,
                    "Hook handler rejected"
                );
                if first_failure.is_none() {
                    first_failure = Some(rejection(point, component, err));
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Fires `onComponentsRegistered`.
    pub async fn on_components_registered(&self) -> AppResult<()> {
        self.invoke(HookArgs::ComponentsRegistered).await
    }

    /// Fires `onBeforeEvent`.
    pub async fn on_before_event(&self, event: Arc<Event>, options: SendOptions) -> AppResult<()> {
        self.invoke(HookArgs::BeforeEvent { event, options }).await
    }

    /// Fires `onBeforeDataCollection`.
    pub async fn on_before_data_collection(
        &self,
        event: Arc<Event>,
        payload: Arc<Payload>,
    ) -> AppResult<()> {
        self.invoke(HookArgs::BeforeDataCollection { event, payload })
            .await
    }

    /// Fires `onResponse`. Called by transports, never by the pipeline.
    pub async fn on_response(&self, payload: Arc<Payload>, response: Value) -> AppResult<()> {
        self.invoke(HookArgs::Response { payload, response }).await
    }

    /// Fires `onRequestFailure`. Called by transports, never by the pipeline.
    pub async fn on_request_failure(&self, payload: Arc<Payload>, error: AppError) -> AppResult<()> {
        self.invoke(HookArgs::RequestFailure { payload, error }).await
    }

    /// Returns a reference to the hook registry.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }
}

fn rejection(point: HookPoint, component: &str, err: AppError) -> AppError {
    if err.is(ErrorKind::HookRejection) {
        return err;
    }
    AppError::with_source(
        ErrorKind::HookRejection,
        format!("[{component}] {point} handler failed: {}", err.message),
        err,
    )
}
