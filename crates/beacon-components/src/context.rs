//! Implementation context component: stamps every event before it is sent.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use beacon_core::AppResult;
use beacon_runtime::{
    Component, ComponentContext, ComponentCreator, HookArgs, HookHandler, HookPoint,
};

/// Component name.
pub const NAME: &str = "Context";

/// Builds the context component.
#[derive(Debug, Default)]
pub struct Context;

impl ComponentCreator for Context {
    fn name(&self) -> &str {
        NAME
    }

    fn create(&self, _ctx: &ComponentContext) -> AppResult<Component> {
        Ok(Component::new(NAME).with_hook(HookPoint::OnBeforeEvent, Arc::new(ContextHook)))
    }
}

/// `onBeforeEvent` subscriber adding a timestamp and implementation details.
///
/// A timestamp the caller already set is kept.
#[derive(Debug)]
pub struct ContextHook;

#[async_trait]
impl HookHandler for ContextHook {
    async fn handle(&self, args: &HookArgs) -> AppResult<()> {
        let Some(event) = args.event() else {
            return Ok(());
        };

        event.apply_callback(|xdm, _data| {
            if !xdm.is_object() {
                *xdm = Value::Object(Map::new());
            }
            if let Value::Object(map) = xdm {
                map.entry("timestamp").or_insert_with(|| {
                    json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
                });
                map.insert("implementationDetails".to_string(), implementation_details());
            }
        });
        Ok(())
    }
}

fn implementation_details() -> Value {
    json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": "server",
    })
}
