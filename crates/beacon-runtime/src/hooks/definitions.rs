//! Lifecycle hook points and the arguments passed to their handlers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use beacon_core::AppError;
use beacon_core::types::{Event, Payload};

use crate::event_manager::SendOptions;

/// Fixed catalog of lifecycle extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookPoint {
    /// Fired once after the registration phase closes.
    #[serde(rename = "onComponentsRegistered")]
    OnComponentsRegistered,
    /// Fired once per send, before consent is checked.
    #[serde(rename = "onBeforeEvent")]
    OnBeforeEvent,
    /// Fired once per send, after consent resolves and the payload is built.
    #[serde(rename = "onBeforeDataCollection")]
    OnBeforeDataCollection,
    /// Fired by transports when a response arrives.
    #[serde(rename = "onResponse")]
    OnResponse,
    /// Fired by transports when a request fails.
    #[serde(rename = "onRequestFailure")]
    OnRequestFailure,
}

impl HookPoint {
    /// Every hook point, in catalog order.
    pub const ALL: [HookPoint; 5] = [
        Self::OnComponentsRegistered,
        Self::OnBeforeEvent,
        Self::OnBeforeDataCollection,
        Self::OnResponse,
        Self::OnRequestFailure,
    ];

    /// Returns the string name of this hook point.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnComponentsRegistered => "onComponentsRegistered",
            Self::OnBeforeEvent => "onBeforeEvent",
            Self::OnBeforeDataCollection => "onBeforeDataCollection",
            Self::OnResponse => "onResponse",
            Self::OnRequestFailure => "onRequestFailure",
        }
    }
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Arguments for one hook invocation. The variant decides the hook point.
#[derive(Debug, Clone)]
pub enum HookArgs {
    /// No event context.
    ComponentsRegistered,
    /// The event before consent is known, with caller options.
    BeforeEvent {
        /// The event being sent.
        event: Arc<Event>,
        /// Caller-supplied send options.
        options: SendOptions,
    },
    /// The event and its fully populated payload.
    BeforeDataCollection {
        /// The event being sent.
        event: Arc<Event>,
        /// The payload about to be transmitted.
        payload: Arc<Payload>,
    },
    /// A response returned by the transport.
    Response {
        /// The payload that was sent.
        payload: Arc<Payload>,
        /// The parsed response.
        response: Value,
    },
    /// A failed request.
    RequestFailure {
        /// The payload that was sent.
        payload: Arc<Payload>,
        /// Why the request failed.
        error: AppError,
    },
}

impl HookArgs {
    /// The hook point these arguments are for.
    pub fn point(&self) -> HookPoint {
        match self {
            Self::ComponentsRegistered => HookPoint::OnComponentsRegistered,
            Self::BeforeEvent { .. } => HookPoint::OnBeforeEvent,
            Self::BeforeDataCollection { .. } => HookPoint::OnBeforeDataCollection,
            Self::Response { .. } => HookPoint::OnResponse,
            Self::RequestFailure { .. } => HookPoint::OnRequestFailure,
        }
    }

    /// The event, when the hook point carries one.
    pub fn event(&self) -> Option<&Arc<Event>> {
        match self {
            Self::BeforeEvent { event, .. } | Self::BeforeDataCollection { event, .. } => {
                Some(event)
            }
            _ => None,
        }
    }

    /// The payload, when the hook point carries one.
    pub fn payload(&self) -> Option<&Arc<Payload>> {
        match self {
            Self::BeforeDataCollection { payload, .. }
            | Self::Response { payload, .. }
            | Self::RequestFailure { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Caller send options, for `onBeforeEvent`.
    pub fn send_options(&self) -> Option<&SendOptions> {
        match self {
            Self::BeforeEvent { options, .. } => Some(options),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_to_points() {
        let event = Arc::new(Event::new());
        let payload = Arc::new(Payload::new());

        assert_eq!(
            HookArgs::ComponentsRegistered.point(),
            HookPoint::OnComponentsRegistered
        );

        let before_event = HookArgs::BeforeEvent {
            event: Arc::clone(&event),
            options: SendOptions { is_view_start: true },
        };
        assert_eq!(before_event.point(), HookPoint::OnBeforeEvent);
        assert!(before_event.send_options().unwrap().is_view_start);
        assert!(before_event.payload().is_none());

        let before_collection = HookArgs::BeforeDataCollection {
            event,
            payload: Arc::clone(&payload),
        };
        assert_eq!(before_collection.point(), HookPoint::OnBeforeDataCollection);
        assert!(before_collection.event().is_some());
        assert!(before_collection.payload().is_some());
    }

    #[test]
    fn test_names_match_serde() {
        for point in HookPoint::ALL {
            let json = serde_json::to_value(point).unwrap();
            assert_eq!(json, point.as_str());
        }
    }
}
