//! The network envelope.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value, json};

use super::event::Event;
use super::merge::deep_merge;

#[derive(Debug)]
struct PayloadState {
    events: Vec<Arc<Event>>,
    meta: Value,
    expects_response: bool,
    use_id_third_party_domain: bool,
}

/// Envelope aggregating one or more events plus request metadata.
///
/// A payload is created fresh for every send and shared between the
/// pipeline, lifecycle hook handlers and the transport.
#[derive(Debug)]
pub struct Payload {
    state: Mutex<PayloadState>,
}

impl Payload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PayloadState {
                events: Vec::new(),
                meta: Value::Object(Map::new()),
                expects_response: false,
                use_id_third_party_domain: false,
            }),
        }
    }

    /// Adds an event. Its content is serialized when the payload is.
    ///
    /// An event that expects a response makes the whole payload expect one.
    pub fn add_event(&self, event: &Arc<Event>) {
        let mut state = self.state();
        state.events.push(Arc::clone(event));
        if event.expects_response() {
            state.expects_response = true;
        }
    }

    /// Deep-merges request metadata.
    pub fn merge_meta(&self, meta: &Value) {
        deep_merge(&mut self.state().meta, meta);
    }

    /// Requests a response from the edge.
    pub fn expect_response(&self) {
        self.state().expects_response = true;
    }

    /// Whether the request must wait for a response.
    pub fn expects_response(&self) -> bool {
        self.state().expects_response
    }

    /// Routes the request through the third-party identity domain.
    pub fn use_id_third_party_domain(&self) {
        self.state().use_id_third_party_domain = true;
    }

    /// Whether the request is routed through the third-party identity domain.
    pub fn should_use_id_third_party_domain(&self) -> bool {
        self.state().use_id_third_party_domain
    }

    /// Number of events added so far.
    pub fn event_count(&self) -> usize {
        self.state().events.len()
    }

    /// Structural snapshot of the payload. Every call returns a new value.
    pub fn to_json(&self) -> Value {
        let (events, meta) = {
            let state = self.state();
            (state.events.clone(), state.meta.clone())
        };
        let events: Vec<Value> = events.iter().map(|event| event.to_json()).collect();
        json!({ "events": events, "meta": meta })
    }

    fn state(&self) -> MutexGuard<'_, PayloadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::new()
    }
}
