//! The outgoing telemetry event.
//!
//! An [`Event`] is a mutable accumulator for one telemetry occurrence.
//! Components enrich it through `merge_xdm`/`merge_data`/`apply_callback`
//! while the send pipeline runs; it is shared behind an `Arc` and is never
//! reused across pipeline runs.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::merge::deep_merge;
use crate::result::AppResult;

/// User callback invoked with an event's final shape before transmission.
pub type BeforeSendCallback = Arc<dyn Fn(&EventSnapshot) -> AppResult<()> + Send + Sync>;

/// Hook stored on an event and invoked once with its finalized snapshot.
///
/// It returns nothing: failures must be handled inside the callback.
pub type LastChanceCallback = Arc<dyn Fn(&EventSnapshot) + Send + Sync>;

/// Immutable view of an event's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    /// Experience data model content.
    pub xdm: Value,
    /// Free-form data content.
    pub data: Value,
}

#[derive(Debug)]
struct EventContent {
    xdm: Value,
    data: Value,
}

/// One outgoing telemetry event.
pub struct Event {
    id: Uuid,
    content: Mutex<EventContent>,
    document_unloading: AtomicBool,
    expects_response: AtomicBool,
    last_chance_callback: Mutex<Option<LastChanceCallback>>,
}

impl Event {
    /// Creates an empty event.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            content: Mutex::new(EventContent {
                xdm: Value::Object(Map::new()),
                data: Value::Object(Map::new()),
            }),
            document_unloading: AtomicBool::new(false),
            expects_response: AtomicBool::new(false),
            last_chance_callback: Mutex::new(None),
        }
    }

    /// Creates an empty event carrying a last-chance callback.
    pub fn with_last_chance_callback(callback: LastChanceCallback) -> Self {
        let event = Self::new();
        event.set_last_chance_callback(callback);
        event
    }

    /// Unique identifier of this event, used for diagnostics.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Deep-merges `xdm` into the event's XDM content.
    pub fn merge_xdm(&self, xdm: &Value) {
        deep_merge(&mut self.content().xdm, xdm);
    }

    /// Deep-merges `data` into the event's free-form data.
    pub fn merge_data(&self, data: &Value) {
        deep_merge(&mut self.content().data, data);
    }

    /// Lets a collaborator mutate XDM and data in place.
    pub fn apply_callback<F>(&self, callback: F)
    where
        F: FnOnce(&mut Value, &mut Value),
    {
        let mut content = self.content();
        let EventContent { xdm, data } = &mut *content;
        callback(xdm, data);
    }

    /// Marks the event as sent while the document is unloading.
    pub fn document_will_unload(&self) {
        self.document_unloading.store(true, Ordering::SeqCst);
    }

    /// Whether the event is sent while the document is unloading.
    pub fn is_document_unloading(&self) -> bool {
        self.document_unloading.load(Ordering::SeqCst)
    }

    /// Requests a response from the edge for this event.
    pub fn expect_response(&self) {
        self.expects_response.store(true, Ordering::SeqCst);
    }

    /// Whether a response was requested for this event.
    pub fn expects_response(&self) -> bool {
        self.expects_response.load(Ordering::SeqCst)
    }

    /// Stores the last-chance callback, replacing any previous one.
    pub fn set_last_chance_callback(&self, callback: LastChanceCallback) {
        *lock(&self.last_chance_callback) = Some(callback);
    }

    /// Whether a last-chance callback is stored.
    pub fn has_last_chance_callback(&self) -> bool {
        lock(&self.last_chance_callback).is_some()
    }

    /// Returns a copy of the current content.
    pub fn snapshot(&self) -> EventSnapshot {
        let content = self.content();
        EventSnapshot {
            xdm: content.xdm.clone(),
            data: content.data.clone(),
        }
    }

    /// Takes the final snapshot and hands it to the last-chance callback.
    ///
    /// The callback runs without any event lock held, so it may read the
    /// event again.
    pub fn finalize(&self) -> EventSnapshot {
        let snapshot = self.snapshot();
        let callback = lock(&self.last_chance_callback).clone();
        if let Some(callback) = callback {
            callback(&snapshot);
        }
        snapshot
    }

    /// Whether neither XDM nor data carry any content.
    pub fn is_empty(&self) -> bool {
        let content = self.content();
        is_empty_value(&content.xdm) && is_empty_value(&content.data)
    }

    /// Outbound JSON shape of the event. Empty sections are omitted.
    pub fn to_json(&self) -> Value {
        let content = self.content();
        let mut json = Map::new();
        if !is_empty_value(&content.xdm) {
            json.insert("xdm".to_string(), content.xdm.clone());
        }
        if !is_empty_value(&content.data) {
            json.insert("data".to_string(), content.data.clone());
        }
        Value::Object(json)
    }

    fn content(&self) -> MutexGuard<'_, EventContent> {
        lock(&self.content)
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("content", &*self.content())
            .field("document_unloading", &self.is_document_unloading())
            .field("expects_response", &self.expects_response())
            .field("last_chance_callback", &self.has_last_chance_callback())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
