//! Data types that flow through the send pipeline.

pub mod event;
pub mod merge;
pub mod payload;

pub use event::{BeforeSendCallback, Event, EventSnapshot, LastChanceCallback};
pub use merge::deep_merge;
pub use payload::Payload;
