//! # beacon-runtime
//!
//! Command and event lifecycle engine for Beacon. Provides:
//!
//! - Component registry with unique names and unique command names
//! - Lifecycle hook bus with concurrent fan-out and join
//! - Consent gate settled once and broadcast to every waiter
//! - Serialized command dispatcher with configure-first policy
//! - Event manager driving the staged send pipeline
//! - Per-namespace [`Instance`] wiring all of the above

pub mod command;
pub mod component;
pub mod consent;
pub mod event_manager;
pub mod hooks;
pub mod instance;
pub mod logging;
pub mod registry;
pub mod testing;

pub use command::{
    CONFIGURE, CommandDispatcher, CommandHandler, CommandOptions, CommandOutput, LOG, command_fn,
};
pub use component::{Component, ComponentContext, ComponentCreator};
pub use consent::{ConsentGate, ConsentState};
pub use event_manager::{EventManager, SendOptions, SendResult};
pub use hooks::{HookArgs, HookDispatcher, HookHandler, HookPoint, HookRegistry, hook_fn};
pub use instance::{CommandCall, Instance};
pub use logging::TracingLogger;
pub use registry::{ComponentHandle, ComponentRegistry};
