//! Hook system: registry, dispatcher, and the fixed hook catalog.

pub mod definitions;
pub mod dispatcher;
pub mod registry;

pub use definitions::{HookArgs, HookPoint};
pub use dispatcher::HookDispatcher;
pub use registry::{HookHandler, HookRegistry, HookSubscription, hook_fn};
