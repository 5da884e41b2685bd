//! Traits implemented by the collaborators the core talks to.

pub mod logger;
pub mod transport;

pub use logger::Logger;
pub use transport::{RequestOptions, Transport};
