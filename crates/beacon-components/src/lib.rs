//! # Beacon components
//!
//! Built-in feature components registered through the component registry:
//!
//! - [`DataCollector`]: the `sendEvent` command
//! - [`Privacy`]: the `setConsent` command
//! - [`Context`]: an `onBeforeEvent` subscriber stamping timestamp and
//!   implementation details on every event

use std::sync::Arc;

use beacon_runtime::ComponentCreator;

pub mod context;
pub mod data_collector;
pub mod error;
pub mod privacy;

pub use context::Context;
pub use data_collector::{DataCollector, SendEventOptions};
pub use error::ComponentError;
pub use privacy::Privacy;

/// The built-in components, in registration order.
pub fn default_creators() -> Vec<Arc<dyn ComponentCreator>> {
    vec![
        Arc::new(Context),
        Arc::new(Privacy),
        Arc::new(DataCollector),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_creators_order() {
        let names: Vec<String> = default_creators()
            .iter()
            .map(|creator| creator.name().to_string())
            .collect();
        assert_eq!(names, vec!["Context", "Privacy", "DataCollector"]);
    }
}
