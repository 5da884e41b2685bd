//! Consent management component: the `setConsent` command.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use beacon_core::AppResult;
use beacon_core::traits::Logger;
use beacon_runtime::{
    CommandHandler, CommandOptions, CommandOutput, Component, ComponentContext, ComponentCreator,
    ConsentGate, ConsentState,
};

use crate::error::ComponentError;

/// Component name.
pub const NAME: &str = "Privacy";

/// Command name.
pub const SET_CONSENT: &str = "setConsent";

#[derive(Debug, Deserialize)]
struct SetConsentOptions {
    general: String,
}

/// Builds the consent management component.
#[derive(Debug, Default)]
pub struct Privacy;

impl ComponentCreator for Privacy {
    fn name(&self) -> &str {
        NAME
    }

    fn create(&self, ctx: &ComponentContext) -> AppResult<Component> {
        let command = SetConsentCommand {
            consent: Arc::clone(&ctx.consent),
            logger: Arc::clone(&ctx.logger),
        };
        Ok(Component::new(NAME).with_command(SET_CONSENT, Arc::new(command)))
    }
}

/// Settles the consent gate from `{ general: "in" | "out" }`.
pub struct SetConsentCommand {
    consent: Arc<ConsentGate>,
    logger: Arc<dyn Logger>,
}

#[async_trait]
impl CommandHandler for SetConsentCommand {
    async fn run(&self, options: CommandOptions) -> AppResult<CommandOutput> {
        let SetConsentOptions { general } = options.parse(SET_CONSENT)?;
        let requested = match general.as_str() {
            "in" => ConsentState::In,
            "out" => ConsentState::Out,
            _ => return Err(ComponentError::InvalidConsent { value: general }.into()),
        };

        if !self.consent.settle(requested) {
            self.logger.warn(&format!(
                "Consent is already {}; ignoring \"{}\".",
                self.consent.state(),
                requested
            ));
        }

        Ok(CommandOutput::Done(self.current()))
    }
}

impl SetConsentCommand {
    /// Current consent in the command's result shape.
    pub fn current(&self) -> Value {
        json!({ "general": self.consent.state() })
    }
}

#[cfg(test)]
mod tests {
    use beacon_core::ErrorKind;
    use beacon_runtime::testing::{RecordingLogger, RecordingTransport};

    use super::*;
    use crate::test_support::pending_context_with_logger;

    #[tokio::test]
    async fn test_set_consent_settles_once() {
        let logger = Arc::new(RecordingLogger::new());
        let ctx = pending_context_with_logger(Arc::new(RecordingTransport::new()), logger.clone());
        let command = Privacy.create(&ctx).unwrap().command(SET_CONSENT).unwrap();

        let output = command.run(json!({ "general": "out" }).into()).await.unwrap();
        assert!(matches!(output, CommandOutput::Done(ref v) if v == &json!({ "general": "out" })));
        assert_eq!(ctx.consent.state(), ConsentState::Out);

        command.run(json!({ "general": "in" }).into()).await.unwrap();
        assert_eq!(ctx.consent.state(), ConsentState::Out);
        assert_eq!(logger.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_value_rejected() {
        let ctx = pending_context_with_logger(
            Arc::new(RecordingTransport::new()),
            Arc::new(RecordingLogger::new()),
        );
        let command = Privacy.create(&ctx).unwrap().command(SET_CONSENT).unwrap();

        let err = command.run(json!({ "general": "pending" }).into()).await.unwrap_err();
        assert!(err.is(ErrorKind::Validation));
        assert_eq!(ctx.consent.state(), ConsentState::Pending);

        let err = command.run(CommandOptions::empty()).await.unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }
}
