//! The `configure` command: validates settings and initializes components.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use beacon_core::config::{Configuration, DefaultConsent};
use beacon_core::traits::{Logger, Transport};
use beacon_core::{AppError, AppResult};

use super::dispatcher::ErrorPolicy;
use super::{CommandHandler, CommandOptions, CommandOutput};
use crate::component::{ComponentContext, ComponentCreator};
use crate::consent::ConsentGate;
use crate::event_manager::EventManager;
use crate::hooks::HookDispatcher;
use crate::registry::ComponentRegistry;

/// Everything `configure` wires together for one instance.
pub struct ConfigureCommand {
    namespace: String,
    creators: Vec<Arc<dyn ComponentCreator>>,
    registry: Arc<ComponentRegistry>,
    hooks: HookDispatcher,
    consent: Arc<ConsentGate>,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn Logger>,
    policy: Arc<ErrorPolicy>,
}

impl ConfigureCommand {
    /// Creates the command.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        namespace: impl Into<String>,
        creators: Vec<Arc<dyn ComponentCreator>>,
        registry: Arc<ComponentRegistry>,
        hooks: HookDispatcher,
        consent: Arc<ConsentGate>,
        transport: Arc<dyn Transport>,
        logger: Arc<dyn Logger>,
        policy: Arc<ErrorPolicy>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            creators,
            registry,
            hooks,
            consent,
            transport,
            logger,
            policy,
        }
    }

    async fn initialize_components(&self, ctx: &ComponentContext) -> AppResult<()> {
        for creator in &self.creators {
            let component = creator.create(ctx).map_err(|err| {
                let message = format!(
                    "[{}] An error occurred during component creation: {}",
                    creator.name(),
                    err.message
                );
                AppError::with_source(err.kind, message, err)
            })?;

            let hooks = component.hooks();
            let name = self.registry.register(component).await?.name;
            for (point, handler) in hooks {
                self.hooks.registry().subscribe(point, &name, handler).await?;
            }
        }

        self.registry.close().await;
        self.hooks.registry().freeze().await;
        self.hooks.on_components_registered().await
    }
}

#[async_trait]
impl CommandHandler for ConfigureCommand {
    async fn run(&self, options: CommandOptions) -> AppResult<CommandOutput> {
        let config = Arc::new(Configuration::from_options(
            &options.params,
            options.on_before_event_send,
        )?);

        if config.debug() {
            self.logger.set_enabled(true);
        }
        self.policy.set_errors_enabled(config.edge.errors_enabled);
        if config.edge.default_consent == DefaultConsent::In {
            self.consent.opt_in();
        }

        let event_manager = Arc::new(EventManager::new(
            Arc::clone(&config),
            self.hooks.clone(),
            Arc::clone(&self.consent),
            Arc::clone(&self.transport),
            Arc::clone(&self.logger),
        ));
        let ctx = ComponentContext {
            namespace: self.namespace.clone(),
            config,
            logger: Arc::clone(&self.logger),
            event_manager,
            consent: Arc::clone(&self.consent),
        };

        self.initialize_components(&ctx).await?;

        let components = self.registry.len().await;
        info!(namespace = %self.namespace, components, "Instance configured");
        self.logger.info("Instance configured.");
        Ok(CommandOutput::Done(Value::Null))
    }
}
