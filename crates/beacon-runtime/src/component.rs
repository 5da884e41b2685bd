//! Components: named units contributing commands and lifecycle hook handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use beacon_core::AppResult;
use beacon_core::config::Configuration;
use beacon_core::traits::Logger;

use crate::command::CommandHandler;
use crate::consent::ConsentGate;
use crate::event_manager::EventManager;
use crate::hooks::{HookHandler, HookPoint};

/// A registrable feature unit.
///
/// Capabilities are plain maps: command name to handler, hook point to
/// handler. A component subscribes at most one handler per hook point.
#[derive(Clone)]
pub struct Component {
    name: String,
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    hooks: HashMap<HookPoint, Arc<dyn HookHandler>>,
}

impl Component {
    /// Creates a component with no capabilities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: HashMap::new(),
            hooks: HashMap::new(),
        }
    }

    /// Adds a command.
    pub fn with_command(mut self, name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        self.commands.insert(name.into(), handler);
        self
    }

    /// Subscribes a handler to a hook point, replacing any previous one.
    pub fn with_hook(mut self, point: HookPoint, handler: Arc<dyn HookHandler>) -> Self {
        self.hooks.insert(point, handler);
        self
    }

    /// The component's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the commands this component contributes, sorted.
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// Looks up one of this component's commands.
    pub fn command(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.commands.get(name).cloned()
    }

    /// Hook subscriptions in catalog order.
    pub fn hooks(&self) -> Vec<(HookPoint, Arc<dyn HookHandler>)> {
        HookPoint::ALL
            .into_iter()
            .filter_map(|point| self.hooks.get(&point).map(|h| (point, Arc::clone(h))))
            .collect()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: Vec<HookPoint> = self.hooks().into_iter().map(|(point, _)| point).collect();
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("commands", &self.command_names())
            .field("hooks", &hooks)
            .finish()
    }
}

/// Everything a component may use, built once per instance by `configure`.
#[derive(Clone)]
pub struct ComponentContext {
    /// Instance namespace.
    pub namespace: String,
    /// Validated configuration.
    pub config: Arc<Configuration>,
    /// Instance logger.
    pub logger: Arc<dyn Logger>,
    /// Event pipeline.
    pub event_manager: Arc<EventManager>,
    /// Consent gate.
    pub consent: Arc<ConsentGate>,
}

impl fmt::Debug for ComponentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentContext")
            .field("namespace", &self.namespace)
            .field("config", &self.config)
            .field("consent", &self.consent.state())
            .finish_non_exhaustive()
    }
}

/// Builds a component from the instance context during `configure`.
pub trait ComponentCreator: Send + Sync {
    /// Name of the component this creator builds.
    fn name(&self) -> &str;

    /// Creates the component.
    fn create(&self, ctx: &ComponentContext) -> AppResult<Component>;
}
