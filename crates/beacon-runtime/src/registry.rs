//! Component registry: stores registered components keyed by unique name.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use beacon_core::{AppError, AppResult};

use crate::command::CommandHandler;
use crate::component::Component;

/// Identity of a registered component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentHandle {
    /// Registration position.
    pub index: usize,
    /// Component name.
    pub name: String,
}

#[derive(Debug, Default)]
struct RegistryState {
    components: Vec<Arc<Component>>,
    by_name: HashMap<String, usize>,
    commands: HashMap<String, usize>,
    closed: bool,
}

/// Registry of all components of one instance.
///
/// Append-only: components are never removed, and registration stops
/// once [`close`](Self::close) is called.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    state: RwLock<RegistryState>,
}

impl ComponentRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component.
    ///
    /// Fails without changing the registry if the name is taken, one of its
    /// commands is already provided, or registration is closed.
    pub async fn register(&self, component: Component) -> AppResult<ComponentHandle> {
        let mut state = self.state.write().await;
        let name = component.name().to_string();

        if state.closed {
            return Err(AppError::registration_closed(&name));
        }
        if state.by_name.contains_key(&name) {
            return Err(AppError::duplicate_component(&name));
        }

        let command_names = component.command_names();
        let conflicts: Vec<String> = command_names
            .iter()
            .filter(|command| state.commands.contains_key(*command))
            .cloned()
            .collect();
        if !conflicts.is_empty() {
            return Err(AppError::duplicate_command(&name, &conflicts));
        }

        let index = state.components.len();
        for command in command_names {
            state.commands.insert(command, index);
        }
        state.by_name.insert(name.clone(), index);
        state.components.push(Arc::new(component));

        info!(component = %name, index = index, "Component registered");

        Ok(ComponentHandle { index, name })
    }

    /// Gets a component by name.
    pub async fn get(&self, name: &str) -> Option<Arc<Component>> {
        let state = self.state.read().await;
        state
            .by_name
            .get(name)
            .map(|&index| Arc::clone(&state.components[index]))
    }

    /// Resolves a command name to its handler.
    pub async fn command(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        let state = self.state.read().await;
        let index = *state.commands.get(name)?;
        state.components[index].command(name)
    }

    /// Name of the component that provides a command.
    pub async fn command_owner(&self, name: &str) -> Option<String> {
        let state = self.state.read().await;
        let index = *state.commands.get(name)?;
        Some(state.components[index].name().to_string())
    }

    /// Ends the registration phase.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        if !state.closed {
            state.closed = true;
            info!(components = state.components.len(), "Component registration closed");
        }
    }

    /// Whether the registration phase has ended.
    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }

    /// Component names in registration order.
    pub async fn component_names(&self) -> Vec<String> {
        let state = self.state.read().await;
        state
            .components
            .iter()
            .map(|component| component.name().to_string())
            .collect()
    }

    /// Returns the component count.
    pub async fn len(&self) -> usize {
        self.state.read().await.components.len()
    }

    /// Whether no component is registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
