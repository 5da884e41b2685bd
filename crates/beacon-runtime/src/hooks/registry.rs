//! Hook registry: components subscribe handlers by hook point in registration order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use beacon_core::{AppError, AppResult};

use super::definitions::{HookArgs, HookPoint};

/// Trait for hook handler implementations.
///
/// Returning `Err` rejects the enclosing operation.
#[async_trait]
pub trait HookHandler: Send + Sync {
    /// Handles a hook invocation.
    async fn handle(&self, args: &HookArgs) -> AppResult<()>;
}

/// A closure-based hook handler.
pub struct ClosureHandler<F> {
    handler: F,
}

#[async_trait]
impl<F, Fut> HookHandler for ClosureHandler<F>
where
    F: Fn(HookArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    async fn handle(&self, args: &HookArgs) -> AppResult<()> {
        (self.handler)(args.clone()).await
    }
}

/// Wraps an async closure into a shareable hook handler.
pub fn hook_fn<F, Fut>(handler: F) -> Arc<dyn HookHandler>
where
    F: Fn(HookArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Arc::new(ClosureHandler { handler })
}

/// One subscribed handler and the component that owns it.
#[derive(Clone)]
pub struct HookSubscription {
    /// Owning component name.
    pub component: String,
    /// The handler.
    pub handler: Arc<dyn HookHandler>,
}

impl std::fmt::Debug for HookSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSubscription")
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

/// Registry of hook handlers organized by hook point.
///
/// Subscriptions are accepted until [`freeze`](Self::freeze) is called,
/// which happens when component registration closes.
#[derive(Debug, Default)]
pub struct HookRegistry {
    handlers: RwLock<HashMap<HookPoint, Vec<HookSubscription>>>,
    frozen: AtomicBool,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a handler for a hook point on behalf of a component.
    pub async fn subscribe(
        &self,
        point: HookPoint,
        component: &str,
        handler: Arc<dyn HookHandler>,
    ) -> AppResult<()> {
        let mut handlers = self.handlers.write().await;
        if self.is_frozen() {
            return Err(AppError::registration_closed(component));
        }

        handlers.entry(point).or_default().push(HookSubscription {
            component: component.to_string(),
            handler,
        });

        debug!(hook = %point, component = %component, "Hook handler subscribed");
        Ok(())
    }

    /// Stops accepting new subscriptions.
    pub async fn freeze(&self) {
        let _guard = self.handlers.write().await;
        self.frozen.store(true, Ordering::SeqCst);
    }

    /// Whether the subscription set is final.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    /// Returns the subscriptions for a hook point in registration order.
    pub async fn subscriptions(&self, point: HookPoint) -> Vec<HookSubscription> {
        let handlers = self.handlers.read().await;
        handlers.get(&point).cloned().unwrap_or_default()
    }

    /// Returns the number of handlers registered for a hook point.
    pub async fn handler_count(&self, point: HookPoint) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(&point).map(Vec::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Arc<dyn HookHandler> {
        hook_fn(|_| async { Ok(()) })
    }

    #[tokio::test]
    async fn test_subscriptions_keep_registration_order() {
        let registry = HookRegistry::new();
        for name in ["a", "b", "c"] {
            registry
                .subscribe(HookPoint::OnBeforeEvent, name, noop())
                .await
                .unwrap();
        }

        let order: Vec<String> = registry
            .subscriptions(HookPoint::OnBeforeEvent)
            .await
            .into_iter()
            .map(|s| s.component)
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(registry.handler_count(HookPoint::OnResponse).await, 0);
    }

    #[tokio::test]
    async fn test_frozen_registry_rejects_subscriptions() {
        let registry = HookRegistry::new();
        registry.freeze().await;

        let err = registry
            .subscribe(HookPoint::OnBeforeEvent, "late", noop())
            .await
            .unwrap_err();
        assert!(err.is(beacon_core::ErrorKind::RegistrationClosed));
        assert_eq!(registry.handler_count(HookPoint::OnBeforeEvent).await, 0);
    }
}
