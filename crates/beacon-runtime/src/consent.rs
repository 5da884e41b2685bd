//! Consent gate: a broadcast-once state machine (`pending` -> `in` | `out`).

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use beacon_core::{AppError, AppResult};

/// Current consent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentState {
    /// No decision yet.
    Pending,
    /// The user opted in.
    In,
    /// The user opted out.
    Out,
}

impl ConsentState {
    /// Whether this is a terminal state.
    pub fn is_settled(self) -> bool {
        self != Self::Pending
    }
}

impl fmt::Display for ConsentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::In => "in",
            Self::Out => "out",
        };
        f.write_str(s)
    }
}

/// Gates event transmission on user consent.
///
/// The state transitions at most once. Every waiter registered before the
/// transition is released by it; waiters arriving later see the final state
/// immediately.
#[derive(Debug)]
pub struct ConsentGate {
    state: watch::Sender<ConsentState>,
}

impl ConsentGate {
    /// Creates a gate in the `pending` state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConsentState::Pending);
        Self { state }
    }

    /// The current state.
    pub fn state(&self) -> ConsentState {
        *self.state.borrow()
    }

    /// Whether consent has been decided.
    pub fn is_settled(&self) -> bool {
        self.state().is_settled()
    }

    /// Settles the gate. Returns `false` if it was already settled or
    /// `state` is `Pending`; the existing decision is kept.
    pub fn settle(&self, state: ConsentState) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if current.is_settled() || !state.is_settled() {
                return false;
            }
            *current = state;
            true
        });
        if changed {
            info!(consent = %state, "Consent settled");
        }
        changed
    }

    /// Records an opt-in.
    pub fn opt_in(&self) -> bool {
        self.settle(ConsentState::In)
    }

    /// Records an opt-out.
    pub fn opt_out(&self) -> bool {
        self.settle(ConsentState::Out)
    }

    /// Resolves once the gate settles, with the final state.
    pub async fn when_settled(&self) -> ConsentState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| state.is_settled()).await {
            Ok(state) => *state,
            // The sender lives in `self`, so it cannot be dropped while borrowed.
            Err(_) => self.state(),
        }
    }

    /// Resolves once the user opts in; fails with `ConsentDeclined` on opt-out.
    ///
    /// Stays pending for as long as the gate is pending.
    pub async fn when_opted_in(&self) -> AppResult<()> {
        match self.when_settled().await {
            ConsentState::In => Ok(()),
            _ => Err(AppError::consent_declined()),
        }
    }

    /// Subscribes to state changes, for collaborators that observe settlement.
    pub fn subscribe(&self) -> watch::Receiver<ConsentState> {
        self.state.subscribe()
    }
}

impl Default for ConsentGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use beacon_core::ErrorKind;

    #[tokio::test]
    async fn test_settles_exactly_once() {
        let gate = ConsentGate::new();
        assert_eq!(gate.state(), ConsentState::Pending);
        assert!(!gate.settle(ConsentState::Pending));

        assert!(gate.opt_out());
        assert!(!gate.opt_in());
        assert_eq!(gate.state(), ConsentState::Out);
    }

    #[tokio::test]
    async fn test_releases_all_waiters() {
        let gate = Arc::new(ConsentGate::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.when_opted_in().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(waiters.iter().all(|w| !w.is_finished()));

        gate.opt_in();
        for waiter in waiters {
            waiter.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn test_late_waiter_sees_final_state() {
        let gate = ConsentGate::new();
        gate.opt_out();

        let err = gate.when_opted_in().await.unwrap_err();
        assert!(err.is(ErrorKind::ConsentDeclined));
        assert_eq!(gate.when_settled().await, ConsentState::Out);
    }

    #[tokio::test]
    async fn test_pending_gate_stays_pending() {
        let gate = ConsentGate::new();
        let wait = tokio::time::timeout(Duration::from_millis(20), gate.when_opted_in()).await;
        assert!(wait.is_err());
    }

    #[tokio::test]
    async fn test_observers_see_settlement() {
        let gate = ConsentGate::new();
        let mut observer = gate.subscribe();
        assert_eq!(*observer.borrow(), ConsentState::Pending);

        gate.opt_in();
        observer.changed().await.unwrap();
        assert_eq!(*observer.borrow_and_update(), ConsentState::In);
    }
}
