//! # Mode-change listeners: ordered, awaited fan-out.
//!
//! [`ListenerSet`] delivers each [`ModeChange`] to every registered listener
//! **in registration order**, awaiting each one before the transition that
//! produced the notification is considered complete.
//!
//! ## What it guarantees
//! - Registration-order delivery, all listeners awaited.
//! - Identity deduplication: registering the same `Arc` twice keeps one entry.
//! - Panics inside listeners are caught and logged (isolation); the remaining
//!   listeners still run.
//!
//! ## What it does **not** guarantee
//! - No cross-controller ordering: the automatic engine and the manual
//!   controller each own an independent set.
//!
//! ## Diagram
//! ```text
//!    notify(&ModeChange)
//!        │
//!        ├─► listener 1 .on_mode_change()  (awaited)
//!        ├─► listener 2 .on_mode_change()  (awaited)
//!        └─► listener N .on_mode_change()  (awaited)
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::FutureExt;

use crate::mode::ModeChange;

/// Contract for mode-change listeners.
///
/// Called from inside the controller's transition path; slow listeners delay
/// the transition's completion, by contract.
#[async_trait]
pub trait ModeListener: Send + Sync + 'static {
    /// Handle a single mode change (or same-role failure report).
    async fn on_mode_change(&self, change: &ModeChange);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Ordered collection of listeners owned by one controller instance.
///
/// Lives for the lifetime of the controller; there is no bulk clear.
#[derive(Default)]
pub struct ListenerSet {
    listeners: RwLock<Vec<Arc<dyn ModeListener>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. Re-registering the same `Arc` is a no-op.
    pub fn add(&self, listener: Arc<dyn ModeListener>) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Removes a listener by identity. Unknown listeners are a silent no-op.
    pub fn remove(&self, listener: &Arc<dyn ModeListener>) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers one change to all listeners, in registration order, awaiting
    /// each. A panicking listener is logged and skipped; the rest still run.
    pub async fn notify(&self, change: &ModeChange) {
        let snapshot: Vec<Arc<dyn ModeListener>> = {
            self.listeners
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        };

        for listener in snapshot {
            let fut = listener.on_mode_change(change);
            if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                eprintln!(
                    "[modeswitch] listener '{}' panicked: {:?}",
                    listener.name(),
                    panic_err
                );
            }
        }
    }
}
