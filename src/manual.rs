//! # Manual controller: operator-driven switches, locks, confirmations.
//!
//! [`ManualModeController`] lets an operator force a role change, pin the role
//! against further change ([`lock_mode`](ManualModeController::lock_mode)),
//! and — when configured — stage switches behind an explicit confirm step.
//!
//! ## Request flow
//! ```text
//! request_mode_switch(target)
//!     │
//!     ├─ locked to another mode? ──► Err(Locked)        (nothing queued)
//!     │
//!     ├─ require_confirmation? ──► stage PendingConfirmation, return Ok(Some(id))
//!     │        │
//!     │        ├─ confirm_mode_switch(id) ──► execute switch
//!     │        └─ cancel_mode_switch(id)  ──► drop silently
//!     │
//!     └─ otherwise ──► execute switch now, return Ok(None)
//!
//! execute: re-check processing ─► transition side effects ─► commit ─► notify
//! ```
//!
//! Unlike the automatic engine there is **no timeout** on manual switches:
//! operator-issued changes are expected to be observed directly, so a stuck
//! side effect blocks the calling request. Failures propagate to the caller
//! and are never retried.
//!
//! Lock expiry is **pull-based**: [`is_lock_expired`](ManualModeController::is_lock_expired)
//! only answers, and nothing here calls
//! [`enforce_max_lock_duration`](ManualModeController::enforce_max_lock_duration)
//! automatically. A caller wanting hard expiry polls it.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::{
    config::ManualConfig,
    effects::TransitionEffects,
    error::SwitchError,
    listeners::{ListenerSet, ModeListener},
    mode::{ModeCell, ModeChange, NodeMode},
    probes::ProcessingProbe,
    transition,
};

/// Global counter for generated confirmation request ids.
static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_request_id() -> String {
    let seq = REQUEST_SEQ.fetch_add(1, AtomicOrdering::Relaxed) + 1;
    format!("req-{seq}")
}

/// Whether the controller's role is currently pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Role is pinned; switches to any other mode are rejected.
    Locked,
    /// No pin; all switches are allowed.
    Unlocked,
}

/// Snapshot of an active lock.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The pinned mode.
    pub mode: NodeMode,
    /// When the lock was taken.
    pub since: Instant,
}

/// A staged, not-yet-applied switch awaiting confirmation.
///
/// At most one exists per controller; a new request silently replaces it and
/// the replaced id becomes permanently invalid.
#[derive(Debug, Clone)]
pub struct PendingConfirmation {
    /// Mode the switch will move to once confirmed.
    pub target: NodeMode,
    /// Id to pass to `confirm_mode_switch` / `cancel_mode_switch`.
    pub request_id: String,
    /// When the request was staged.
    pub at: Instant,
}

#[derive(Default)]
struct ManualState {
    lock: Option<LockInfo>,
    pending: Option<PendingConfirmation>,
}

/// Operator-facing mode controller.
///
/// Starts in [`NodeMode::ActiveMaster`]. Owns its own role, lock, pending
/// confirmation, and listener set; it is not synchronized with any
/// [`ModeEngine`](crate::ModeEngine) running against the same node.
pub struct ManualModeController {
    config: ManualConfig,
    processing: Arc<dyn ProcessingProbe>,
    effects: Arc<dyn TransitionEffects>,
    listeners: ListenerSet,
    mode: ModeCell,
    state: Mutex<ManualState>,
}

impl ManualModeController {
    pub fn new(
        config: ManualConfig,
        processing: Arc<dyn ProcessingProbe>,
        effects: Arc<dyn TransitionEffects>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            processing,
            effects,
            listeners: ListenerSet::new(),
            mode: ModeCell::new(NodeMode::ActiveMaster),
            state: Mutex::new(ManualState::default()),
        })
    }

    /// Last-committed role. Never blocks, never fails.
    pub fn current_mode(&self) -> NodeMode {
        self.mode.load()
    }

    /// Registers a mode-change listener (identity-deduplicated).
    pub fn on_mode_change(&self, listener: Arc<dyn ModeListener>) {
        self.listeners.add(listener);
    }

    /// Unregisters a listener by identity; unknown listeners are a no-op.
    pub fn off_mode_change(&self, listener: &Arc<dyn ModeListener>) {
        self.listeners.remove(listener);
    }

    /// Requests a switch to `target`.
    ///
    /// Returns `Ok(None)` when the switch executed immediately, or
    /// `Ok(Some(id))` when it was staged pending confirmation. A caller may
    /// supply its own `request_id`; otherwise one is generated.
    ///
    /// # Errors
    /// - [`SwitchError::Locked`] when locked to a different mode — the
    ///   request is rejected outright, nothing is queued.
    /// - Any transition error from the immediate execution path.
    pub async fn request_mode_switch(
        &self,
        target: NodeMode,
        request_id: Option<String>,
    ) -> Result<Option<String>, SwitchError> {
        {
            let mut state = self.state_slot();
            if let Some(lock) = &state.lock {
                if lock.mode != target {
                    return Err(SwitchError::Locked {
                        locked: lock.mode,
                        requested: target,
                    });
                }
            }
            if self.config.require_confirmation {
                let id = request_id.unwrap_or_else(next_request_id);
                // Replaces any previous request; its id is now dead.
                state.pending = Some(PendingConfirmation {
                    target,
                    request_id: id.clone(),
                    at: Instant::now(),
                });
                return Ok(Some(id));
            }
        }

        self.execute_mode_switch(target).await?;
        Ok(None)
    }

    /// Confirms a staged switch and executes it.
    ///
    /// # Errors
    /// - [`SwitchError::InvalidRequest`] unless a pending confirmation exists
    ///   with exactly this id (never issued, consumed, cancelled, or replaced
    ///   ids all fail).
    /// - Any transition error from the execution path.
    pub async fn confirm_mode_switch(&self, request_id: &str) -> Result<(), SwitchError> {
        let target = {
            let mut state = self.state_slot();
            match &state.pending {
                Some(p) if p.request_id == request_id => {
                    let target = p.target;
                    state.pending = None;
                    target
                }
                _ => {
                    return Err(SwitchError::InvalidRequest {
                        id: request_id.to_string(),
                    })
                }
            }
        };
        self.execute_mode_switch(target).await
    }

    /// Drops the staged switch iff `request_id` matches; otherwise a silent
    /// no-op.
    pub fn cancel_mode_switch(&self, request_id: &str) {
        let mut state = self.state_slot();
        if matches!(&state.pending, Some(p) if p.request_id == request_id) {
            state.pending = None;
        }
    }

    /// Pins the role to `mode`, defaulting to the current role.
    ///
    /// Works regardless of whether a switch is pending; does not interrupt a
    /// switch already in flight. Re-locking replaces the previous lock (and
    /// restarts its clock).
    pub fn lock_mode(&self, mode: Option<NodeMode>) {
        let mode = mode.unwrap_or_else(|| self.mode.load());
        self.state_slot().lock = Some(LockInfo {
            mode,
            since: Instant::now(),
        });
    }

    /// Clears the lock unconditionally; a no-op if already unlocked.
    pub fn unlock_mode(&self) {
        self.state_slot().lock = None;
    }

    /// Pure predicate: has the lock outlived `max_lock_duration`?
    ///
    /// Always `false` when unlocked or when `max_lock_duration == 0`
    /// (unlimited). Answering does not release anything — see
    /// [`enforce_max_lock_duration`](ManualModeController::enforce_max_lock_duration).
    pub fn is_lock_expired(&self) -> bool {
        if self.config.max_lock_duration.is_zero() {
            return false;
        }
        match &self.state_slot().lock {
            Some(lock) => lock.since.elapsed() > self.config.max_lock_duration,
            None => false,
        }
    }

    /// Releases the lock if [`is_lock_expired`](ManualModeController::is_lock_expired);
    /// otherwise a no-op. Pull-based: callers wanting hard expiry poll this.
    pub fn enforce_max_lock_duration(&self) {
        if self.is_lock_expired() {
            self.unlock_mode();
        }
    }

    /// Current lock state.
    pub fn lock_state(&self) -> LockState {
        if self.state_slot().lock.is_some() {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    /// Snapshot of the active lock, or `None` when unlocked.
    pub fn get_lock_info(&self) -> Option<LockInfo> {
        self.state_slot().lock.clone()
    }

    /// Snapshot of the staged switch, or `None` when nothing is pending.
    pub fn get_pending_confirmation(&self) -> Option<PendingConfirmation> {
        self.state_slot().pending.clone()
    }

    /// Runs the switch: re-validates, executes side effects, commits, notifies.
    ///
    /// Invoked by both the immediate and the confirmed path. Errors leave the
    /// role unchanged and propagate to the caller.
    async fn execute_mode_switch(&self, target: NodeMode) -> Result<(), SwitchError> {
        let current = self.mode.load();
        transition::run(current, target, &*self.processing, &*self.effects).await?;
        self.mode.store(target);
        let change = ModeChange::new(current, target, format!("manually switched to {target}"));
        self.listeners.notify(&change).await;
        Ok(())
    }

    fn state_slot(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CollectingListener, MockProcessing, RecordingEffects};
    use std::time::Duration;
    use tokio::time;

    struct Harness {
        processing: Arc<MockProcessing>,
        effects: Arc<RecordingEffects>,
        controller: Arc<ManualModeController>,
    }

    fn harness(config: ManualConfig) -> Harness {
        let processing = Arc::new(MockProcessing::default());
        let effects = Arc::new(RecordingEffects::default());
        let controller = ManualModeController::new(
            config,
            Arc::clone(&processing) as Arc<dyn ProcessingProbe>,
            Arc::clone(&effects) as Arc<dyn TransitionEffects>,
        );
        Harness {
            processing,
            effects,
            controller,
        }
    }

    #[tokio::test]
    async fn test_immediate_switch_returns_none_and_commits() {
        let h = harness(ManualConfig::default());
        let listener = Arc::new(CollectingListener::default());
        h.controller
            .on_mode_change(Arc::clone(&listener) as Arc<dyn ModeListener>);

        let res = h
            .controller
            .request_mode_switch(NodeMode::IdleWorker, None)
            .await
            .unwrap();

        assert!(res.is_none());
        assert_eq!(h.controller.current_mode(), NodeMode::IdleWorker);
        assert_eq!(
            h.effects.calls(),
            vec!["start_worker", "notify(mode-change, true)"]
        );
        let changes = listener.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].to, NodeMode::IdleWorker);
        assert!(changes[0].reason.contains("manually"));
    }

    #[tokio::test]
    async fn test_lock_state_matches_lock_info() {
        let h = harness(ManualConfig::default());
        assert_eq!(h.controller.lock_state(), LockState::Unlocked);
        assert!(h.controller.get_lock_info().is_none());

        h.controller.lock_mode(None);
        assert_eq!(h.controller.lock_state(), LockState::Locked);
        let info = h.controller.get_lock_info().unwrap();
        assert_eq!(info.mode, NodeMode::ActiveMaster);

        h.controller.unlock_mode();
        assert_eq!(h.controller.lock_state(), LockState::Unlocked);
        assert!(h.controller.get_lock_info().is_none());
        // Redundant unlock is a no-op.
        h.controller.unlock_mode();
        assert_eq!(h.controller.lock_state(), LockState::Unlocked);
    }

    #[tokio::test]
    async fn test_locked_mode_rejects_other_targets() {
        let h = harness(ManualConfig::default());
        h.controller.lock_mode(Some(NodeMode::ActiveMaster));

        let err = h
            .controller
            .request_mode_switch(NodeMode::IdleWorker, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SwitchError::Locked {
                locked: NodeMode::ActiveMaster,
                requested: NodeMode::IdleWorker,
            }
        ));
        assert_eq!(h.controller.current_mode(), NodeMode::ActiveMaster);
        assert!(h.effects.calls().is_empty());
    }

    #[tokio::test]
    async fn test_locked_mode_allows_its_own_target() {
        let h = harness(ManualConfig::default());
        h.controller.lock_mode(Some(NodeMode::Standby));

        let res = h
            .controller
            .request_mode_switch(NodeMode::Standby, None)
            .await
            .unwrap();

        assert!(res.is_none());
        assert_eq!(h.controller.current_mode(), NodeMode::Standby);
    }

    #[tokio::test]
    async fn test_confirmation_flow() {
        let h = harness(ManualConfig {
            require_confirmation: true,
            ..ManualConfig::default()
        });

        let id = h
            .controller
            .request_mode_switch(NodeMode::Standby, None)
            .await
            .unwrap()
            .expect("confirmation id");
        // Staged, not applied.
        assert_eq!(h.controller.current_mode(), NodeMode::ActiveMaster);
        let pending = h.controller.get_pending_confirmation().unwrap();
        assert_eq!(pending.target, NodeMode::Standby);
        assert_eq!(pending.request_id, id);

        h.controller.confirm_mode_switch(&id).await.unwrap();
        assert_eq!(h.controller.current_mode(), NodeMode::Standby);
        assert!(h.controller.get_pending_confirmation().is_none());

        // Consumed ids are dead.
        let err = h.controller.confirm_mode_switch(&id).await.unwrap_err();
        assert!(matches!(err, SwitchError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_caller_supplied_request_id() {
        let h = harness(ManualConfig {
            require_confirmation: true,
            ..ManualConfig::default()
        });

        let id = h
            .controller
            .request_mode_switch(NodeMode::Standby, Some("ticket-17".into()))
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("ticket-17"));
        h.controller.confirm_mode_switch("ticket-17").await.unwrap();
        assert_eq!(h.controller.current_mode(), NodeMode::Standby);
    }

    #[tokio::test]
    async fn test_unknown_id_fails() {
        let h = harness(ManualConfig {
            require_confirmation: true,
            ..ManualConfig::default()
        });
        let err = h
            .controller
            .confirm_mode_switch("never-issued")
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_new_request_invalidates_previous_id() {
        let h = harness(ManualConfig {
            require_confirmation: true,
            ..ManualConfig::default()
        });

        let first = h
            .controller
            .request_mode_switch(NodeMode::Standby, None)
            .await
            .unwrap()
            .unwrap();
        let second = h
            .controller
            .request_mode_switch(NodeMode::IdleWorker, None)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(first, second);

        let err = h.controller.confirm_mode_switch(&first).await.unwrap_err();
        assert!(matches!(err, SwitchError::InvalidRequest { .. }));
        // The replacement is still live.
        let pending = h.controller.get_pending_confirmation().unwrap();
        assert_eq!(pending.request_id, second);
    }

    #[tokio::test]
    async fn test_cancel_is_exact_match_or_noop() {
        let h = harness(ManualConfig {
            require_confirmation: true,
            ..ManualConfig::default()
        });

        let id = h
            .controller
            .request_mode_switch(NodeMode::Standby, None)
            .await
            .unwrap()
            .unwrap();

        // Mismatched cancel leaves the request staged.
        h.controller.cancel_mode_switch("someone-elses");
        assert!(h.controller.get_pending_confirmation().is_some());

        h.controller.cancel_mode_switch(&id);
        assert!(h.controller.get_pending_confirmation().is_none());

        let err = h.controller.confirm_mode_switch(&id).await.unwrap_err();
        assert!(matches!(err, SwitchError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_processing_conflict_rejects_worker_switch() {
        let h = harness(ManualConfig::default());
        h.processing.set_processing(true);
        h.processing.set_job(Some("job-3"));

        let err = h
            .controller
            .request_mode_switch(NodeMode::IdleWorker, None)
            .await
            .unwrap_err();

        assert!(matches!(err, SwitchError::StillProcessing { .. }));
        assert_eq!(h.controller.current_mode(), NodeMode::ActiveMaster);
    }

    #[tokio::test]
    async fn test_effect_failure_propagates_and_keeps_role() {
        let h = harness(ManualConfig::default());
        h.effects.fail_on("start_worker");

        let err = h
            .controller
            .request_mode_switch(NodeMode::IdleWorker, None)
            .await
            .unwrap_err();

        assert!(matches!(err, SwitchError::Effect { .. }));
        assert_eq!(h.controller.current_mode(), NodeMode::ActiveMaster);
    }

    #[tokio::test]
    async fn test_lock_expiry_is_pull_based() {
        let h = harness(ManualConfig {
            max_lock_duration: Duration::from_millis(100),
            ..ManualConfig::default()
        });
        h.controller.lock_mode(Some(NodeMode::ActiveMaster));

        time::sleep(Duration::from_millis(150)).await;
        assert!(h.controller.is_lock_expired());
        // Still locked until someone enforces it.
        assert_eq!(h.controller.lock_state(), LockState::Locked);

        h.controller.enforce_max_lock_duration();
        assert_eq!(h.controller.lock_state(), LockState::Unlocked);
        assert!(!h.controller.is_lock_expired());
    }

    #[tokio::test]
    async fn test_unlimited_lock_never_expires() {
        let h = harness(ManualConfig::default());
        h.controller.lock_mode(Some(NodeMode::ActiveMaster));

        time::sleep(Duration::from_millis(150)).await;
        assert!(!h.controller.is_lock_expired());
        h.controller.enforce_max_lock_duration();
        assert_eq!(h.controller.lock_state(), LockState::Locked);
    }

    #[tokio::test]
    async fn test_lock_survives_pending_request() {
        let h = harness(ManualConfig {
            require_confirmation: true,
            ..ManualConfig::default()
        });

        let id = h
            .controller
            .request_mode_switch(NodeMode::Standby, None)
            .await
            .unwrap()
            .unwrap();
        // Locking while a request is staged is allowed.
        h.controller.lock_mode(Some(NodeMode::ActiveMaster));
        assert_eq!(h.controller.lock_state(), LockState::Locked);
        assert!(h.controller.get_pending_confirmation().is_some());

        // The staged switch still executes when confirmed: the lock gates
        // request admission, not an already-accepted switch.
        h.controller.confirm_mode_switch(&id).await.unwrap();
        assert_eq!(h.controller.current_mode(), NodeMode::Standby);
    }
}
