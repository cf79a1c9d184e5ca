//! # Automatic mode engine: poll, decide, transition.
//!
//! [`ModeEngine`] owns the automatic side of role management. On a fixed
//! interval it reads the two probes, computes the role the node should be in
//! ([`determine_mode`]), and — when that differs from the current role — runs
//! the shared transition sequence raced against a deadline.
//!
//! ## High-level architecture
//! ```text
//!   start()                       stop()
//!     │                            │
//!     ├─ ActivityProbe             └─ cancel token, await loop,
//!     │    .start_monitoring()         ActivityProbe.stop_monitoring()
//!     └─ spawn poll_loop(token)
//!           │
//!           ▼ every poll_interval
//!   determine_mode(time_since_input, is_processing)
//!           │ differs from current?
//!           ▼
//!   timeout(deadline) ── transition::run(from, to) ── Ok ──► commit + notify
//!           │                                         Err ─► keep role,
//!           └── elapsed ────────────────────────────────────► same-role
//!                                                             failure notify
//! ```
//!
//! ## Decision priority (strict order)
//! 1. input younger than `active_threshold` → `active_master` (user presence wins)
//! 2. master work in flight → `active_master` (never interrupt a running job)
//! 3. input younger than `standby_threshold` → `standby`
//! 4. otherwise → `idle_worker`
//!
//! ## Tick serialization
//! Each tick's evaluation — including any transition it starts — is awaited
//! inline before the next poll sleep is armed, so two transitions are never
//! in flight at once and commits cannot reorder.
//!
//! ## Failure policy
//! A failed or timed-out transition leaves the role unchanged, notifies
//! listeners with a same-role [`ModeChange`] carrying the failure text, and
//! the loop keeps polling. A timed-out transition's side effects are dropped
//! at their next await point; they cannot complete later and commit.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::{select, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ModeSwitchConfig,
    effects::TransitionEffects,
    error::SwitchError,
    listeners::{ListenerSet, ModeListener},
    mode::{ModeCell, ModeChange, NodeMode},
    probes::{ActivityProbe, ProcessingProbe},
    transition,
};

/// Deadline for promoting `idle_worker -> active_master` (urgent, capped short).
const PROMOTE_TIMEOUT: Duration = Duration::from_millis(2000);
/// Deadline for every other transition (demotions can afford to drain safely).
const DEMOTE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Computes the role the node should occupy, from probe snapshots alone.
///
/// Pure function, no side effects; evaluated once per poll tick.
pub fn determine_mode(
    time_since_input: Duration,
    is_processing: bool,
    config: &ModeSwitchConfig,
) -> NodeMode {
    if time_since_input < config.active_threshold {
        NodeMode::ActiveMaster
    } else if is_processing {
        NodeMode::ActiveMaster
    } else if time_since_input < config.standby_threshold {
        NodeMode::Standby
    } else {
        NodeMode::IdleWorker
    }
}

struct RunningLoop {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Automatic role-determination engine.
///
/// Create with [`ModeEngine::new`], then [`start`](ModeEngine::start) it.
/// `start`/`stop` are idempotent; the engine starts in
/// [`NodeMode::ActiveMaster`].
pub struct ModeEngine {
    config: ModeSwitchConfig,
    activity: Arc<dyn ActivityProbe>,
    processing: Arc<dyn ProcessingProbe>,
    effects: Arc<dyn TransitionEffects>,
    listeners: ListenerSet,
    mode: ModeCell,
    running: Mutex<Option<RunningLoop>>,
}

impl ModeEngine {
    /// Creates a new engine (call [`start`](ModeEngine::start) to begin polling).
    ///
    /// The probes and effects are owned by the caller; the engine only reads
    /// the probes and invokes the effects during transitions.
    pub fn new(
        config: ModeSwitchConfig,
        activity: Arc<dyn ActivityProbe>,
        processing: Arc<dyn ProcessingProbe>,
        effects: Arc<dyn TransitionEffects>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            activity,
            processing,
            effects,
            listeners: ListenerSet::new(),
            mode: ModeCell::new(NodeMode::ActiveMaster),
            running: Mutex::new(None),
        })
    }

    /// Last-committed role. Never blocks, never fails.
    pub fn current_mode(&self) -> NodeMode {
        self.mode.load()
    }

    /// True while the poll loop is running.
    pub fn is_running(&self) -> bool {
        self.running_slot().is_some()
    }

    /// Registers a mode-change listener (identity-deduplicated).
    pub fn on_mode_change(&self, listener: Arc<dyn ModeListener>) {
        self.listeners.add(listener);
    }

    /// Unregisters a listener by identity; unknown listeners are a no-op.
    pub fn off_mode_change(&self, listener: &Arc<dyn ModeListener>) {
        self.listeners.remove(listener);
    }

    /// Begins input monitoring and the periodic re-evaluation loop.
    ///
    /// Calling `start` while already running is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut running = self.running_slot();
        if running.is_some() {
            return;
        }
        self.activity.start_monitoring();

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            engine.poll_loop(loop_token).await;
        });

        *running = Some(RunningLoop { token, handle });
    }

    /// Stops the loop and input monitoring; awaits the loop's completion.
    ///
    /// Calling `stop` while already stopped is a no-op.
    pub async fn stop(&self) {
        let stopped = self.running_slot().take();
        if let Some(run) = stopped {
            run.token.cancel();
            if let Err(e) = run.handle.await {
                if !e.is_cancelled() {
                    eprintln!("[modeswitch] poll loop join failed: {e:?}");
                }
            }
            self.activity.stop_monitoring();
        }
    }

    fn running_slot(&self) -> MutexGuard<'_, Option<RunningLoop>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn poll_loop(&self, token: CancellationToken) {
        loop {
            let sleep = time::sleep(self.config.poll_interval);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => break,
            }
            // Awaited inline: the next tick cannot fire while a transition
            // is still in flight.
            self.evaluate_tick().await;
        }
    }

    /// One poll tick: read probes, decide, and transition if needed.
    async fn evaluate_tick(&self) {
        let idle = self.activity.time_since_last_input();
        let determined = determine_mode(idle, self.processing.is_processing(), &self.config);
        let current = self.mode.load();
        if determined == current {
            return;
        }

        match self.execute_transition(current, determined).await {
            Ok(()) => {
                self.mode.store(determined);
                let change = ModeChange::new(
                    current,
                    determined,
                    format!("automatically switched {current} -> {determined} (input idle {idle:?})"),
                );
                self.listeners.notify(&change).await;
            }
            Err(err) => {
                // Reported, non-fatal: role stays, polling continues.
                let change = ModeChange::new(
                    current,
                    current,
                    format!("automatic switch {current} -> {determined} failed: {err}"),
                );
                self.listeners.notify(&change).await;
            }
        }
    }

    async fn execute_transition(&self, from: NodeMode, to: NodeMode) -> Result<(), SwitchError> {
        let deadline = self.deadline_for(from, to);
        match time::timeout(
            deadline,
            transition::run(from, to, &*self.processing, &*self.effects),
        )
        .await
        {
            Ok(res) => res,
            Err(_elapsed) => Err(SwitchError::Timeout { timeout: deadline }),
        }
    }

    /// Deadline for one transition: the configured `switch_timeout` when set,
    /// else the per-direction default.
    fn deadline_for(&self, from: NodeMode, to: NodeMode) -> Duration {
        if self.config.switch_timeout > Duration::ZERO {
            return self.config.switch_timeout;
        }
        if from == NodeMode::IdleWorker && to == NodeMode::ActiveMaster {
            PROMOTE_TIMEOUT
        } else {
            DEMOTE_TIMEOUT
        }
    }
}
