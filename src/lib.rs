//! # modeswitch
//!
//! **Modeswitch** tracks which of three operating roles a compute node
//! currently occupies — actively serving as a master (`active_master`), idle
//! and available as a worker (`idle_worker`), or parked in a neutral standby
//! (`standby`) — and governs how the node moves between them.
//!
//! ## Architecture
//! ```text
//!   ┌────────────────┐      ┌─────────────────┐
//!   │ ActivityProbe  │      │ ProcessingProbe │      (read-only snapshots,
//!   └───────┬────────┘      └────┬───────┬────┘       owned by the caller)
//!           │                    │       │
//!           ▼                    ▼       ▼
//! ┌───────────────────────────────┐   ┌──────────────────────────────────┐
//! │ ModeEngine (automatic)        │   │ ManualModeController (operator)  │
//! │ - poll loop (poll_interval)   │   │ - request / confirm / cancel     │
//! │ - determine_mode() priority   │   │ - lock (pin) + pull-based expiry │
//! │ - deadline-raced transitions  │   │ - untimed, propagating switches  │
//! │ - own role + ListenerSet      │   │ - own role + ListenerSet         │
//! └──────────────┬────────────────┘   └───────────────┬──────────────────┘
//!                │      shared transition contract    │
//!                └──────────────┬─────────────────────┘
//!                               ▼
//!                  ┌─────────────────────────┐
//!                  │ TransitionEffects       │   start/stop worker service,
//!                  │ (injected collaborator) │   transfer tasks, notify
//!                  └─────────────────────────┘   coordination service
//! ```
//!
//! The two controllers are deliberately independent instances: each owns its
//! own role, listener set, and (for the manual side) lock/pending state. An
//! integrating caller arbitrates between them when both run against the same
//! physical node.
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                        |
//! |-----------------|----------------------------------------------------------|-------------------------------------------|
//! | **Automatic**   | Poll probes, infer the role, drive deadline-bounded transitions. | [`ModeEngine`], [`determine_mode`] |
//! | **Manual**      | Operator switches with lock and confirm workflows.       | [`ManualModeController`]                  |
//! | **Listeners**   | Ordered, awaited mode-change notifications.              | [`ModeListener`], [`ListenerSet`]         |
//! | **Probes**      | Read-only activity and workload signals.                 | [`ActivityProbe`], [`ProcessingProbe`]    |
//! | **Effects**     | Injected side-effect collaborators per transition.       | [`TransitionEffects`]                     |
//! | **Errors**      | Typed rejection and transition failures.                 | [`SwitchError`]                           |
//! | **Configuration** | Thresholds, poll interval, deadlines, lock duration.   | [`ModeSwitchConfig`], [`ManualConfig`]    |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use modeswitch::{ManualConfig, ManualModeController, ModeEngine, ModeSwitchConfig, NodeMode};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let activity = Arc::new(MyInputMonitor::new());
//!     let processing = Arc::new(MyJobTracker::new());
//!     let effects = Arc::new(MyNodeServices::new());
//!
//!     let engine = ModeEngine::new(
//!         ModeSwitchConfig::default(),
//!         activity,
//!         Arc::clone(&processing) as _,
//!         Arc::clone(&effects) as _,
//!     );
//!     engine.start();
//!
//!     let manual = ManualModeController::new(ManualConfig::default(), processing, effects);
//!     manual.lock_mode(Some(NodeMode::ActiveMaster));
//!
//!     // ... later
//!     engine.stop().await;
//!     Ok(())
//! }
//! ```

mod config;
mod effects;
mod engine;
mod error;
mod listeners;
mod manual;
mod mode;
mod probes;
mod transition;

#[cfg(test)]
pub(crate) mod testutil;

// ---- Public re-exports ----

pub use config::{ManualConfig, ModeSwitchConfig};
pub use effects::{TransitionEffects, COORDINATION_EVENT};
pub use engine::{determine_mode, ModeEngine};
pub use error::SwitchError;
pub use listeners::{ListenerSet, ModeListener};
pub use manual::{LockInfo, LockState, ManualModeController, PendingConfirmation};
pub use mode::{ModeChange, NodeMode};
pub use probes::{ActivityProbe, ProcessingProbe};

// Optional: expose a simple built-in logger listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod logwriter;
#[cfg(feature = "logging")]
pub use logwriter::LogWriter;
