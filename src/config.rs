//! # Controller configuration.
//!
//! [`ModeSwitchConfig`] drives the automatic engine: how long since the last
//! user input before the node is demoted, how often the engine re-evaluates,
//! and how long a transition may take before it is abandoned.
//!
//! [`ManualConfig`] drives the manual controller: whether operator requests
//! need an explicit confirm step, and how long a mode lock may be held before
//! [`enforce_max_lock_duration`](crate::ManualModeController::enforce_max_lock_duration)
//! releases it.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use modeswitch::{ManualConfig, ModeSwitchConfig};
//!
//! let mut cfg = ModeSwitchConfig::default();
//! cfg.active_threshold = Duration::from_secs(60);
//! cfg.poll_interval = Duration::from_secs(10);
//!
//! let manual = ManualConfig {
//!     require_confirmation: true,
//!     max_lock_duration: Duration::from_secs(3600),
//! };
//! assert!(manual.require_confirmation);
//! ```

use std::time::Duration;

/// Configuration for the automatic [`ModeEngine`](crate::ModeEngine).
///
/// Callers are expected to keep `standby_threshold >= active_threshold`;
/// the engine does not enforce this.
#[derive(Clone, Debug)]
pub struct ModeSwitchConfig {
    /// Input younger than this keeps the node an active master.
    pub active_threshold: Duration,
    /// Input younger than this (but older than `active_threshold`) parks the
    /// node in standby; older input demotes it to idle worker.
    pub standby_threshold: Duration,
    /// Point past which the node is considered fully idle. Carried for
    /// configuration parity; the determination algorithm is governed by
    /// `standby_threshold` alone.
    pub idle_threshold: Duration,
    /// Period between automatic re-evaluations.
    pub poll_interval: Duration,
    /// Deadline for a single transition's side effects. Zero selects the
    /// built-in per-direction deadlines (2s to promote back to master,
    /// 5s otherwise).
    pub switch_timeout: Duration,
}

impl Default for ModeSwitchConfig {
    /// Provides a default configuration:
    /// - `active_threshold = 2min`
    /// - `standby_threshold = 10min`
    /// - `idle_threshold = 10min`
    /// - `poll_interval = 30s`
    /// - `switch_timeout = 0` (per-direction deadlines)
    fn default() -> Self {
        Self {
            active_threshold: Duration::from_secs(120),
            standby_threshold: Duration::from_secs(600),
            idle_threshold: Duration::from_secs(600),
            poll_interval: Duration::from_secs(30),
            switch_timeout: Duration::ZERO,
        }
    }
}

/// Configuration for the [`ManualModeController`](crate::ManualModeController).
#[derive(Clone, Debug)]
pub struct ManualConfig {
    /// When true, `request_mode_switch` stages a pending confirmation and the
    /// switch only runs once `confirm_mode_switch` is called with its id.
    pub require_confirmation: bool,
    /// Maximum age of a mode lock before `enforce_max_lock_duration` releases
    /// it (0 = unlimited). Expiry is pull-based: nothing polls it internally.
    pub max_lock_duration: Duration,
}

impl Default for ManualConfig {
    /// Provides a default configuration:
    /// - `require_confirmation = false`
    /// - `max_lock_duration = 0` (locks never expire)
    fn default() -> Self {
        Self {
            require_confirmation: false,
            max_lock_duration: Duration::ZERO,
        }
    }
}
