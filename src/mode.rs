//! # Node roles and mode-change notifications.
//!
//! [`NodeMode`] is the shared vocabulary of both controllers: a node is either
//! actively serving as a master, idle and available as a worker, or parked in
//! a neutral standby between the two.
//!
//! [`ModeChange`] is the payload delivered to listeners whenever a controller
//! commits (or fails) a role transition. [`ModeCell`] is the lock-free cell
//! each controller uses to hold its current role, so reads never block.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Operating role of a compute node.
///
/// Exactly one role is current per controller instance at any time.
/// Controllers start in [`NodeMode::ActiveMaster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeMode {
    /// Node is serving as a master (user present or master work in flight).
    ActiveMaster,
    /// Neutral holding state; no side effects are attached to entering it.
    Standby,
    /// Node is idle and available as a worker.
    IdleWorker,
}

impl NodeMode {
    /// Stable snake_case label for logs and notifications.
    pub fn as_label(&self) -> &'static str {
        match self {
            NodeMode::ActiveMaster => "active_master",
            NodeMode::Standby => "standby",
            NodeMode::IdleWorker => "idle_worker",
        }
    }

    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            NodeMode::ActiveMaster => 0,
            NodeMode::Standby => 1,
            NodeMode::IdleWorker => 2,
        }
    }

    pub(crate) const fn from_u8(v: u8) -> NodeMode {
        match v {
            0 => NodeMode::ActiveMaster,
            1 => NodeMode::Standby,
            _ => NodeMode::IdleWorker,
        }
    }
}

impl fmt::Display for NodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Notification payload delivered to [`ModeListener`](crate::ModeListener)s.
///
/// A successful transition carries `from != to`. A failed automatic transition
/// is reported as a same-role change (`from == to`) whose `reason` carries the
/// failure text.
#[derive(Debug, Clone)]
pub struct ModeChange {
    /// Role before the transition.
    pub from: NodeMode,
    /// Role after the transition (equals `from` for failure reports).
    pub to: NodeMode,
    /// Human-readable cause, e.g. `"manually switched to idle_worker"`.
    pub reason: String,
    /// Wall-clock timestamp of the notification.
    pub at: SystemTime,
}

impl ModeChange {
    /// Builds a change stamped with the current wall-clock time.
    pub fn new(from: NodeMode, to: NodeMode, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
            at: SystemTime::now(),
        }
    }

    /// True if this notification reports a failed transition rather than a commit.
    pub fn is_failure(&self) -> bool {
        self.from == self.to
    }
}

/// Lock-free holder of a controller's current role.
///
/// Reads never block and never fail; writes are only issued by the owning
/// controller after a transition's side effects have completed.
#[derive(Debug)]
pub(crate) struct ModeCell {
    cell: AtomicU8,
}

impl ModeCell {
    pub(crate) fn new(mode: NodeMode) -> Self {
        Self {
            cell: AtomicU8::new(mode.as_u8()),
        }
    }

    pub(crate) fn load(&self) -> NodeMode {
        NodeMode::from_u8(self.cell.load(AtomicOrdering::Acquire))
    }

    pub(crate) fn store(&self, mode: NodeMode) {
        self.cell.store(mode.as_u8(), AtomicOrdering::Release);
    }
}
