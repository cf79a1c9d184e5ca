//! # Probe contracts: the engine's read-only view of the outside world.
//!
//! Both probes are purely observational. They are supplied at construction,
//! owned by the caller, and never mutated by the controllers; each read is
//! treated as an independent snapshot, so no locking discipline is imposed on
//! implementors beyond `Send + Sync`.
//!
//! - [`ActivityProbe`] reports how long ago the operator last touched the
//!   node (keyboard/mouse or whatever the integration counts as input).
//! - [`ProcessingProbe`] reports whether master work is in flight and how many
//!   worker tasks are queued. It is read by both controllers and updated
//!   exclusively by the external subsystem that tracks job execution.

use std::time::Duration;

/// Read-only source of user-input recency.
///
/// Consumed by the automatic [`ModeEngine`](crate::ModeEngine) only.
/// `start_monitoring` / `stop_monitoring` are lifecycle hooks invoked from
/// the engine's own `start` / `stop`; implementations are expected to make
/// them idempotent.
pub trait ActivityProbe: Send + Sync + 'static {
    /// Time elapsed since the last observed user input.
    fn time_since_last_input(&self) -> Duration;

    /// Begins input monitoring (idempotent).
    fn start_monitoring(&self);

    /// Ends input monitoring (idempotent).
    fn stop_monitoring(&self);
}

/// Read-only source of master-workload state.
///
/// Consumed by both controllers; mutated by neither.
pub trait ProcessingProbe: Send + Sync + 'static {
    /// True while master work is in flight. An in-flight job vetoes any
    /// demotion to idle worker.
    fn is_processing(&self) -> bool;

    /// Number of worker tasks queued on this node, transferred away before
    /// the node is promoted back to master.
    fn pending_task_count(&self) -> u32;

    /// Id of the currently executing job, if the probe tracks one.
    fn current_job_id(&self) -> Option<String>;
}
