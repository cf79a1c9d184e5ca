//! # Transition side-effect collaborators.
//!
//! Committing a role change means running real, failable operations: starting
//! or stopping the worker service, draining queued worker tasks, and telling
//! the coordination service whether this node is available as a worker.
//! Those operations live outside this crate; [`TransitionEffects`] is the
//! seam they are injected through.
//!
//! Any returned error aborts the transition before the role commit. The
//! automatic engine additionally races the whole sequence against a deadline;
//! the manual controller awaits it without a timeout.
//!
//! ## Example (skeleton)
//! ```rust,ignore
//! use anyhow::Result;
//! use async_trait::async_trait;
//! use modeswitch::TransitionEffects;
//!
//! struct NodeServices { /* rpc clients, process handles, ... */ }
//!
//! #[async_trait]
//! impl TransitionEffects for NodeServices {
//!     async fn start_worker_service(&self) -> Result<()> { /* spawn */ Ok(()) }
//!     async fn stop_worker_service(&self) -> Result<()> { /* drain + kill */ Ok(()) }
//!     async fn transfer_pending_tasks(&self, count: u32) -> Result<()> { Ok(()) }
//!     async fn notify_coordination(&self, event: &str, worker_available: bool) -> Result<()> {
//!         Ok(())
//!     }
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;

/// Coordination-service event name used by both controllers when announcing
/// a change in worker availability.
pub const COORDINATION_EVENT: &str = "mode-change";

/// Contract for the side-effecting operations a role transition runs.
///
/// Called from inside a transition; implementations should avoid blocking the
/// async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait TransitionEffects: Send + Sync + 'static {
    /// Brings the worker service up (entering `idle_worker`).
    async fn start_worker_service(&self) -> Result<()>;

    /// Tears the worker service down (leaving `idle_worker` for master duty).
    async fn stop_worker_service(&self) -> Result<()>;

    /// Hands `count` queued worker tasks off to another node before this one
    /// stops accepting worker work.
    async fn transfer_pending_tasks(&self, count: u32) -> Result<()>;

    /// Announces worker availability to the coordination service.
    async fn notify_coordination(&self, event: &str, worker_available: bool) -> Result<()>;
}
