//! # Shared transition contract: side effects per role pair.
//!
//! Both controllers commit role changes through [`run`], so the side-effect
//! sequence for a given `(from, to)` pair is identical whether the switch was
//! decided automatically or issued by an operator:
//!
//! ```text
//!   * -> idle_worker      re-check processing ─► start worker ─► notify(available=true)
//!   idle_worker -> master transfer pending (if any) ─► stop worker ─► notify(available=false)
//!   * -> standby          (no side effects)
//!   standby -> master     (no side effects)
//! ```
//!
//! Any collaborator failure aborts the sequence before the caller commits the
//! role; the error carries the collaborator's message.

use crate::{
    effects::{TransitionEffects, COORDINATION_EVENT},
    error::SwitchError,
    mode::NodeMode,
    probes::ProcessingProbe,
};

/// Runs the side effects for a `from -> to` transition.
///
/// Does **not** commit the role; callers commit only after this returns `Ok`.
pub(crate) async fn run(
    from: NodeMode,
    to: NodeMode,
    processing: &dyn ProcessingProbe,
    effects: &dyn TransitionEffects,
) -> Result<(), SwitchError> {
    match to {
        NodeMode::IdleWorker => {
            // Re-check at execution time: the decision may be stale by now.
            if processing.is_processing() {
                return Err(SwitchError::StillProcessing {
                    job: processing.current_job_id(),
                });
            }
            effects
                .start_worker_service()
                .await
                .map_err(SwitchError::effect)?;
            effects
                .notify_coordination(COORDINATION_EVENT, true)
                .await
                .map_err(SwitchError::effect)?;
        }
        NodeMode::ActiveMaster if from == NodeMode::IdleWorker => {
            let pending = processing.pending_task_count();
            if pending > 0 {
                effects
                    .transfer_pending_tasks(pending)
                    .await
                    .map_err(SwitchError::effect)?;
            }
            effects
                .stop_worker_service()
                .await
                .map_err(SwitchError::effect)?;
            effects
                .notify_coordination(COORDINATION_EVENT, false)
                .await
                .map_err(SwitchError::effect)?;
        }
        // Standby is purely observational, and master reached from standby
        // never started a worker service to tear down.
        _ => {}
    }
    Ok(())
}
