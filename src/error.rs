//! Error types used by the mode-switching controllers.
//!
//! [`SwitchError`] covers both controllers:
//!
//! - rejected manual requests (lock conflict, processing conflict, bad
//!   confirmation id) are returned to the caller and leave the role unchanged;
//! - transition failures (side-effect error, deadline exceeded) abort the
//!   switch before the role commit.
//!
//! The automatic engine converts every transition failure into a same-role
//! listener notification and keeps polling; the manual controller propagates
//! the error to whoever issued the request.

use std::time::Duration;
use thiserror::Error;

use crate::mode::NodeMode;

/// # Errors produced by mode-switch requests and transitions.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SwitchError {
    /// The mode is pinned and the requested target differs from the pinned mode.
    #[error("mode is locked to {locked}; cannot switch to {requested}")]
    Locked {
        /// Mode the controller is pinned to.
        locked: NodeMode,
        /// Mode the caller asked for.
        requested: NodeMode,
    },

    /// A switch to idle worker was attempted while master work is in flight.
    #[error("cannot switch to idle worker: node is still processing")]
    StillProcessing {
        /// Id of the in-flight job, when the probe knows it.
        job: Option<String>,
    },

    /// No pending confirmation matches the supplied request id.
    #[error("invalid or expired request id: {id}")]
    InvalidRequest {
        /// The id the caller supplied.
        id: String,
    },

    /// Transition side effects did not settle within the deadline.
    #[error("mode switch timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// A transition side-effect collaborator failed.
    #[error("transition side effect failed: {error}")]
    Effect {
        /// The underlying error message.
        error: String,
    },
}

impl SwitchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modeswitch::SwitchError;
    ///
    /// let err = SwitchError::InvalidRequest { id: "req-7".into() };
    /// assert_eq!(err.as_label(), "switch_invalid_request");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SwitchError::Locked { .. } => "switch_locked",
            SwitchError::StillProcessing { .. } => "switch_still_processing",
            SwitchError::InvalidRequest { .. } => "switch_invalid_request",
            SwitchError::Timeout { .. } => "switch_timeout",
            SwitchError::Effect { .. } => "switch_effect_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SwitchError::Locked { locked, requested } => {
                format!("locked to {locked}; requested {requested}")
            }
            SwitchError::StillProcessing { job } => match job {
                Some(id) => format!("still processing job {id}"),
                None => "still processing".to_string(),
            },
            SwitchError::InvalidRequest { id } => format!("invalid request id: {id}"),
            SwitchError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            SwitchError::Effect { error } => format!("side effect failed: {error}"),
        }
    }

    /// Wraps a collaborator failure from a
    /// [`TransitionEffects`](crate::TransitionEffects) call.
    pub(crate) fn effect(err: anyhow::Error) -> Self {
        SwitchError::Effect {
            error: err.to_string(),
        }
    }
}
