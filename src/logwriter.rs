//! # Simple logging listener for debugging and demos.
//!
//! [`LogWriter`] prints mode changes to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [mode] active_master -> idle_worker (automatically switched active_master -> idle_worker (input idle 15m))
//! [mode-failed] active_master: automatic switch active_master -> idle_worker failed: ...
//! ```

use async_trait::async_trait;

use crate::listeners::ModeListener;
use crate::mode::ModeChange;

/// Simple stdout logging listener.
///
/// Enabled via the `logging` feature. Not intended for production use —
/// implement a custom [`ModeListener`] for structured logging or metrics.
#[derive(Default)]
pub struct LogWriter;

#[async_trait]
impl ModeListener for LogWriter {
    async fn on_mode_change(&self, change: &ModeChange) {
        if change.is_failure() {
            println!("[mode-failed] {}: {}", change.from, change.reason);
        } else {
            println!("[mode] {} -> {} ({})", change.from, change.to, change.reason);
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
