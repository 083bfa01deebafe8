// src/engine/state.rs

//! Lifecycle of one run.
//!
//! ```text
//! Idle -> Reading -> Dispatching -> Draining -> Done
//!                         |             |
//!                         +--> Aborted <+
//! ```

use crate::errors::{PipeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// Opening the input; buffering it completely if the run needs a total.
    Reading,
    /// Pulling records and handing jobs to workers.
    Dispatching,
    /// Input exhausted; waiting for in-flight jobs.
    Draining,
    Done,
    /// Fail-fast tripped.
    Aborted,
}

impl RunState {
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Reading)
                | (Reading, Dispatching)
                | (Dispatching, Draining)
                | (Draining, Done)
                | (Dispatching, Aborted)
                | (Draining, Aborted)
        )
    }

    /// Move to `next`, rejecting transitions the lifecycle doesn't allow.
    pub fn transition(self, next: RunState) -> Result<RunState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PipeError::Other(anyhow::anyhow!(
                "invalid run state transition {self:?} -> {next:?}"
            )))
        }
    }
}
