// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the record source (streamed or buffered input)
//! - the bounded worker pool that runs jobs through a [`JobRunner`]
//! - ordered-output reconstruction for `--keep-order`
//! - fail-fast cancellation and the final [`RunResult`]
//!
//! The lifecycle lives in [`state`]; the dispatcher itself in [`scheduler`].
//!
//! [`JobRunner`]: crate::exec::JobRunner

use std::collections::BTreeMap;

use crate::types::{EXIT_FAILURE, EXIT_SUCCESS, JobStatus};

pub mod ordered;
pub mod scheduler;
pub mod source;
pub mod state;

pub use ordered::{OrderedOutput, OutputSink};
pub use scheduler::Scheduler;
pub use source::RecordSource;
pub use state::RunState;

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Number of records, when the input was buffered.
    pub total: Option<u64>,
    pub dispatched: u64,
    /// Jobs that ran to a final status (cancelled jobs excluded).
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub aborted: bool,
    /// Final status per job number; kept when `--keep-order` is set.
    pub statuses: BTreeMap<u64, JobStatus>,
}

impl RunResult {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Count one finished job.
    pub fn record(&mut self, number: u64, status: JobStatus, keep_status: bool) {
        match status {
            JobStatus::Success => {
                self.processed += 1;
                self.succeeded += 1;
            }
            JobStatus::Failed(_) | JobStatus::TimedOut => {
                self.processed += 1;
                self.failed += 1;
            }
            JobStatus::Cancelled => self.cancelled += 1,
        }
        if keep_status {
            self.statuses.insert(number, status);
        }
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }
}
