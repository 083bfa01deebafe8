// src/types.rs

//! Small shared value types.

use std::fmt;

/// Exit status of a fully successful run (also dry-run).
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status when any job failed or the run was aborted.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status for usage errors (bad flags, missing command, bad config).
pub const EXIT_USAGE: i32 = 2;
/// Exit code reported for a job that hit its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;
/// Exit code reported when a command could not be spawned at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Terminator separating records on the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordDelimiter {
    #[default]
    Newline,
    Nul,
}

impl RecordDelimiter {
    pub fn byte(self) -> u8 {
        match self {
            RecordDelimiter::Newline => b'\n',
            RecordDelimiter::Nul => b'\0',
        }
    }
}

/// Final status of one job attempt (or of a job after all retries).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Success,
    /// Non-zero exit, killed by a signal, or spawn failure.
    Failed(i32),
    /// The job exceeded its timeout and was terminated.
    TimedOut,
    /// The job was terminated because the run was aborted (fail-fast).
    Cancelled,
}

impl JobStatus {
    pub fn is_success(self) -> bool {
        matches!(self, JobStatus::Success)
    }

    /// Failures that count against the run and are eligible for retry.
    pub fn is_failure(self) -> bool {
        matches!(self, JobStatus::Failed(_) | JobStatus::TimedOut)
    }

    /// Numeric exit code as a shell would report it.
    pub fn exit_code(self) -> i32 {
        match self {
            JobStatus::Success => 0,
            JobStatus::Failed(code) => code,
            JobStatus::TimedOut => TIMEOUT_EXIT_CODE,
            JobStatus::Cancelled => -1,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failed(code) => write!(f, "exit code {code}"),
            JobStatus::TimedOut => write!(f, "timed out"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_a_failure_with_distinct_code() {
        assert!(JobStatus::TimedOut.is_failure());
        assert_eq!(JobStatus::TimedOut.exit_code(), TIMEOUT_EXIT_CODE);
        assert_ne!(JobStatus::TimedOut, JobStatus::Failed(TIMEOUT_EXIT_CODE));
    }

    #[test]
    fn cancelled_is_neither_success_nor_failure() {
        assert!(!JobStatus::Cancelled.is_success());
        assert!(!JobStatus::Cancelled.is_failure());
    }

    #[test]
    fn delimiter_bytes() {
        assert_eq!(RecordDelimiter::Newline.byte(), b'\n');
        assert_eq!(RecordDelimiter::Nul.byte(), 0);
    }
}
