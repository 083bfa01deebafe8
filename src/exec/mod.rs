// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] defines the `JobExecutor` trait: run one attempt of one job.
//!   Production uses [`ProcessExecutor`]; tests plug in fakes.
//! - [`process`] spawns the real child with `tokio::process::Command`,
//!   enforcing timeouts and fail-fast cancellation.
//! - [`runner`] wraps an executor with the retry policy.

pub mod backend;
pub mod process;
pub mod runner;

use tokio::sync::watch;

use crate::types::JobStatus;

pub use backend::JobExecutor;
pub use process::ProcessExecutor;
pub use runner::JobRunner;

/// Receiving side of the run-wide cancellation flag (fail-fast).
pub type CancelSignal = watch::Receiver<bool>;

/// How a child's stdout/stderr are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Straight through to our own stdout/stderr.
    Inherit,
    /// Collected in memory for tagging or reordering.
    Capture,
    /// Sent to the null device (`--quiet`).
    Discard,
}

/// One expanded unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub number: u64,
    pub slot: usize,
    /// Record text as commands see it (trimmed if configured).
    pub record: String,
    /// Program followed by its arguments, already expanded.
    pub argv: Vec<String>,
    /// Bytes for the child's stdin in `--stdin` mode.
    pub stdin: Option<Vec<u8>>,
}

/// Output collected from a child in [`OutputMode::Capture`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub status: JobStatus,
    pub output: Option<CapturedOutput>,
}

impl Attempt {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            output: None,
        }
    }
}

/// Final result of a job after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub number: u64,
    pub slot: usize,
    pub record: String,
    pub status: JobStatus,
    pub attempts: u32,
    /// Output of the last attempt, if captured.
    pub output: Option<CapturedOutput>,
}

/// Resolve once the run has been cancelled.
///
/// Never resolves if the sender is gone without cancelling.
pub async fn cancelled(signal: &mut CancelSignal) {
    let sender_gone = signal.wait_for(|c| *c).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}
