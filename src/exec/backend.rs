// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The scheduler talks to a `JobExecutor` instead of spawning processes
//! itself. This keeps retry, ordering and fail-fast logic testable with a
//! fake executor that never touches the OS.

use std::future::Future;
use std::pin::Pin;

use super::{Attempt, CancelSignal, Job};

/// Run a single attempt of a job.
///
/// Implementations never return errors: anything that goes wrong is folded
/// into the attempt's [`JobStatus`](crate::types::JobStatus). When `cancel`
/// flips to `true` the attempt must stop promptly and report `Cancelled`.
pub trait JobExecutor: Send + Sync + 'static {
    fn execute<'a>(
        &'a self,
        job: &'a Job,
        cancel: CancelSignal,
    ) -> Pin<Box<dyn Future<Output = Attempt> + Send + 'a>>;
}
