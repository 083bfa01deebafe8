// src/exec/runner.rs

//! Retry policy around a [`JobExecutor`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::RunConfig;
use crate::types::JobStatus;

use super::{CancelSignal, Job, JobExecutor, JobReport, cancelled};

/// Runs a job up to `retries + 1` times, stopping at the first success.
///
/// The job's argument vector is expanded once by the scheduler; every attempt
/// reruns exactly the same command. Cancellation ends the job immediately,
/// including while waiting between attempts.
pub struct JobRunner<E> {
    executor: Arc<E>,
    retries: u32,
    retry_delay: Duration,
}

impl<E> Clone for JobRunner<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            retries: self.retries,
            retry_delay: self.retry_delay,
        }
    }
}

impl<E: JobExecutor> JobRunner<E> {
    pub fn new(executor: E, retries: u32, retry_delay: Duration) -> Self {
        Self {
            executor: Arc::new(executor),
            retries,
            retry_delay,
        }
    }

    pub fn from_config(executor: E, cfg: &RunConfig) -> Self {
        Self::new(executor, cfg.retries, cfg.retry_delay)
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    pub async fn run(&self, job: Job, mut cancel: CancelSignal) -> JobReport {
        let max_attempts = self.max_attempts();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let attempt = self.executor.execute(&job, cancel.clone()).await;

            let finished = !attempt.status.is_failure() || attempts >= max_attempts;
            if finished {
                if attempts > 1 {
                    debug!(job = job.number, attempts, status = %attempt.status, "job settled after retries");
                }
                return JobReport {
                    number: job.number,
                    slot: job.slot,
                    record: job.record,
                    status: attempt.status,
                    attempts,
                    output: attempt.output,
                };
            }

            info!(
                job = job.number,
                record = %job.record,
                attempt = attempts,
                max_attempts,
                status = %attempt.status,
                delay_secs = self.retry_delay.as_secs_f64(),
                "job failed; retrying"
            );

            tokio::select! {
                _ = tokio::time::sleep(self.retry_delay) => {}
                _ = cancelled(&mut cancel) => {
                    return JobReport {
                        number: job.number,
                        slot: job.slot,
                        record: job.record,
                        status: JobStatus::Cancelled,
                        attempts,
                        output: None,
                    };
                }
            }
        }
    }
}
