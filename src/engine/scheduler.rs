// src/engine/scheduler.rs

//! Drives records through the job runner.
//!
//! One dispatcher loop owns every piece of shared run state: the free slot
//! pool, the counters, the reordering buffer and the progress reporter.
//! Workers only ever return a [`JobReport`], so no locks are needed.

use std::collections::VecDeque;

use tokio::io::AsyncBufRead;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::engine::ordered::{OrderedOutput, OutputSink};
use crate::engine::source::RecordSource;
use crate::engine::state::RunState;
use crate::engine::RunResult;
use crate::errors::{PipeError, Result};
use crate::exec::{Job, JobExecutor, JobReport, JobRunner};
use crate::input::{Record, RecordReader};
use crate::progress::ProgressReporter;
use crate::template::{JobMeta, Template};
use crate::types::JobStatus;

/// Runs one batch of records to completion (or abort).
pub struct Scheduler<E> {
    cfg: RunConfig,
    template: Template,
    runner: JobRunner<E>,
    sink: OutputSink,
    state: RunState,
}

impl<E> std::fmt::Debug for Scheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("jobs", &self.cfg.jobs)
            .finish_non_exhaustive()
    }
}

impl<E: JobExecutor> Scheduler<E> {
    pub fn new(cfg: RunConfig, template: Template, executor: E, sink: OutputSink) -> Self {
        let runner = JobRunner::from_config(executor, &cfg);
        Self {
            cfg,
            template,
            runner,
            sink,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Whether the whole input must be read before the first dispatch.
    ///
    /// Anything that needs the total record count buffers: the progress bar,
    /// `{##}`, and parallel runs.
    pub fn needs_buffering(&self) -> bool {
        self.cfg.progress || self.cfg.is_parallel() || self.template.uses_total()
    }

    /// Process every record from `reader`.
    pub async fn run<R: AsyncBufRead + Unpin>(
        &mut self,
        reader: RecordReader<R>,
    ) -> Result<RunResult> {
        self.transition(RunState::Reading)?;
        let buffer = self.needs_buffering();
        let mut source = RecordSource::load(reader, buffer).await?;
        debug!(buffered = buffer, total = ?source.total(), "input opened");

        self.transition(RunState::Dispatching)?;
        if self.cfg.dry_run {
            self.preview(&mut source).await
        } else {
            self.dispatch(&mut source).await
        }
    }

    fn transition(&mut self, next: RunState) -> Result<()> {
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = self.state.transition(next)?;
        Ok(())
    }

    fn build_job(&self, record: &Record, slot: usize, total: Option<u64>) -> Job {
        let value = record.value(self.cfg.trim);
        let meta = JobMeta {
            number: record.number,
            slot,
            total,
        };
        Job {
            number: record.number,
            slot,
            record: value.to_string(),
            argv: self.template.expand(meta, value),
            stdin: self
                .cfg
                .feed_stdin
                .then(|| record.stdin_payload(self.cfg.trim)),
        }
    }

    /// Dry run: print what would run, in record order, without executing.
    async fn preview<R: AsyncBufRead + Unpin>(
        &mut self,
        source: &mut RecordSource<R>,
    ) -> Result<RunResult> {
        let total = source.total();
        let mut result = RunResult::new(total);

        while let Some(record) = source.next().await? {
            let slot = ((record.number - 1) % self.cfg.jobs as u64) as usize + 1;
            let job = self.build_job(&record, slot, total);
            self.sink.line(&preview_line(&job, self.cfg.feed_stdin))?;
            result.dispatched += 1;
            result.record(job.number, JobStatus::Success, false);
        }

        self.transition(RunState::Draining)?;
        self.transition(RunState::Done)?;
        Ok(result)
    }

    async fn dispatch<R: AsyncBufRead + Unpin>(
        &mut self,
        source: &mut RecordSource<R>,
    ) -> Result<RunResult> {
        let total = source.total();
        let mut result = RunResult::new(total);
        let mut progress = ProgressReporter::for_run(self.cfg.progress, total);
        let mut ordered = OrderedOutput::new();
        let reorder = self.cfg.reorders_output();

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut workers: JoinSet<JobReport> = JoinSet::new();
        let mut slots = SlotPool::new(self.cfg.jobs);
        let mut input_done = false;

        loop {
            while !input_done {
                let Some(slot) = slots.acquire() else {
                    break;
                };
                let Some(record) = source.next().await? else {
                    slots.unacquire(slot);
                    input_done = true;
                    break;
                };

                if result.dispatched > 0 && !self.cfg.delay.is_zero() {
                    tokio::time::sleep(self.cfg.delay).await;
                }

                let job = self.build_job(&record, slot, total);
                debug!(job = job.number, slot, "dispatching job");
                let runner = self.runner.clone();
                let cancel = cancel_rx.clone();
                workers.spawn(async move { runner.run(job, cancel).await });
                result.dispatched += 1;
            }

            if input_done && self.state == RunState::Dispatching {
                self.transition(RunState::Draining)?;
            }

            let Some(joined) = workers.join_next().await else {
                break;
            };
            let report = joined
                .map_err(|e| PipeError::Other(anyhow::anyhow!("job worker failed: {e}")))?;

            slots.release(report.slot);
            let failed = report.status.is_failure();
            self.complete(report, &mut result, &mut ordered, reorder)?;
            progress.update(result.processed, result.failed);

            if failed && self.cfg.fail_fast {
                warn!("job failed with --fail-fast; aborting remaining jobs");
                self.transition(RunState::Aborted)?;
                let _ = cancel_tx.send(true);

                while let Some(joined) = workers.join_next().await {
                    if let Ok(report) = joined {
                        result.record(report.number, report.status, self.cfg.keep_order);
                    }
                }

                ordered.discard();
                progress.finish();
                result.aborted = true;
                debug!(
                    dispatched = result.dispatched,
                    failed = result.failed,
                    cancelled = result.cancelled,
                    "run aborted"
                );
                self.summarize(&result)?;
                return Ok(result);
            }
        }

        ordered.flush(&mut self.sink, self.cfg.tag)?;
        progress.finish();
        self.transition(RunState::Done)?;

        info!(
            total = result.dispatched,
            succeeded = result.succeeded,
            failed = result.failed,
            "run finished"
        );
        self.summarize(&result)?;
        Ok(result)
    }

    /// Final counts on stderr; `--quiet` silences them.
    fn summarize(&mut self, result: &RunResult) -> Result<()> {
        if self.cfg.quiet {
            return Ok(());
        }
        self.sink.diagnostic(&summary_line(result))?;
        Ok(())
    }

    fn complete(
        &mut self,
        report: JobReport,
        result: &mut RunResult,
        ordered: &mut OrderedOutput,
        reorder: bool,
    ) -> Result<()> {
        if report.status.is_failure() {
            warn!(
                job = report.number,
                record = %report.record,
                status = %report.status,
                attempts = report.attempts,
                "command failed"
            );
        } else {
            debug!(job = report.number, status = %report.status, "job completed");
        }

        result.record(report.number, report.status, self.cfg.keep_order);

        if let Some(output) = report.output {
            if reorder {
                ordered.insert(report.number, report.record, output);
            } else {
                let tag = self.cfg.tag.then_some(report.record.as_str());
                self.sink.job_output(&output, tag)?;
            }
        }
        Ok(())
    }
}

/// Job slot ids `1..=capacity`.
///
/// Fresh ids are minted on demand, so the pool costs nothing until a slot is
/// actually used. Released ids queue up FIFO and are reused before minting a
/// new one, which makes slots rotate round-robin once the pool is full.
#[derive(Debug)]
struct SlotPool {
    capacity: usize,
    minted: usize,
    free: VecDeque<usize>,
}

impl SlotPool {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            minted: 0,
            free: VecDeque::new(),
        }
    }

    fn acquire(&mut self) -> Option<usize> {
        if let Some(slot) = self.free.pop_front() {
            return Some(slot);
        }
        if self.minted < self.capacity {
            self.minted += 1;
            return Some(self.minted);
        }
        None
    }

    /// Return a slot that was taken but never used; it is handed out next.
    fn unacquire(&mut self, slot: usize) {
        self.free.push_front(slot);
    }

    fn release(&mut self, slot: usize) {
        self.free.push_back(slot);
    }
}

/// `pipe-while-read: 3 succeeded, 1 failed, 4 total` (plus the cancelled
/// count when the run was aborted).
pub fn summary_line(result: &RunResult) -> String {
    let mut line = format!(
        "pipe-while-read: {} succeeded, {} failed, {} total",
        result.succeeded, result.failed, result.dispatched
    );
    if result.aborted {
        line.push_str(&format!(", {} cancelled (aborted)", result.cancelled));
    }
    line
}

/// `[DRY RUN] <argv>` (plus the record when it would go to stdin).
pub fn preview_line(job: &Job, feed_stdin: bool) -> String {
    let command = job.argv.join(" ");
    if feed_stdin {
        format!("[DRY RUN] {command} <<< {}", job.record)
    } else {
        format!("[DRY RUN] {command}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_line_formats() {
        let job = Job {
            number: 1,
            slot: 1,
            record: "foo".into(),
            argv: vec!["echo".into(), "Got:".into(), "foo".into()],
            stdin: None,
        };
        assert_eq!(preview_line(&job, false), "[DRY RUN] echo Got: foo");

        let job = Job {
            argv: vec!["wc".into(), "-c".into()],
            stdin: Some(b"foo\n".to_vec()),
            ..job
        };
        assert_eq!(preview_line(&job, true), "[DRY RUN] wc -c <<< foo");
    }

    #[test]
    fn summary_line_counts() {
        let mut result = RunResult::new(Some(3));
        result.dispatched = 3;
        result.record(1, JobStatus::Success, false);
        result.record(2, JobStatus::Failed(1), false);
        result.record(3, JobStatus::Success, false);
        assert_eq!(
            summary_line(&result),
            "pipe-while-read: 2 succeeded, 1 failed, 3 total"
        );

        result.record(4, JobStatus::Cancelled, false);
        result.aborted = true;
        assert!(summary_line(&result).ends_with(", 1 cancelled (aborted)"));
    }

    #[test]
    fn slot_pool_mints_lazily_and_rotates() {
        let mut pool = SlotPool::new(3);
        assert_eq!(pool.acquire(), Some(1));
        assert_eq!(pool.acquire(), Some(2));
        assert_eq!(pool.acquire(), Some(3));
        assert_eq!(pool.acquire(), None);

        pool.release(2);
        pool.release(1);
        assert_eq!(pool.acquire(), Some(2));
        pool.unacquire(2);
        assert_eq!(pool.acquire(), Some(2));
        assert_eq!(pool.acquire(), Some(1));
        assert_eq!(pool.acquire(), None);
    }

    #[test]
    fn huge_slot_pool_allocates_nothing_up_front() {
        let mut pool = SlotPool::new(usize::MAX);
        assert!(pool.free.capacity() < 16);
        assert_eq!(pool.acquire(), Some(1));
    }
}
