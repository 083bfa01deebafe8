use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pipe_while_read::exec::{Attempt, CancelSignal, CapturedOutput, Job, JobExecutor, cancelled};
use pipe_while_read::types::JobStatus;

/// One recorded attempt.
#[derive(Debug, Clone)]
pub struct Call {
    pub number: u64,
    pub slot: usize,
    pub argv: Vec<String>,
    pub stdin: Option<Vec<u8>>,
    pub at: Instant,
}

/// Shared view of what a [`FakeExecutor`] saw; stays usable after the
/// executor has been moved into a scheduler.
#[derive(Debug, Clone, Default)]
pub struct FakeLog {
    calls: Arc<Mutex<Vec<Call>>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl FakeLog {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts_for(&self, number: u64) -> usize {
        self.calls().iter().filter(|c| c.number == number).count()
    }

    /// Job numbers in the order their first attempt started.
    pub fn started(&self) -> Vec<u64> {
        let mut seen = Vec::new();
        for c in self.calls() {
            if !seen.contains(&c.number) {
                seen.push(c.number);
            }
        }
        seen
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

/// A fake executor that:
/// - records every attempt (job number, slot, argv, stdin)
/// - sleeps for a per-job delay, honouring cancellation
/// - returns scripted statuses per attempt, `Success` once the script runs out
/// - optionally "prints" the record as captured stdout
#[derive(Default)]
pub struct FakeExecutor {
    script: Mutex<HashMap<u64, VecDeque<JobStatus>>>,
    delays: HashMap<u64, Duration>,
    default_delay: Duration,
    capture: bool,
    log: FakeLog,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses returned by successive attempts of job `number`.
    pub fn script(self, number: u64, statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(number, statuses.into_iter().collect());
        self
    }

    pub fn delay(mut self, number: u64, delay: Duration) -> Self {
        self.delays.insert(number, delay);
        self
    }

    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Produce `"<record>\n"` on stdout for every attempt.
    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn log(&self) -> FakeLog {
        self.log.clone()
    }

    async fn attempt(&self, job: &Job, mut cancel: CancelSignal) -> Attempt {
        self.log.calls.lock().unwrap().push(Call {
            number: job.number,
            slot: job.slot,
            argv: job.argv.clone(),
            stdin: job.stdin.clone(),
            at: Instant::now(),
        });
        let now = self.log.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_active.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(&job.number)
            .copied()
            .unwrap_or(self.default_delay);

        let status = tokio::select! {
            _ = tokio::time::sleep(delay) => {
                self.script
                    .lock()
                    .unwrap()
                    .get_mut(&job.number)
                    .and_then(VecDeque::pop_front)
                    .unwrap_or(JobStatus::Success)
            }
            _ = cancelled(&mut cancel) => JobStatus::Cancelled,
        };

        self.log.active.fetch_sub(1, Ordering::SeqCst);

        let output = self.capture.then(|| CapturedOutput {
            stdout: format!("{}\n", job.record).into_bytes(),
            stderr: Vec::new(),
        });
        Attempt { status, output }
    }
}

impl JobExecutor for FakeExecutor {
    fn execute<'a>(
        &'a self,
        job: &'a Job,
        cancel: CancelSignal,
    ) -> Pin<Box<dyn Future<Output = Attempt> + Send + 'a>> {
        Box::pin(self.attempt(job, cancel))
    }
}
