// src/exec/process.rs

//! Real child-process executor.

use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::types::{JobStatus, SPAWN_FAILURE_EXIT_CODE};

use super::{Attempt, CancelSignal, CapturedOutput, Job, JobExecutor, OutputMode, cancelled};

/// Time a child gets to exit after SIGTERM before it is killed.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(1);

/// Runs each attempt as an OS process.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Option<Duration>,
    kill_grace: Duration,
    output: OutputMode,
}

enum WaitOutcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

impl ProcessExecutor {
    pub fn new(timeout: Option<Duration>, output: OutputMode) -> Self {
        Self {
            timeout,
            kill_grace: DEFAULT_KILL_GRACE,
            output,
        }
    }

    pub fn from_config(cfg: &RunConfig) -> Self {
        Self::new(cfg.timeout, cfg.output_mode())
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    async fn run_attempt(&self, job: &Job, mut cancel: CancelSignal) -> Attempt {
        match self.spawn_and_wait(job, &mut cancel).await {
            Ok(attempt) => attempt,
            Err(err) => {
                warn!(
                    job = job.number,
                    error = %format!("{err:#}"),
                    "could not run command"
                );
                Attempt::new(JobStatus::Failed(SPAWN_FAILURE_EXIT_CODE))
            }
        }
    }

    async fn spawn_and_wait(&self, job: &Job, cancel: &mut CancelSignal) -> Result<Attempt> {
        let (program, args) = job.argv.split_first().context("empty command line")?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(if job.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        match self.output {
            OutputMode::Inherit => cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit()),
            OutputMode::Capture => cmd.stdout(Stdio::piped()).stderr(Stdio::piped()),
            OutputMode::Discard => cmd.stdout(Stdio::null()).stderr(Stdio::null()),
        };

        debug!(job = job.number, slot = job.slot, argv = ?job.argv, "starting job process");

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning '{program}' for job {}", job.number))?;

        // Write from a separate task so a child that never reads can't wedge us.
        let feeder = match (job.stdin.clone(), child.stdin.take()) {
            (Some(data), Some(mut pipe)) => Some(tokio::spawn(async move {
                let _ = pipe.write_all(&data).await;
            })),
            _ => None,
        };
        let stdout = child.stdout.take().map(|s| tokio::spawn(drain(s)));
        let stderr = child.stderr.take().map(|s| tokio::spawn(drain(s)));

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let outcome = tokio::select! {
            res = child.wait() => WaitOutcome::Exited(res),
            _ = sleep_until_opt(deadline) => WaitOutcome::TimedOut,
            _ = cancelled(cancel) => WaitOutcome::Cancelled,
        };

        let mut status = match outcome {
            WaitOutcome::Exited(res) => {
                let status = res.with_context(|| format!("waiting for job {}", job.number))?;
                status_from_exit(status)
            }
            WaitOutcome::TimedOut => {
                info!(
                    job = job.number,
                    timeout_secs = self.timeout.map(|d| d.as_secs_f64()).unwrap_or_default(),
                    "job timed out; terminating"
                );
                terminate(&mut child, self.kill_grace).await;
                JobStatus::TimedOut
            }
            WaitOutcome::Cancelled => {
                debug!(job = job.number, "run aborted; terminating job");
                terminate(&mut child, self.kill_grace).await;
                JobStatus::Cancelled
            }
        };

        // A grandchild may still hold the pipes open. Collection stays under
        // the job deadline, or the grace window after a forced stop.
        let collect_deadline = if matches!(status, JobStatus::TimedOut | JobStatus::Cancelled) {
            Some(Instant::now() + self.kill_grace)
        } else {
            deadline
        };

        let output = if self.output == OutputMode::Capture {
            let out = join_output(stdout, collect_deadline).await;
            let err = join_output(stderr, collect_deadline).await;
            let still_open = out.is_none() || err.is_none();
            if still_open && !matches!(status, JobStatus::TimedOut | JobStatus::Cancelled) {
                info!(
                    job = job.number,
                    "job output still open at the deadline; counting as timed out"
                );
                status = JobStatus::TimedOut;
            }
            Some(CapturedOutput {
                stdout: out.unwrap_or_default(),
                stderr: err.unwrap_or_default(),
            })
        } else {
            None
        };

        if let Some(feeder) = feeder {
            feeder.abort();
        }

        debug!(job = job.number, status = %status, "job process finished");
        Ok(Attempt { status, output })
    }
}

impl JobExecutor for ProcessExecutor {
    fn execute<'a>(
        &'a self,
        job: &'a Job,
        cancel: CancelSignal,
    ) -> Pin<Box<dyn Future<Output = Attempt> + Send + 'a>> {
        Box::pin(self.run_attempt(job, cancel))
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending::<()>().await,
    }
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf).await;
    buf
}

/// Collected bytes, or `None` if the stream was still open at `deadline`.
async fn join_output(
    handle: Option<JoinHandle<Vec<u8>>>,
    deadline: Option<Instant>,
) -> Option<Vec<u8>> {
    let Some(handle) = handle else {
        return Some(Vec::new());
    };
    let abort = handle.abort_handle();
    let joined = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, handle).await {
            Ok(res) => res,
            Err(_) => {
                abort.abort();
                return None;
            }
        },
        None => handle.await,
    };
    Some(joined.unwrap_or_default())
}

fn status_from_exit(status: ExitStatus) -> JobStatus {
    if status.success() {
        return JobStatus::Success;
    }
    if let Some(code) = status.code() {
        return JobStatus::Failed(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return JobStatus::Failed(128 + sig);
        }
    }
    JobStatus::Failed(-1)
}

/// Stop a child: SIGTERM first, SIGKILL once the grace window runs out.
async fn terminate(child: &mut Child, grace: Duration) {
    if send_sigterm(child) && tokio::time::timeout(grace, child.wait()).await.is_ok() {
        return;
    }
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill child process");
    }
}

#[cfg(unix)]
fn send_sigterm(child: &Child) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|p| i32::try_from(p).ok()) else {
        return false;
    };
    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => true,
        Err(e) => {
            debug!(pid, error = %e, "SIGTERM failed");
            false
        }
    }
}

#[cfg(not(unix))]
fn send_sigterm(_child: &Child) -> bool {
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::sync::watch;

    fn job(argv: &[&str]) -> Job {
        Job {
            number: 1,
            slot: 1,
            record: String::new(),
            argv: argv.iter().map(|s| s.to_string()).collect(),
            stdin: None,
        }
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let (_tx, rx) = watch::channel(false);
        let exec = ProcessExecutor::new(None, OutputMode::Capture);
        let attempt = exec
            .execute(&job(&["sh", "-c", "echo hi; echo oops >&2; exit 3"]), rx)
            .await;
        assert_eq!(attempt.status, JobStatus::Failed(3));
        let out = attempt.output.unwrap();
        assert_eq!(out.stdout, b"hi\n");
        assert_eq!(out.stderr, b"oops\n");
    }

    #[tokio::test]
    async fn feeds_stdin() {
        let (_tx, rx) = watch::channel(false);
        let exec = ProcessExecutor::new(None, OutputMode::Capture);
        let mut j = job(&["cat"]);
        j.stdin = Some(b"payload\n".to_vec());
        let attempt = exec.execute(&j, rx).await;
        assert_eq!(attempt.status, JobStatus::Success);
        assert_eq!(attempt.output.unwrap().stdout, b"payload\n");
    }

    #[tokio::test]
    async fn timeout_reports_distinct_status() {
        let (_tx, rx) = watch::channel(false);
        let exec = ProcessExecutor::new(Some(Duration::from_millis(100)), OutputMode::Discard)
            .with_kill_grace(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let attempt = exec.execute(&job(&["sleep", "5"]), rx).await;
        assert_eq!(attempt.status, JobStatus::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn timeout_covers_output_held_open_by_grandchild() {
        let (_tx, rx) = watch::channel(false);
        let exec = ProcessExecutor::new(Some(Duration::from_millis(300)), OutputMode::Capture);
        let started = std::time::Instant::now();
        let attempt = exec
            .execute(&job(&["sh", "-c", "sleep 3 & echo hi"]), rx)
            .await;
        assert_eq!(attempt.status, JobStatus::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn captured_output_within_deadline_succeeds() {
        let (_tx, rx) = watch::channel(false);
        let exec = ProcessExecutor::new(Some(Duration::from_secs(5)), OutputMode::Capture);
        let attempt = exec.execute(&job(&["echo", "fast"]), rx).await;
        assert_eq!(attempt.status, JobStatus::Success);
        assert_eq!(attempt.output.unwrap().stdout, b"fast\n");
    }

    #[tokio::test]
    async fn cancellation_stops_the_child() {
        let (tx, rx) = watch::channel(false);
        let exec = ProcessExecutor::new(None, OutputMode::Discard);
        let j = job(&["sleep", "5"]);
        let handle = async { exec.execute(&j, rx).await };
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(true).unwrap();
        };
        let (attempt, ()) = tokio::join!(handle, cancel);
        assert_eq!(attempt.status, JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn missing_program_is_spawn_failure() {
        let (_tx, rx) = watch::channel(false);
        let exec = ProcessExecutor::new(None, OutputMode::Discard);
        let attempt = exec
            .execute(&job(&["/definitely/not/a/program"]), rx)
            .await;
        assert_eq!(attempt.status, JobStatus::Failed(SPAWN_FAILURE_EXIT_CODE));
    }
}
