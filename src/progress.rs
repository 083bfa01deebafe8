// src/progress.rs

//! Progress bar with ETA on stderr.
//!
//! Purely an observer: the scheduler hands it counter snapshots after every
//! completion and it renders them. It never feeds anything back.

use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

/// Cells in the rendered bar.
pub const BAR_WIDTH: usize = 30;

/// Counters at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub processed: u64,
    pub total: u64,
    pub failed: u64,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// `processed * 100 / total`, capped at 100. An empty run is complete.
    pub fn percentage(&self) -> u64 {
        if self.total == 0 {
            return 100;
        }
        (self.processed.saturating_mul(100) / self.total).min(100)
    }

    /// `elapsed * remaining / processed`; undefined before the first
    /// completion or before any time has passed.
    pub fn eta(&self) -> Option<Duration> {
        if self.processed == 0 || self.elapsed.is_zero() {
            return None;
        }
        let remaining = self.total.saturating_sub(self.processed);
        let secs = self.elapsed.as_secs_f64() * remaining as f64 / self.processed as f64;
        Some(Duration::from_secs_f64(secs))
    }

    pub fn bar(&self, width: usize) -> String {
        let filled = if self.total == 0 {
            width
        } else {
            let filled = (self.processed.min(self.total) as u128 * width as u128)
                / self.total as u128;
            filled as usize
        };
        let mut bar = String::with_capacity(width);
        bar.extend(std::iter::repeat_n('#', filled));
        bar.extend(std::iter::repeat_n('-', width - filled));
        bar
    }

    pub fn render(&self) -> String {
        let eta = self
            .eta()
            .map(|d| format!("{}s", d.as_secs()))
            .unwrap_or_else(|| "--".to_string());
        format!(
            "[{}] {}% {}/{} failed {} elapsed {}s eta {}",
            self.bar(BAR_WIDTH),
            self.percentage(),
            self.processed,
            self.total,
            self.failed,
            self.elapsed.as_secs(),
            eta
        )
    }
}

/// Renders snapshots in place on the diagnostic stream.
pub struct ProgressReporter {
    out: Option<Box<dyn Write + Send>>,
    started: Instant,
    total: u64,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("enabled", &self.is_enabled())
            .field("total", &self.total)
            .finish()
    }
}

impl ProgressReporter {
    /// Reporter for a run: active only when requested, the total is known
    /// and stderr is an interactive terminal.
    pub fn for_run(requested: bool, total: Option<u64>) -> Self {
        let out: Option<Box<dyn Write + Send>> = match total {
            Some(_) if requested && io::stderr().is_terminal() => Some(Box::new(io::stderr())),
            _ => None,
        };
        Self::with_writer(out, total.unwrap_or(0))
    }

    pub fn with_writer(out: Option<Box<dyn Write + Send>>, total: u64) -> Self {
        Self {
            out,
            started: Instant::now(),
            total,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.out.is_some()
    }

    pub fn snapshot(&self, processed: u64, failed: u64) -> ProgressSnapshot {
        ProgressSnapshot {
            processed,
            total: self.total,
            failed,
            elapsed: self.started.elapsed(),
        }
    }

    pub fn update(&mut self, processed: u64, failed: u64) {
        let snapshot = self.snapshot(processed, failed);
        if let Some(out) = self.out.as_mut() {
            // Progress is best effort; a closed stderr must not fail the run.
            let _ = write!(out, "\r{}", snapshot.render());
            let _ = out.flush();
        }
    }

    /// End the progress line.
    pub fn finish(&mut self) {
        if let Some(out) = self.out.as_mut() {
            let _ = writeln!(out);
            let _ = out.flush();
        }
    }
}
