// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::cli::CliArgs;
use crate::exec::OutputMode;
use crate::types::RecordDelimiter;

/// Default spelling of the full-record placeholder.
pub const DEFAULT_REPLACE: &str = "{}";

/// Raw settings as read from a defaults file and/or the command line.
///
/// Every key is optional; anything missing falls back to the built-in
/// default when converted into a [`RunConfig`].
///
/// ```toml
/// jobs = 4
/// timeout = 30
/// retries = 2
/// retry_delay = 0.5
/// keep_order = true
/// delimiter = "\t"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRunConfig {
    pub dry_run: Option<bool>,
    pub verbose: Option<bool>,
    pub quiet: Option<bool>,
    pub jobs: Option<usize>,
    /// Seconds; 0 disables the timeout.
    pub timeout: Option<f64>,
    pub retries: Option<u32>,
    /// Seconds between retry attempts.
    pub retry_delay: Option<f64>,
    pub keep_order: Option<bool>,
    pub progress: Option<bool>,
    /// NUL-delimited records.
    pub null: Option<bool>,
    /// Field delimiter; escapes like `\t` are understood.
    pub delimiter: Option<String>,
    /// Spelling of the full-record placeholder.
    pub replace: Option<String>,
    pub tag: Option<bool>,
    pub fail_fast: Option<bool>,
    /// Feed records on the child's stdin.
    pub stdin: Option<bool>,
    /// Seconds to pause before each dispatch.
    pub delay: Option<f64>,
    pub trim: Option<bool>,
}

impl RawRunConfig {
    /// Layer command-line flags over these settings.
    ///
    /// Options given on the command line replace file values; boolean flags
    /// only ever switch a feature on.
    pub fn overlay_cli(mut self, args: &CliArgs) -> Self {
        fn flag(current: &mut Option<bool>, set: bool) {
            if set {
                *current = Some(true);
            }
        }

        flag(&mut self.dry_run, args.dry_run);
        flag(&mut self.verbose, args.verbose);
        flag(&mut self.quiet, args.quiet);
        flag(&mut self.keep_order, args.keep_order);
        flag(&mut self.progress, args.progress);
        flag(&mut self.null, args.null);
        flag(&mut self.tag, args.tag);
        flag(&mut self.fail_fast, args.fail_fast);
        flag(&mut self.stdin, args.stdin);
        flag(&mut self.trim, args.trim);

        self.jobs = args.jobs.or(self.jobs);
        self.timeout = args.timeout.or(self.timeout);
        self.retries = args.retries.or(self.retries);
        self.retry_delay = args.retry_delay.or(self.retry_delay);
        self.delay = args.delay.or(self.delay);
        self.delimiter = args.delimiter.clone().or(self.delimiter);
        self.replace = args.replace.clone().or(self.replace);
        self
    }
}

/// Validated, immutable configuration for one run.
///
/// Construct via `RunConfig::try_from(raw)` (see `validate.rs`) or start from
/// `RunConfig::default()` and adjust fields in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub dry_run: bool,
    pub verbose: bool,
    pub quiet: bool,
    /// Worker pool size, always >= 1.
    pub jobs: usize,
    /// `None` means no limit.
    pub timeout: Option<Duration>,
    pub retries: u32,
    pub retry_delay: Duration,
    pub keep_order: bool,
    pub progress: bool,
    pub record_delimiter: RecordDelimiter,
    /// Already unescaped; empty means "whole record is field 1".
    pub field_delimiter: String,
    /// Spelling of the full-record placeholder, never empty.
    pub replace: String,
    pub tag: bool,
    pub fail_fast: bool,
    pub feed_stdin: bool,
    pub delay: Duration,
    pub trim: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            quiet: false,
            jobs: 1,
            timeout: None,
            retries: 0,
            retry_delay: Duration::ZERO,
            keep_order: false,
            progress: false,
            record_delimiter: RecordDelimiter::Newline,
            field_delimiter: String::new(),
            replace: DEFAULT_REPLACE.to_string(),
            tag: false,
            fail_fast: false,
            feed_stdin: false,
            delay: Duration::ZERO,
            trim: false,
        }
    }
}

impl RunConfig {
    pub fn is_parallel(&self) -> bool {
        self.jobs > 1
    }

    /// How children's stdout/stderr are wired.
    ///
    /// Quiet wins over everything; output is captured only when it has to
    /// be tagged or reordered.
    pub fn output_mode(&self) -> OutputMode {
        if self.quiet {
            OutputMode::Discard
        } else if self.tag || (self.keep_order && self.is_parallel()) {
            OutputMode::Capture
        } else {
            OutputMode::Inherit
        }
    }

    /// Whether reordering buffers are needed for this run.
    pub fn reorders_output(&self) -> bool {
        self.keep_order && self.is_parallel() && !self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_file_values() {
        let file = RawRunConfig {
            jobs: Some(8),
            retries: Some(3),
            tag: Some(true),
            ..Default::default()
        };
        let args = CliArgs {
            jobs: Some(2),
            trim: true,
            command: vec!["echo".into()],
            ..Default::default()
        };

        let merged = file.overlay_cli(&args);
        assert_eq!(merged.jobs, Some(2));
        assert_eq!(merged.retries, Some(3));
        assert_eq!(merged.tag, Some(true));
        assert_eq!(merged.trim, Some(true));
        assert_eq!(merged.keep_order, None);
    }

    #[test]
    fn output_mode_selection() {
        let mut cfg = RunConfig::default();
        assert_eq!(cfg.output_mode(), OutputMode::Inherit);

        cfg.keep_order = true;
        assert_eq!(cfg.output_mode(), OutputMode::Inherit, "sequential runs are ordered already");

        cfg.jobs = 4;
        assert_eq!(cfg.output_mode(), OutputMode::Capture);

        cfg.quiet = true;
        assert_eq!(cfg.output_mode(), OutputMode::Discard);
        assert!(!cfg.reorders_output());
    }
}
