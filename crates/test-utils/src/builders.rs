use std::time::Duration;

use pipe_while_read::config::RunConfig;
use pipe_while_read::types::RecordDelimiter;

/// Builder for `RunConfig` to simplify test setup.
#[derive(Default)]
pub struct RunConfigBuilder {
    cfg: RunConfig,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.cfg.jobs = jobs;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.cfg.retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.cfg.retry_delay = delay;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.cfg.timeout = Some(timeout);
        self
    }

    pub fn keep_order(mut self, val: bool) -> Self {
        self.cfg.keep_order = val;
        self
    }

    pub fn fail_fast(mut self, val: bool) -> Self {
        self.cfg.fail_fast = val;
        self
    }

    pub fn dry_run(mut self, val: bool) -> Self {
        self.cfg.dry_run = val;
        self
    }

    pub fn quiet(mut self, val: bool) -> Self {
        self.cfg.quiet = val;
        self
    }

    pub fn tag(mut self, val: bool) -> Self {
        self.cfg.tag = val;
        self
    }

    pub fn feed_stdin(mut self, val: bool) -> Self {
        self.cfg.feed_stdin = val;
        self
    }

    pub fn trim(mut self, val: bool) -> Self {
        self.cfg.trim = val;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.cfg.delay = delay;
        self
    }

    pub fn null(mut self) -> Self {
        self.cfg.record_delimiter = RecordDelimiter::Nul;
        self
    }

    pub fn field_delimiter(mut self, delim: &str) -> Self {
        self.cfg.field_delimiter = delim.to_string();
        self
    }

    pub fn replace(mut self, replace: &str) -> Self {
        self.cfg.replace = replace.to_string();
        self
    }

    pub fn build(self) -> RunConfig {
        self.cfg
    }
}
