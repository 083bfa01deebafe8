// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{DEFAULT_REPLACE, RawRunConfig, RunConfig};
use crate::errors::{PipeError, Result};
use crate::types::RecordDelimiter;

/// Upper bound for `--jobs`.
pub const MAX_JOBS: usize = 1024;

impl TryFrom<RawRunConfig> for RunConfig {
    type Error = PipeError;

    fn try_from(raw: RawRunConfig) -> std::result::Result<Self, Self::Error> {
        let jobs = validate_jobs(raw.jobs)?;
        let timeout = match parse_seconds("timeout", raw.timeout)? {
            d if d.is_zero() => None,
            d => Some(d),
        };
        let replace = validate_replace(raw.replace)?;
        let field_delimiter = raw
            .delimiter
            .as_deref()
            .map(unescape_delimiter)
            .transpose()?
            .unwrap_or_default();

        let record_delimiter = if raw.null.unwrap_or(false) {
            RecordDelimiter::Nul
        } else {
            RecordDelimiter::Newline
        };

        Ok(RunConfig {
            dry_run: raw.dry_run.unwrap_or(false),
            verbose: raw.verbose.unwrap_or(false),
            quiet: raw.quiet.unwrap_or(false),
            jobs,
            timeout,
            retries: raw.retries.unwrap_or(0),
            retry_delay: parse_seconds("retry-delay", raw.retry_delay)?,
            keep_order: raw.keep_order.unwrap_or(false),
            progress: raw.progress.unwrap_or(false),
            record_delimiter,
            field_delimiter,
            replace,
            tag: raw.tag.unwrap_or(false),
            fail_fast: raw.fail_fast.unwrap_or(false),
            feed_stdin: raw.stdin.unwrap_or(false),
            delay: parse_seconds("delay", raw.delay)?,
            trim: raw.trim.unwrap_or(false),
        })
    }
}

fn validate_jobs(jobs: Option<usize>) -> Result<usize> {
    match jobs {
        None => Ok(1),
        Some(0) => Err(PipeError::Usage("jobs must be >= 1 (got 0)".to_string())),
        Some(n) if n > MAX_JOBS => Err(PipeError::Usage(format!(
            "jobs must be <= {MAX_JOBS} (got {n})"
        ))),
        Some(n) => Ok(n),
    }
}

fn validate_replace(replace: Option<String>) -> Result<String> {
    match replace {
        None => Ok(DEFAULT_REPLACE.to_string()),
        Some(s) if s.is_empty() => Err(PipeError::Usage(
            "replace string must not be empty".to_string(),
        )),
        Some(s) => Ok(s),
    }
}

fn parse_seconds(name: &str, secs: Option<f64>) -> Result<Duration> {
    let Some(secs) = secs else {
        return Ok(Duration::ZERO);
    };
    Duration::try_from_secs_f64(secs).map_err(|_| {
        PipeError::Usage(format!(
            "{name} must be a finite, non-negative number of seconds (got {secs})"
        ))
    })
}

/// Resolve the escapes `\t`, `\n`, `\0` and `\\` in a delimiter argument.
///
/// Any other backslash sequence is rejected so typos don't silently become
/// literal delimiters.
pub fn unescape_delimiter(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                return Err(PipeError::Usage(format!(
                    "unsupported escape '\\{other}' in delimiter {raw:?}"
                )));
            }
            None => {
                return Err(PipeError::Usage(format!(
                    "dangling backslash in delimiter {raw:?}"
                )));
            }
        }
    }

    Ok(out)
}
