// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Numeric options are `Option`s so that a value from the defaults file
//! (see [`crate::config`]) is only overridden when the flag is given.
//! Boolean flags can only switch a feature on.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `pipe-while-read`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "pipe-while-read",
    version,
    about = "Read stdin record by record and run a command for each one.",
    long_about = None
)]
pub struct CliArgs {
    /// Show the commands that would run without executing them.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Narrate retries, timeouts and the final summary on stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Discard the output of the commands.
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of jobs to run concurrently (default 1).
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Per-job wall clock limit in seconds; 0 disables the limit.
    #[arg(short, long, value_name = "SEC")]
    pub timeout: Option<f64>,

    /// Additional attempts after a failed run of a job.
    #[arg(short, long, value_name = "N")]
    pub retries: Option<u32>,

    /// Pause between retry attempts, in seconds.
    #[arg(long, value_name = "SEC")]
    pub retry_delay: Option<f64>,

    /// Emit the output of parallel jobs in input order.
    #[arg(short, long)]
    pub keep_order: bool,

    /// Render a progress bar with ETA on stderr.
    #[arg(short, long)]
    pub progress: bool,

    /// Records are terminated by NUL instead of newline.
    #[arg(short = '0', long)]
    pub null: bool,

    /// Field delimiter for `{1}`, `{-1}`, ... (understands \t, \n, \0, \\).
    #[arg(short, long, value_name = "D")]
    pub delimiter: Option<String>,

    /// Spelling of the full-record placeholder (default `{}`).
    #[arg(short = 'I', long, value_name = "STR")]
    pub replace: Option<String>,

    /// Prefix each output line with the record that produced it.
    #[arg(long)]
    pub tag: bool,

    /// Abort all outstanding jobs on the first failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Feed the record to the command's stdin instead of as an argument.
    #[arg(long)]
    pub stdin: bool,

    /// Pause before each job is started, in seconds.
    #[arg(long, value_name = "SEC")]
    pub delay: Option<f64>,

    /// Strip leading and trailing whitespace from every record.
    #[arg(long)]
    pub trim: bool,

    /// TOML file with default options.
    ///
    /// Falls back to `PIPE_WHILE_READ_CONFIG` when omitted.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPE_WHILE_READ_LOG` or a level derived from
    /// `--verbose` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Command to run plus its fixed arguments (may contain placeholders).
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
