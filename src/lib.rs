// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod input;
pub mod logging;
pub mod progress;
pub mod template;
pub mod types;

use tokio::io::BufReader;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::resolve_run_config;
use crate::engine::{OutputSink, RunResult, Scheduler};
use crate::errors::Result;
use crate::exec::ProcessExecutor;
use crate::input::RecordReader;
use crate::template::Template;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution (defaults file + flags)
/// - logging, once the effective `verbose` setting is known
/// - the command template
/// - the record reader on stdin
/// - the process executor and the scheduler
pub async fn run(args: CliArgs) -> Result<RunResult> {
    let cfg = resolve_run_config(&args)?;
    logging::init_logging(args.log_level, cfg.verbose)?;
    debug!(?cfg, "resolved run configuration");

    let template = Template::new(args.command.clone(), &cfg)?;
    let reader = RecordReader::new(BufReader::new(tokio::io::stdin()), cfg.record_delimiter);
    let executor = ProcessExecutor::from_config(&cfg);

    let mut scheduler = Scheduler::new(cfg, template, executor, OutputSink::stdio());
    scheduler.run(reader).await
}
