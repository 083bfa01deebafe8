// src/engine/ordered.rs

//! Output plumbing: the sink captured output is written to, and the
//! reordering buffer used by `--keep-order`.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::exec::CapturedOutput;

/// Where captured job output and dry-run previews end up.
pub struct OutputSink {
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

impl OutputSink {
    pub fn new(stdout: Box<dyn Write + Send>, stderr: Box<dyn Write + Send>) -> Self {
        Self { stdout, stderr }
    }

    /// The process's own stdout/stderr.
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.stdout, "{line}")?;
        self.stdout.flush()
    }

    /// A line for the user on stderr, outside any job's output.
    pub fn diagnostic(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.stderr, "{line}")?;
        self.stderr.flush()
    }

    /// Write one job's output, optionally prefixing every line with `tag`.
    pub fn job_output(&mut self, output: &CapturedOutput, tag: Option<&str>) -> io::Result<()> {
        write_stream(&mut self.stdout, &output.stdout, tag)?;
        write_stream(&mut self.stderr, &output.stderr, tag)?;
        self.stdout.flush()?;
        self.stderr.flush()
    }
}

fn write_stream(out: &mut dyn Write, bytes: &[u8], tag: Option<&str>) -> io::Result<()> {
    let Some(tag) = tag else {
        return out.write_all(bytes);
    };
    for line in bytes.split_inclusive(|b| *b == b'\n') {
        out.write_all(tag.as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(line)?;
        if !line.ends_with(b"\n") {
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Per-job output held back until the run drains, keyed by job number.
#[derive(Debug, Default)]
pub struct OrderedOutput {
    pending: BTreeMap<u64, (String, CapturedOutput)>,
}

impl OrderedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, number: u64, record: String, output: CapturedOutput) {
        self.pending.insert(number, (record, output));
    }

    /// Write everything in ascending job number and empty the buffer.
    pub fn flush(&mut self, sink: &mut OutputSink, tag: bool) -> io::Result<()> {
        for (_, (record, output)) in std::mem::take(&mut self.pending) {
            sink.job_output(&output, tag.then_some(record.as_str()))?;
        }
        Ok(())
    }

    /// Drop buffered output without writing it (aborted runs).
    pub fn discard(&mut self) {
        self.pending.clear();
    }
}
