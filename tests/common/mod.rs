#![allow(dead_code)]

use pipe_while_read::config::RunConfig;
use pipe_while_read::engine::{RunResult, RunState, Scheduler};
use pipe_while_read::input::RecordReader;
use pipe_while_read::template::Template;
use pipe_while_read_test_utils::capture_sink;
use pipe_while_read_test_utils::fake_executor::FakeExecutor;

pub use pipe_while_read_test_utils::{init_tracing, with_timeout};

/// What a scheduler run against a fake executor left behind.
pub struct Outcome {
    pub result: RunResult,
    pub state: RunState,
    pub stdout: String,
    pub stderr: String,
}

pub fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Run `input` through a scheduler wired to `exec`, capturing the sink.
pub async fn run_fake(
    cfg: RunConfig,
    args: &[&str],
    input: &[u8],
    exec: FakeExecutor,
) -> Outcome {
    let template = Template::new(argv(args), &cfg).expect("valid template");
    let reader = RecordReader::new(input, cfg.record_delimiter);
    let (sink, stdout, stderr) = capture_sink();

    let mut scheduler = Scheduler::new(cfg, template, exec, sink);
    let result = with_timeout(scheduler.run(reader))
        .await
        .expect("run should not error");

    Outcome {
        result,
        state: scheduler.state(),
        stdout: stdout.contents(),
        stderr: stderr.contents(),
    }
}
