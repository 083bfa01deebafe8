// tests/scheduler_fake_executor.rs

mod common;
use crate::common::{init_tracing, run_fake};

use std::time::Duration;

use pipe_while_read::engine::RunState;
use pipe_while_read::types::{EXIT_FAILURE, EXIT_SUCCESS, JobStatus};
use pipe_while_read_test_utils::builders::RunConfigBuilder;
use pipe_while_read_test_utils::fake_executor::FakeExecutor;

fn numbered_input(n: u64) -> Vec<u8> {
    (1..=n).map(|i| format!("r{i}\n")).collect::<String>().into_bytes()
}

#[tokio::test]
async fn empty_input_dispatches_nothing() {
    init_tracing();

    for jobs in [1, 4] {
        let exec = FakeExecutor::new();
        let log = exec.log();
        let cfg = RunConfigBuilder::new().jobs(jobs).build();

        let out = run_fake(cfg, &["echo"], b"", exec).await;

        assert!(log.calls().is_empty());
        assert_eq!(out.result.dispatched, 0);
        assert_eq!(out.result.processed, 0);
        assert_eq!(out.result.failed, 0);
        assert_eq!(out.result.exit_code(), EXIT_SUCCESS);
        assert_eq!(out.state, RunState::Done);
    }
}

#[tokio::test]
async fn sequential_run_appends_record_in_order() {
    init_tracing();

    let exec = FakeExecutor::new();
    let log = exec.log();
    let cfg = RunConfigBuilder::new().build();

    let out = run_fake(cfg, &["echo", "Got:"], b"foo\nbar\n", exec).await;

    let argvs: Vec<Vec<String>> = log.calls().into_iter().map(|c| c.argv).collect();
    assert_eq!(argvs, vec![vec!["echo", "Got:", "foo"], vec!["echo", "Got:", "bar"]]);
    assert_eq!(out.result.total, None, "single job without {{##}} streams");
    assert_eq!(out.result.succeeded, 2);
}

#[tokio::test]
async fn total_token_forces_buffering() {
    init_tracing();

    let exec = FakeExecutor::new();
    let log = exec.log();
    let cfg = RunConfigBuilder::new().build();

    let out = run_fake(cfg, &["echo", "{#}/{##}"], b"a\nb\nc\n", exec).await;

    assert_eq!(out.result.total, Some(3));
    let positions: Vec<String> = log.calls().into_iter().map(|c| c.argv[1].clone()).collect();
    assert_eq!(positions, vec!["1/3", "2/3", "3/3"]);
}

#[tokio::test]
async fn keep_order_restores_input_order() {
    init_tracing();

    let n = 8u64;
    let mut exec = FakeExecutor::new().capture();
    for i in 1..=n {
        // Later jobs finish first.
        exec = exec.delay(i, Duration::from_millis((n + 1 - i) * 15));
    }
    let log = exec.log();
    let cfg = RunConfigBuilder::new().jobs(4).keep_order(true).build();

    let out = run_fake(cfg, &["echo"], &numbered_input(n), exec).await;

    let expected: String = (1..=n).map(|i| format!("r{i}\n")).collect();
    assert_eq!(out.stdout, expected);
    assert_eq!(out.result.succeeded, n);
    assert_eq!(out.result.statuses.len() as u64, n);
    assert!(log.max_active() <= 4);
}

#[tokio::test]
async fn pool_is_bounded_and_slots_rotate() {
    init_tracing();

    let exec = FakeExecutor::new().default_delay(Duration::from_millis(20));
    let log = exec.log();
    let cfg = RunConfigBuilder::new().jobs(3).build();

    let out = run_fake(cfg, &["echo", "{%}"], &numbered_input(9), exec).await;

    assert_eq!(out.result.succeeded, 9);
    assert!(log.max_active() <= 3, "max active was {}", log.max_active());

    let calls = log.calls();
    let first: Vec<usize> = calls.iter().take(3).map(|c| c.slot).collect();
    assert_eq!(first, vec![1, 2, 3]);
    for c in &calls {
        assert!((1..=3).contains(&c.slot));
        assert_eq!(c.argv[1], c.slot.to_string());
    }
}

#[tokio::test]
async fn always_failing_job_is_retried_to_the_bound() {
    init_tracing();

    let exec = FakeExecutor::new().script(1, vec![JobStatus::Failed(1); 10]);
    let log = exec.log();
    let cfg = RunConfigBuilder::new()
        .retries(2)
        .retry_delay(Duration::from_millis(40))
        .build();

    let out = run_fake(cfg, &["false"], b"x\n", exec).await;

    assert_eq!(log.attempts_for(1), 3);
    let calls = log.calls();
    for pair in calls.windows(2) {
        assert!(pair[1].at.duration_since(pair[0].at) >= Duration::from_millis(40));
    }
    assert_eq!(out.result.failed, 1);
    assert_eq!(out.result.exit_code(), EXIT_FAILURE);
}

#[tokio::test]
async fn retry_stops_at_first_success() {
    init_tracing();

    let exec = FakeExecutor::new().script(1, [JobStatus::TimedOut, JobStatus::Success]);
    let log = exec.log();
    let cfg = RunConfigBuilder::new().retries(5).build();

    let out = run_fake(cfg, &["flaky"], b"x\n", exec).await;

    assert_eq!(log.attempts_for(1), 2);
    assert!(out.result.is_success());
}

#[tokio::test]
async fn failures_without_fail_fast_run_everything() {
    init_tracing();

    let exec = FakeExecutor::new()
        .script(2, [JobStatus::Failed(3)])
        .script(4, [JobStatus::TimedOut]);
    let log = exec.log();
    let cfg = RunConfigBuilder::new().build();

    let out = run_fake(cfg, &["cmd"], &numbered_input(5), exec).await;

    assert_eq!(log.started(), vec![1, 2, 3, 4, 5]);
    assert_eq!((out.result.succeeded, out.result.failed), (3, 2));
    assert_eq!(out.stderr, "pipe-while-read: 3 succeeded, 2 failed, 5 total\n");
    assert!(!out.result.aborted);
    assert_eq!(out.result.exit_code(), EXIT_FAILURE);
    assert_eq!(out.state, RunState::Done);
}

#[tokio::test]
async fn fail_fast_stops_dispatching_sequential() {
    init_tracing();

    let exec = FakeExecutor::new().script(3, [JobStatus::Failed(1)]);
    let log = exec.log();
    let cfg = RunConfigBuilder::new().fail_fast(true).build();

    let out = run_fake(cfg, &["cmd"], &numbered_input(10), exec).await;

    assert_eq!(log.started(), vec![1, 2, 3]);
    assert_eq!(out.result.dispatched, 3);
    assert!(out.result.aborted);
    assert_eq!(out.result.exit_code(), EXIT_FAILURE);
    assert_eq!(out.state, RunState::Aborted);
}

#[tokio::test]
async fn fail_fast_cancels_in_flight_jobs() {
    init_tracing();

    let exec = FakeExecutor::new()
        .default_delay(Duration::from_millis(50))
        .delay(3, Duration::ZERO)
        .script(3, [JobStatus::Failed(1)])
        .capture();
    let log = exec.log();
    let cfg = RunConfigBuilder::new()
        .jobs(2)
        .keep_order(true)
        .fail_fast(true)
        .build();

    let out = run_fake(cfg, &["cmd"], &numbered_input(10), exec).await;

    assert!(log.started().iter().all(|n| *n <= 4), "started {:?}", log.started());
    assert_eq!(out.result.failed, 1);
    assert!(out.result.aborted);
    assert!(out.stdout.is_empty(), "buffered output is discarded on abort");
    assert_eq!(out.state, RunState::Aborted);
}

#[tokio::test]
async fn tag_prefixes_output_with_record() {
    init_tracing();

    let exec = FakeExecutor::new().capture();
    let cfg = RunConfigBuilder::new().tag(true).build();

    let out = run_fake(cfg, &["echo"], b"a\nb\n", exec).await;

    assert_eq!(out.stdout, "a\ta\nb\tb\n");
}

#[tokio::test]
async fn stdin_mode_feeds_record_instead_of_appending() {
    init_tracing();

    let exec = FakeExecutor::new();
    let log = exec.log();
    let cfg = RunConfigBuilder::new().feed_stdin(true).trim(true).build();

    run_fake(cfg, &["wc", "-c"], b"  foo \n", exec).await;

    let calls = log.calls();
    assert_eq!(calls[0].argv, vec!["wc", "-c"]);
    assert_eq!(calls[0].stdin.as_deref(), Some(&b"foo\n"[..]));
}

#[tokio::test]
async fn delay_spaces_out_dispatches() {
    init_tracing();

    let exec = FakeExecutor::new();
    let log = exec.log();
    let cfg = RunConfigBuilder::new().delay(Duration::from_millis(30)).build();

    run_fake(cfg, &["echo"], b"a\nb\nc\n", exec).await;

    let calls = log.calls();
    assert_eq!(calls.len(), 3);
    for pair in calls.windows(2) {
        assert!(pair[1].at.duration_since(pair[0].at) >= Duration::from_millis(30));
    }
}

#[tokio::test]
async fn oversized_pool_still_runs() {
    init_tracing();

    let exec = FakeExecutor::new();
    let log = exec.log();
    let cfg = RunConfigBuilder::new().jobs(usize::MAX).build();

    let out = run_fake(cfg, &["echo", "{%}"], b"a\nb\n", exec).await;

    assert_eq!(out.result.succeeded, 2);
    let slots: Vec<usize> = log.calls().iter().map(|c| c.slot).collect();
    assert_eq!(slots, vec![1, 2]);
}

#[tokio::test]
async fn quiet_run_prints_no_summary() {
    init_tracing();

    let cfg = RunConfigBuilder::new().quiet(true).build();

    let out = run_fake(cfg, &["echo"], b"a\n", FakeExecutor::new().capture()).await;

    assert_eq!(out.result.succeeded, 1);
    assert!(out.stderr.is_empty(), "stderr was {:?}", out.stderr);
}
