//! Launch supervisor scenarios driven through scripted ports.

use std::time::Duration;

use anyhow::Result;
use mega_launch_cli::application::ports::{LogQuery, LogSource};
use mega_launch_cli::application::services::launch::{Collaborators, LaunchSupervisor};
use mega_launch_cli::domain::{LaunchConfig, LaunchError, LogPattern, RunMode, SupervisorResult};

use crate::helpers::{
    DEAD, FakeLogs, FakeManager, FakeSockets, RUNNING, RecordingSink, WarnCollector, err_output,
    ok_output,
};

fn config(unit: &str) -> LaunchConfig {
    let mut config = LaunchConfig::new(unit);
    config.wait_timeout = Duration::from_secs(5);
    config.retry_delay = Duration::from_secs(1);
    config.rescue_delay = Duration::from_secs(2);
    config.max_rescues = 1;
    config.required_checks = 2;
    config.expected_ports = [1443].into_iter().collect();
    config.log_pattern = LogPattern::new(".*ready").unwrap();
    config
}

/// Stopped unit that comes up on start.
fn starts_cleanly() -> FakeManager {
    FakeManager::default()
        .answer("show", ok_output(DEAD))
        .answer("show", ok_output(RUNNING))
        .answer("start", ok_output(b""))
        .answer("stop", ok_output(b""))
}

async fn run<L: LogSource>(
    config: &LaunchConfig,
    mode: RunMode,
    manager: &FakeManager,
    logs: &L,
    sink: &RecordingSink,
    reporter: &WarnCollector,
) -> Result<SupervisorResult> {
    let sockets = FakeSockets::listening(&[22, 1443]);
    LaunchSupervisor::new(
        config,
        mode,
        Collaborators {
            services: manager,
            sockets: &sockets,
            logs,
            events: sink,
            reporter,
        },
    )
    .run()
    .await
}

fn exhausted(err: &anyhow::Error) -> &SupervisorResult {
    match err.downcast_ref::<LaunchError>() {
        Some(LaunchError::RescueExhausted { result, .. }) => &**result,
        other => panic!("expected RescueExhausted, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn log_never_matching_polls_until_wait_timeout_then_fails() {
    let manager = starts_cleanly();
    let logs = FakeLogs::with_lines(&["2026-10-19T10:00:00+0000 host xray[4242]: booting"]);
    let sink = RecordingSink::default();
    let reporter = WarnCollector::default();

    let err = run(&config("xray"), RunMode::Live, &manager, &logs, &sink, &reporter)
        .await
        .expect_err("log check never passes");

    // Polls at t = 0, 1, 2, 3, 4 within a 5 s budget.
    assert_eq!(logs.queries(), 5);
    let result = exhausted(&err);
    assert!(!result.changed);
    assert_eq!(result.passed_checks, 1);
    assert_eq!(result.port_list, [22, 1443].into_iter().collect());
    assert_eq!(
        result.msg.as_deref(),
        Some("Passed checks [1] less than [2] required checks")
    );
    assert_eq!(manager.count("start"), 1);
    assert_eq!(manager.count("stop"), 1);
    assert_eq!(
        sink.messages().last().map(String::as_str),
        Some("not enough [1/2] checks, [xray] stopped")
    );
    assert_eq!(reporter.warnings().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn healthy_unit_succeeds_on_first_poll() {
    let manager = starts_cleanly();
    let logs = FakeLogs::with_lines(&[
        "2026-10-19T10:00:00+0000 host xray[4242]: booting",
        "2026-10-19T10:00:01+0000 host xray[4242]: ready on :1443",
    ]);
    let sink = RecordingSink::default();

    let mut cfg = config("xray");
    cfg.log_pattern = LogPattern::new(r"\S+ host xray\[\d+\]: ready").unwrap();
    let result = run(
        &cfg,
        RunMode::Live,
        &manager,
        &logs,
        &sink,
        &WarnCollector::default(),
    )
    .await
    .unwrap();

    assert!(result.changed);
    assert_eq!(result.passed_checks, 2);
    assert_eq!(result.matched_lines.len(), 1);
    assert!(result.matched_lines[0].ends_with("ready on :1443"));
    assert_eq!(logs.queries(), 1);
    assert_eq!(manager.count("stop"), 0);
    assert_eq!(
        sink.messages().first().map(String::as_str),
        Some("retry [1/1] start [xray] service")
    );
}

#[tokio::test(start_paused = true)]
async fn attempts_are_bounded_by_max_rescues() {
    let manager = starts_cleanly();
    let logs = FakeLogs::with_lines(&[]);
    let sink = RecordingSink::default();

    let mut cfg = config("xray");
    cfg.max_rescues = 3;
    cfg.wait_timeout = Duration::from_secs(2);
    let err = run(
        &cfg,
        RunMode::Live,
        &manager,
        &logs,
        &sink,
        &WarnCollector::default(),
    )
    .await
    .expect_err("never healthy");

    assert_eq!(exhausted(&err).passed_checks, 1);
    assert_eq!(manager.count("start"), 3);
    assert_eq!(manager.count("stop"), 3);
    assert_eq!(logs.queries(), 6);
    let retries: Vec<String> = sink
        .messages()
        .into_iter()
        .filter(|m| m.starts_with("retry"))
        .collect();
    assert_eq!(
        retries,
        [
            "retry [1/3] start [xray] service",
            "retry [2/3] start [xray] service",
            "retry [3/3] start [xray] service",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn unit_running_beforehand_is_never_stopped() {
    let manager = FakeManager::default()
        .answer("show", ok_output(RUNNING))
        .answer("start", ok_output(b""));
    let logs = FakeLogs::with_lines(&[]);
    let sink = RecordingSink::default();

    let mut cfg = config("xray");
    cfg.max_rescues = 2;
    let err = run(
        &cfg,
        RunMode::Live,
        &manager,
        &logs,
        &sink,
        &WarnCollector::default(),
    )
    .await
    .expect_err("log check never passes");

    assert!(!exhausted(&err).changed);
    assert_eq!(manager.count("stop"), 0);
    assert!(
        sink.messages()
            .iter()
            .any(|m| m == "not enough [1/2] checks, [xray] left running")
    );
}

#[tokio::test(start_paused = true)]
async fn already_healthy_unit_reports_no_change() {
    let manager = FakeManager::default()
        .answer("show", ok_output(RUNNING))
        .answer("start", ok_output(b""));
    let logs = FakeLogs::with_lines(&["ready"]);

    let result = run(
        &config("xray"),
        RunMode::Live,
        &manager,
        &logs,
        &RecordingSink::default(),
        &WarnCollector::default(),
    )
    .await
    .unwrap();

    assert!(!result.changed);
    assert_eq!(result.passed_checks, 2);
}

#[tokio::test(start_paused = true)]
async fn glob_in_name_fails_before_any_manager_call() {
    let manager = FakeManager::default();
    let logs = FakeLogs::default();

    let err = run(
        &config("nginx*"),
        RunMode::Live,
        &manager,
        &logs,
        &RecordingSink::default(),
        &WarnCollector::default(),
    )
    .await
    .expect_err("glob rejected");

    assert!(matches!(
        err.downcast_ref::<LaunchError>(),
        Some(LaunchError::GlobInName { pattern: '*', .. })
    ));
    assert!(
        err.to_string()
            .contains("does not currently support using glob patterns")
    );
    assert!(manager.calls().is_empty());
    assert_eq!(logs.queries(), 0);
}

#[tokio::test(start_paused = true)]
async fn dry_run_never_starts_or_stops() {
    let manager = FakeManager::default().answer("show", ok_output(RUNNING));
    let logs = FakeLogs::with_lines(&[]);
    let sink = RecordingSink::default();

    let err = run(
        &config("xray"),
        RunMode::DryRun,
        &manager,
        &logs,
        &sink,
        &WarnCollector::default(),
    )
    .await
    .expect_err("log check never passes");

    assert_eq!(exhausted(&err).passed_checks, 1);
    assert_eq!(manager.count("start"), 0);
    assert_eq!(manager.count("stop"), 0);
    assert_eq!(
        sink.messages().first().map(String::as_str),
        Some("retry [1/1] check_mode [xray] service")
    );
    assert_eq!(
        sink.messages().last().map(String::as_str),
        Some("not enough [1/2] checks, [xray] check_mode")
    );
}

#[tokio::test(start_paused = true)]
async fn start_that_leaves_unit_inactive_fails_with_status() {
    let manager = FakeManager::default()
        .answer("show", ok_output(DEAD))
        .answer("start", ok_output(b""));
    let logs = FakeLogs::default();

    let err = run(
        &config("xray"),
        RunMode::Live,
        &manager,
        &logs,
        &RecordingSink::default(),
        &WarnCollector::default(),
    )
    .await
    .expect_err("unit stays down");

    let launch = err.downcast_ref::<LaunchError>().unwrap();
    assert_eq!(launch.code(), "start_failed");
    assert_eq!(
        launch.status().and_then(|s| s.active_state.as_deref()),
        Some("inactive")
    );
    assert_eq!(logs.queries(), 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_start_surfaces_manager_stderr() {
    let manager = FakeManager::default()
        .answer("show", ok_output(DEAD))
        .answer("start", err_output(1, b"Job for xray.service failed."));
    let logs = FakeLogs::default();

    let err = run(
        &config("xray"),
        RunMode::Live,
        &manager,
        &logs,
        &RecordingSink::default(),
        &WarnCollector::default(),
    )
    .await
    .expect_err("start rejected");

    assert_eq!(
        err.to_string(),
        "Unable to start service xray: Job for xray.service failed."
    );
}

struct BrokenJournal;

impl LogSource for BrokenJournal {
    async fn query(&self, query: &LogQuery<'_>) -> Result<Vec<String>> {
        Err(LaunchError::LogQuery {
            tag: query.tag.to_string(),
            stderr: "No journal files were found.".to_string(),
        }
        .into())
    }
}

#[tokio::test(start_paused = true)]
async fn log_query_failure_aborts_without_rescue() {
    let manager = starts_cleanly();

    let err = run(
        &config("xray"),
        RunMode::Live,
        &manager,
        &BrokenJournal,
        &RecordingSink::default(),
        &WarnCollector::default(),
    )
    .await
    .expect_err("journal unavailable");

    assert_eq!(
        err.downcast_ref::<LaunchError>().map(LaunchError::code),
        Some("log_query")
    );
    assert_eq!(manager.count("start"), 1);
    assert_eq!(manager.count("stop"), 0);
}
