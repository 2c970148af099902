//! Unit existence resolution against a scripted service manager.

use mega_launch_cli::application::services::unit::ServiceHandle;
use mega_launch_cli::domain::LaunchError;

use crate::helpers::{FakeManager, WarnCollector, err_output, ok_output};

const NOT_FOUND: &[u8] = b"LoadState=not-found\nActiveState=inactive\nSubState=dead\n";

#[tokio::test]
async fn init_script_only_unit_resolves_with_warning() {
    let manager = FakeManager::default()
        .answer("show", ok_output(NOT_FOUND))
        .with_init_script();
    let reporter = WarnCollector::default();

    let status = ServiceHandle::new(&manager, "legacyd")
        .resolve(&reporter)
        .await
        .unwrap();

    assert_eq!(status.active_state.as_deref(), Some("inactive"));
    assert_eq!(
        reporter.warnings(),
        ["The service (legacyd) is actually an init script but the system is managed by systemd"]
    );
}

#[tokio::test]
async fn template_instance_is_found_through_its_template() {
    let manager = FakeManager::default()
        .answer(
            "show",
            err_output(1, b"Failed to parse bus message: Invalid argument"),
        )
        .answer(
            "list-unit-files",
            ok_output(b"getty@.service enabled enabled\n"),
        )
        .answer("is-active", ok_output(b"active\n"));

    let status = ServiceHandle::new(&manager, "getty@tty1")
        .resolve(&WarnCollector::default())
        .await
        .unwrap();

    assert_eq!(status.active_state.as_deref(), Some("active"));
    assert!(
        manager
            .calls()
            .contains(&"list-unit-files getty@*".to_string())
    );
}

#[tokio::test]
async fn unknown_unit_without_init_script_is_not_found() {
    let manager = FakeManager::default().answer("show", ok_output(NOT_FOUND));

    let err = ServiceHandle::new(&manager, "nosuch")
        .resolve(&WarnCollector::default())
        .await
        .expect_err("unit is unknown");

    assert!(matches!(
        err.downcast_ref::<LaunchError>(),
        Some(LaunchError::UnitNotFound(unit)) if unit == "nosuch"
    ));
}

#[tokio::test]
async fn static_unit_that_show_cannot_describe_has_unknown_state() {
    let manager = FakeManager::default()
        .answer("show", err_output(4, b"Unit oneshot.service could not be found."))
        .answer("is-enabled", ok_output(b"static\n"));

    let err = ServiceHandle::new(&manager, "oneshot")
        .resolve(&WarnCollector::default())
        .await
        .expect_err("no state to report");

    assert_eq!(
        err.downcast_ref::<LaunchError>().map(LaunchError::code),
        Some("unknown_state")
    );
    assert_eq!(manager.count("list-unit-files"), 0);
}
