//! One-shot health check of a running unit, without start or stop.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::ports::{LogSource, SocketTable};
use crate::application::services::probe::{LogProbe, PortProbe};
use crate::domain::launch::LOG_LOOKBACK_SECS;
use crate::domain::probe::LogPattern;
use crate::domain::unit::validate_unit_name;

/// Inputs of a one-shot check.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub unit: String,
    pub main_pid: Option<u32>,
    /// Empty skips the port probe.
    pub expected_ports: BTreeSet<u16>,
    /// Log lines are read from one second before this instant.
    pub log_epoch: DateTime<Utc>,
    /// `None` skips the log probe.
    pub log_pattern: Option<LogPattern>,
}

/// Result of a one-shot check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub changed: bool,
    pub passed_checks: u8,
    pub ports: BTreeSet<u16>,
    pub matched_lines: Vec<String>,
}

/// Run whichever probes the request asks for, once.
///
/// # Errors
///
/// Returns a validation error for a bad unit name, or propagates probe
/// failures.
pub async fn check_service(
    sockets: &impl SocketTable,
    logs: &impl LogSource,
    request: &CheckRequest,
) -> Result<CheckReport> {
    validate_unit_name(&request.unit)?;
    let mut report = CheckReport::default();

    if !request.expected_ports.is_empty() {
        let ports = PortProbe::new(sockets).check(request.main_pid, &request.expected_ports)?;
        report.passed_checks += ports.passed;
        report.ports = ports.observed;
    }

    if let Some(pattern) = &request.log_pattern {
        let since = request.log_epoch - chrono::Duration::seconds(LOG_LOOKBACK_SECS);
        let logs = LogProbe::new(logs)
            .check_all(&request.unit, since, pattern)
            .await?;
        report.passed_checks += logs.passed();
        report.matched_lines = logs.lines;
    }

    tracing::info!(
        unit = %request.unit,
        passed = report.passed_checks,
        "one-shot check"
    );
    Ok(report)
}
