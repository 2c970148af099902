//! Launch configuration, per-attempt bookkeeping and the terminal result.
//!
//! This module is intentionally free of I/O, async, and external layer imports.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mega_launch_common::Scope;
use serde::Serialize;

use crate::domain::error::LaunchError;
use crate::domain::probe::LogPattern;
use crate::domain::unit::{ServiceStatus, validate_unit_name};

// ── Defaults ──────────────────────────────────────────────────────────────────

pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 77;
pub const DEFAULT_MAX_RESCUES: u32 = 3;
pub const DEFAULT_RESCUE_DELAY_SECS: u64 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 1;
pub const DEFAULT_REQUIRED_CHECKS: u8 = 2;

/// Only the port probe and the log probe exist.
pub const MAX_REQUIRED_CHECKS: u8 = 2;

/// Journal lookback before an attempt's start, so lines written in the same
/// second as the start call are not missed.
pub const LOG_LOOKBACK_SECS: i64 = 1;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Immutable input of one launch run.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub unit: String,
    /// Poll budget of each start attempt.
    pub wait_timeout: Duration,
    /// Maximum number of start attempts.
    pub max_rescues: u32,
    /// Pause after a failed attempt.
    pub rescue_delay: Duration,
    /// Pause between polls within an attempt.
    pub retry_delay: Duration,
    pub expected_ports: BTreeSet<u16>,
    pub log_pattern: LogPattern,
    pub required_checks: u8,
    pub scope: Scope,
    /// Suffix for the progress-event tag, so concurrent runs are told apart.
    pub epoch: Option<String>,
}

impl LaunchConfig {
    /// Configuration with the documented defaults for `unit`.
    #[must_use]
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            wait_timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
            max_rescues: DEFAULT_MAX_RESCUES,
            rescue_delay: Duration::from_secs(DEFAULT_RESCUE_DELAY_SECS),
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            expected_ports: BTreeSet::new(),
            log_pattern: LogPattern::any(),
            required_checks: DEFAULT_REQUIRED_CHECKS,
            scope: Scope::System,
            epoch: None,
        }
    }

    /// Check everything that can be checked without touching the host.
    ///
    /// # Errors
    ///
    /// Returns a `LaunchError` for a bad unit name, a required check count
    /// above two, or zero start attempts.
    pub fn validate(&self) -> Result<(), LaunchError> {
        validate_unit_name(&self.unit)?;
        if self.required_checks > MAX_REQUIRED_CHECKS {
            return Err(LaunchError::InvalidConfig(format!(
                "required_checks is {} but only {MAX_REQUIRED_CHECKS} checks exist",
                self.required_checks
            )));
        }
        if self.max_rescues == 0 {
            return Err(LaunchError::InvalidConfig(
                "max_rescues must allow at least one start attempt".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether the run may start and stop the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Live,
    /// Read-only probing: no start, no stop.
    DryRun,
}

impl RunMode {
    #[must_use]
    pub fn is_dry_run(self) -> bool {
        self == RunMode::DryRun
    }

    /// Word used in progress events.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            RunMode::Live => "start",
            RunMode::DryRun => "check_mode",
        }
    }
}

// ── State machine ─────────────────────────────────────────────────────────────

/// Supervisor states. `RescuePending -> Starting` is the retry edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    Starting,
    Polling,
    RescuePending,
    Succeeded,
    Failed,
}

/// Bookkeeping of one start attempt.
#[derive(Debug, Clone)]
pub struct AttemptState {
    /// 1-based.
    pub number: u32,
    /// Log lines are read from here on.
    pub started_at: DateTime<Utc>,
    /// Checks passed by the latest poll.
    pub passed_checks: u8,
    /// Matched log lines, accumulated across the attempt's polls.
    pub matched_lines: Vec<String>,
    /// Ports seen by the latest port probe.
    pub observed_ports: BTreeSet<u16>,
}

impl AttemptState {
    #[must_use]
    pub fn new(number: u32, now: DateTime<Utc>) -> Self {
        Self {
            number,
            started_at: now - chrono::Duration::seconds(LOG_LOOKBACK_SECS),
            passed_checks: 0,
            matched_lines: Vec::new(),
            observed_ports: BTreeSet::new(),
        }
    }

    /// Record a matched line once per attempt.
    pub fn record_match(&mut self, line: String) {
        if !self.matched_lines.contains(&line) {
            self.matched_lines.push(line);
        }
    }
}

// ── Result ────────────────────────────────────────────────────────────────────

/// Terminal output of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupervisorResult {
    /// The run took the unit from not running to running.
    pub changed: bool,
    pub passed_checks: u8,
    pub port_list: BTreeSet<u16>,
    pub matched_lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl SupervisorResult {
    /// Copy an attempt's progress into the result.
    pub fn absorb(&mut self, attempt: &AttemptState) {
        self.passed_checks = attempt.passed_checks;
        self.port_list.clone_from(&attempt.observed_ports);
        self.matched_lines.clone_from(&attempt.matched_lines);
    }
}
