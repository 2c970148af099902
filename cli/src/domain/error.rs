//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::launch::SupervisorResult;
use crate::domain::unit::ServiceStatus;

// ── Launch errors ─────────────────────────────────────────────────────────────

/// Errors raised while validating, resolving, starting or verifying a unit.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("service name must not be empty")]
    EmptyName,

    #[error(
        "This tool does not currently support using glob patterns, found [{pattern}] in [{unit}] service"
    )]
    GlobInName { unit: String, pattern: char },

    #[error("Invalid log expression '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid launch configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not find the requested service {0}: host")]
    UnitNotFound(String),

    #[error("Error loading unit file '{unit}': {load_error}")]
    Configuration { unit: String, load_error: String },

    #[error("Service is in unknown state")]
    UnknownState { status: Box<ServiceStatus> },

    #[error("Unable to {action} service {unit}: {stderr}")]
    SupervisorQuery {
        unit: String,
        action: &'static str,
        stderr: String,
    },

    #[error("Unable journalctl -t '{tag}': {stderr}")]
    LogQuery { tag: String, stderr: String },

    #[error("Unable to read listening sockets{}: {reason}", pid.map(|p| format!(" of pid {p}")).unwrap_or_default())]
    SocketQuery { pid: Option<u32>, reason: String },

    #[error("Unable to start service {unit}: {reason}")]
    StartFailed {
        unit: String,
        reason: String,
        status: Option<Box<ServiceStatus>>,
    },

    #[error("Unable to stop service {unit}: {stderr}")]
    StopFailed { unit: String, stderr: String },

    #[error(
        "Passed checks [{}] less than [{required}] required checks",
        result.passed_checks
    )]
    RescueExhausted {
        result: Box<SupervisorResult>,
        required: u8,
    },
}

impl LaunchError {
    /// Stable machine-readable code used in JSON error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::GlobInName { .. } | Self::InvalidPattern { .. } => {
                "validation"
            }
            Self::InvalidConfig(_) => "invalid_config",
            Self::UnitNotFound(_) => "unit_not_found",
            Self::Configuration { .. } => "unit_configuration",
            Self::UnknownState { .. } => "unknown_state",
            Self::SupervisorQuery { .. } => "supervisor_query",
            Self::LogQuery { .. } => "log_query",
            Self::SocketQuery { .. } => "socket_query",
            Self::StartFailed { .. } => "start_failed",
            Self::StopFailed { .. } => "stop_failed",
            Self::RescueExhausted { .. } => "rescue_exhausted",
        }
    }

    /// Observed service state attached to the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<&ServiceStatus> {
        match self {
            Self::UnknownState { status } => Some(status),
            Self::StartFailed { status, .. } => status.as_deref(),
            Self::RescueExhausted { result, .. } => result.status.as_ref(),
            _ => None,
        }
    }
}

// ── Job errors ────────────────────────────────────────────────────────────────

/// Errors on the job status / cleanup path.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid job id '{0}': must be non-empty and contain no path separators")]
    InvalidId(String),

    #[error("could not find job {job_id} ({})", path.display())]
    NotFound { job_id: String, path: PathBuf },

    #[error("Could not parse job output {}: {reason}", path.display())]
    RecordParse { path: PathBuf, reason: String },
}

impl JobError {
    /// Stable machine-readable code used in JSON error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "validation",
            Self::NotFound { .. } => "job_not_found",
            Self::RecordParse { .. } => "record_parse",
        }
    }
}
