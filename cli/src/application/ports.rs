//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared types crate,
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Output;

use anyhow::Result;
use chrono::{DateTime, Utc};
use mega_launch_common::JobRecord;

use crate::domain::MegaLaunchConfig;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds the
    /// runner's timeout. A non-zero exit is *not* an error here.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
}

// ── Service Manager Port ──────────────────────────────────────────────────────

/// The process supervisor that owns the unit. Every call returns the raw
/// output so callers can apply their own exit-code policy.
#[allow(async_fn_in_trait)]
pub trait ServiceManager {
    /// Dump the unit's properties as `KEY=VALUE` lines.
    async fn show(&self, unit: &str) -> Result<Output>;
    async fn start(&self, unit: &str) -> Result<Output>;
    async fn stop(&self, unit: &str) -> Result<Output>;
    async fn is_active(&self, unit: &str) -> Result<Output>;
    async fn is_enabled(&self, unit: &str) -> Result<Output>;
    async fn list_unit_files(&self, pattern: &str) -> Result<Output>;
    /// Whether a legacy init script exists for the unit.
    fn has_init_script(&self, unit: &str) -> bool;
}

// ── Log Source Port ───────────────────────────────────────────────────────────

/// Line shape requested from the log source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Syslog-style prefix with local time.
    Short,
    /// Syslog-style prefix with ISO 8601 time.
    ShortIso,
    /// Message only.
    Cat,
}

/// One log query: all lines tagged `tag`, optionally since `since`.
#[derive(Debug, Clone, Copy)]
pub struct LogQuery<'a> {
    pub tag: &'a str,
    pub since: Option<DateTime<Utc>>,
    pub format: LogFormat,
}

/// External log store, queried by syslog identifier.
#[allow(async_fn_in_trait)]
pub trait LogSource {
    /// Lines in chronological order.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::LogQuery` if the source cannot be invoked or
    /// reports failure.
    async fn query(&self, query: &LogQuery<'_>) -> Result<Vec<String>>;
}

// ── Socket Table Port ─────────────────────────────────────────────────────────

/// Listening TCP sockets of the host or of one process.
#[cfg_attr(test, mockall::automock)]
pub trait SocketTable {
    /// Local ports in LISTEN state. `None` means host-wide. A process that
    /// does not exist has no listeners.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::SocketQuery` if the table cannot be read.
    fn listening_ports(&self, pid: Option<u32>) -> Result<BTreeSet<u16>>;
}

// ── Event Sink Port ───────────────────────────────────────────────────────────

/// Destination of launch progress events. Emitting never fails the run.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink {
    fn emit(&self, message: &str);
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Job Status Store Port ─────────────────────────────────────────────────────

/// Persisted job records, one per job id.
#[allow(async_fn_in_trait)]
pub trait JobStatusStore {
    /// Location of the record for `job_id` (whether or not it exists).
    fn path(&self, job_id: &str) -> PathBuf;
    /// Load a record; `None` if it does not exist or has no content yet.
    ///
    /// # Errors
    ///
    /// Returns `JobError::RecordParse` if the content is not a record.
    async fn read(&self, job_id: &str) -> Result<Option<JobRecord>>;
    /// Replace the record atomically.
    async fn write(&self, job_id: &str, record: &JobRecord) -> Result<()>;
    /// Delete the record and return its path.
    ///
    /// # Errors
    ///
    /// Returns `JobError::NotFound` if there is nothing to delete.
    async fn erase(&self, job_id: &str) -> Result<PathBuf>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading of the defaults file.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when absent.
    fn load(&self) -> Result<MegaLaunchConfig>;
    /// Path of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
