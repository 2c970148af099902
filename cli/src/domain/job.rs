//! Job status view: how a persisted record is presented to a poller.
//!
//! Pure functions only: reading and writing the record is done through the
//! `JobStatusStore` port.

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use mega_launch_common::JobRecord;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::error::JobError;

/// Reject ids that would escape the job directory.
///
/// # Errors
///
/// Returns `JobError::InvalidId` for empty ids, `.`/`..`, or ids containing
/// a path separator or NUL.
pub fn validate_job_id(job_id: &str) -> Result<(), JobError> {
    let bad = job_id.is_empty()
        || job_id == "."
        || job_id == ".."
        || job_id.contains(['/', '\\', '\0']);
    if bad {
        return Err(JobError::InvalidId(job_id.to_string()));
    }
    Ok(())
}

/// Format a watermark: unix seconds with sub-second precision.
#[must_use]
pub fn format_watermark(at: DateTime<Utc>) -> String {
    format!("{}.{:06}", at.timestamp(), at.timestamp_subsec_micros())
}

/// Parse a watermark written by `format_watermark` (or any decimal seconds).
#[must_use]
pub fn parse_watermark(raw: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = raw.trim().split_once('.').unwrap_or((raw.trim(), ""));
    let secs: i64 = secs.parse().ok()?;
    let nanos = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().take(9).collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let scale = 10u32.pow(9 - u32::try_from(digits.len()).ok()?);
        digits.parse::<u32>().ok()? * scale
    };
    Utc.timestamp_opt(secs, nanos).single()
}

/// What a status poll reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub job_id: String,
    pub started: bool,
    pub finished: bool,
    pub results_file: PathBuf,
    /// Launch progress lines logged since the previous poll.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_lines: Option<Vec<String>>,
    /// Opaque result fields of the record.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl StatusReport {
    /// Report for a job whose record has not been written yet.
    #[must_use]
    pub fn pending(job_id: &str, results_file: PathBuf) -> Self {
        Self {
            job_id: job_id.to_string(),
            started: true,
            finished: false,
            results_file,
            warning_lines: None,
            payload: Map::new(),
        }
    }

    /// Shape a read record into a report.
    ///
    /// A record without `started` comes from a foreign writer and is treated
    /// as finished, without diagnostic lines. A record without `finished` is
    /// still running.
    #[must_use]
    pub fn from_record(
        job_id: &str,
        results_file: PathBuf,
        record: &JobRecord,
        warning_lines: Vec<String>,
    ) -> Self {
        let (started, finished, warning_lines) = match (record.started, record.finished) {
            (None, _) => (true, true, None),
            (Some(started), finished) => (started, finished.unwrap_or(false), Some(warning_lines)),
        };
        Self {
            job_id: job_id.to_string(),
            started,
            finished,
            results_file,
            warning_lines,
            payload: record.extra.clone(),
        }
    }
}

/// What a cleanup reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub job_id: String,
    pub erased: PathBuf,
}
