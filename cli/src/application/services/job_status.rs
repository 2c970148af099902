//! Job status / cleanup use-cases and the launch job's record lifecycle.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use mega_launch_common::{JobRecord, syslog_tag};
use serde_json::{Map, Value};

use crate::application::ports::{JobStatusStore, LogSource};
use crate::application::services::probe::LogProbe;
use crate::domain::job::{
    CleanupReport, StatusReport, format_watermark, parse_watermark, validate_job_id,
};

/// Which launch run a status poll is about.
#[derive(Debug, Clone)]
pub struct StatusQuery<'a> {
    pub job_id: &'a str,
    pub unit: &'a str,
    pub epoch: Option<&'a str>,
}

/// Report on a job and advance its log watermark.
///
/// A job without a record yet is reported as started and not finished. For
/// an existing record, the launch progress lines logged since the previous
/// poll are returned and the watermark is moved to `now`.
///
/// # Errors
///
/// - `JobError::InvalidId` for an unusable job id.
/// - `JobError::RecordParse` if the record is not valid JSON.
/// - Log-source and store write failures.
pub async fn job_status(
    store: &impl JobStatusStore,
    logs: &impl LogSource,
    query: &StatusQuery<'_>,
    now: DateTime<Utc>,
) -> Result<StatusReport> {
    validate_job_id(query.job_id)?;
    let path = store.path(query.job_id);

    let Some(record) = store.read(query.job_id).await? else {
        tracing::debug!(job_id = query.job_id, "no record yet");
        return Ok(StatusReport::pending(query.job_id, path));
    };

    let since = record.recent.as_deref().and_then(parse_watermark);
    tracing::debug!(job_id = query.job_id, recent = ?record.recent, "previous watermark");

    let tag = syslog_tag(query.unit, query.epoch);
    let lines = LogProbe::new(logs).tail(&tag, since).await?;

    // The launch job may have finished while the journal was read; patch the
    // watermark onto its latest record.
    let Some(mut latest) = store.read(query.job_id).await? else {
        tracing::debug!(job_id = query.job_id, "record erased during poll");
        return Ok(StatusReport::from_record(query.job_id, path, &record, lines));
    };
    latest.recent = Some(format_watermark(now));
    store.write(query.job_id, &latest).await?;

    Ok(StatusReport::from_record(query.job_id, path, &latest, lines))
}

/// Delete a job's record.
///
/// # Errors
///
/// Returns `JobError::InvalidId` or `JobError::NotFound`.
pub async fn cleanup_job(store: &impl JobStatusStore, job_id: &str) -> Result<CleanupReport> {
    validate_job_id(job_id)?;
    let erased = store.erase(job_id).await?;
    tracing::info!(job_id, path = %erased.display(), "job record erased");
    Ok(CleanupReport {
        job_id: job_id.to_string(),
        erased,
    })
}

/// Mark a job as running before its first attempt.
///
/// # Errors
///
/// Returns `JobError::InvalidId` or store failures.
pub async fn record_started(store: &impl JobStatusStore, job_id: &str) -> Result<()> {
    validate_job_id(job_id)?;
    store.write(job_id, &JobRecord::running()).await
}

/// Merge a terminal result into the job's record, keeping its watermark.
///
/// # Errors
///
/// Returns store failures. An unreadable record is replaced.
pub async fn record_finished(
    store: &impl JobStatusStore,
    job_id: &str,
    result: Map<String, Value>,
) -> Result<()> {
    validate_job_id(job_id)?;
    let mut record = match store.read(job_id).await {
        Ok(Some(record)) => record,
        Ok(None) => JobRecord::default(),
        Err(e) => {
            tracing::warn!(job_id, error = %e, "replacing unreadable job record");
            JobRecord::default()
        }
    };
    record.finish(result);
    store.write(job_id, &record).await
}
