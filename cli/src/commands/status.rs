//! `mega-launch status`: poll or clean up a launch job.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, ValueEnum};

use crate::app::AppContext;
use crate::application::services::job_status::{StatusQuery, cleanup_job, job_status};
use crate::output::json;

/// What to do with the job record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusMode {
    /// Report progress and advance the log watermark
    #[default]
    Status,
    /// Delete the record
    Cleanup,
}

/// Arguments for the status command.
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Job id given to `launch --job-id`
    #[arg(long)]
    pub jid: String,

    /// Unit the job launched
    #[arg(long, visible_aliases = ["unit", "service", "service-name"])]
    pub name: String,

    #[arg(long, value_enum, default_value_t = StatusMode::Status)]
    pub mode: StatusMode,

    /// Epoch suffix the job was launched with
    #[arg(long)]
    pub epoch: Option<String>,

    /// Directory of job records
    #[arg(long, env = "MEGA_LAUNCH_ASYNC_DIR")]
    pub async_dir: Option<PathBuf>,
}

/// Run `mega-launch status`.
///
/// # Errors
///
/// Returns invalid-id, parse, not-found and log-query errors.
pub async fn run(args: &StatusArgs, app: &AppContext) -> Result<()> {
    let store = app.job_store(args.async_dir.as_deref())?;
    match args.mode {
        StatusMode::Cleanup => {
            let report = cleanup_job(&store, &args.jid).await?;
            if app.is_json() {
                json::print(&report)?;
            } else {
                app.human().render_cleanup(&report);
            }
        }
        StatusMode::Status => {
            let query = StatusQuery {
                job_id: &args.jid,
                unit: &args.name,
                epoch: args.epoch.as_deref(),
            };
            let report = job_status(&store, &app.journal(), &query, Utc::now()).await?;
            if app.is_json() {
                json::print(&report)?;
            } else {
                app.human().render_status(&report);
            }
        }
    }
    Ok(())
}
