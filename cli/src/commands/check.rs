//! `mega-launch check`: probe a running unit once.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use clap::Args;

use crate::app::AppContext;
use crate::application::services::check::{CheckRequest, check_service};
use crate::domain::LogPattern;
use crate::infra::sockets::ProcSocketTable;
use crate::output::json;

/// Arguments for the check command.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Unit whose logs are read
    #[arg(long, visible_aliases = ["unit", "service", "service-name"])]
    pub name: String,

    /// Main process id; omit or 0 to look at every listener on the host
    #[arg(long)]
    pub main_pid: Option<u32>,

    /// Port the unit must listen on (repeatable or comma-separated)
    #[arg(
        long = "port",
        visible_aliases = ["port-list", "ports"],
        value_delimiter = ','
    )]
    pub ports: Vec<u16>,

    /// Read logs from one second before this unix time (default: now)
    #[arg(long)]
    pub log_epoch: Option<i64>,

    /// Expression a log line must match from its start
    #[arg(long, visible_alias = "log-expression")]
    pub log_regexp: Option<String>,
}

impl CheckArgs {
    /// # Errors
    ///
    /// Returns an error for an out-of-range epoch or a bad expression.
    pub fn to_request(&self, now: DateTime<Utc>) -> Result<CheckRequest> {
        let log_epoch = match self.log_epoch {
            Some(secs) => Utc
                .timestamp_opt(secs, 0)
                .single()
                .with_context(|| format!("log epoch {secs} is out of range"))?,
            None => now,
        };
        let log_pattern = self
            .log_regexp
            .as_deref()
            .map(LogPattern::new)
            .transpose()?;
        Ok(CheckRequest {
            unit: self.name.clone(),
            main_pid: self.main_pid,
            expected_ports: self.ports.iter().copied().collect(),
            log_epoch,
            log_pattern,
        })
    }
}

/// Run `mega-launch check`.
///
/// # Errors
///
/// Returns validation and probe errors.
pub async fn run(args: &CheckArgs, app: &AppContext) -> Result<()> {
    let request = args.to_request(Utc::now())?;
    let report = check_service(&ProcSocketTable::new(), &app.journal(), &request).await?;
    if app.is_json() {
        json::print(&report)?;
    } else {
        app.human().render_check(&request.unit, &report);
    }
    Ok(())
}
