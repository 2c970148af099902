//! `mega-launch launch`: start a unit and hold it to its health checks.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use mega_launch_common::{Scope, syslog_tag};
use serde_json::{Map, Value};

use crate::app::AppContext;
use crate::application::services::job_status::{record_finished, record_started};
use crate::application::services::launch::{Collaborators, LaunchSupervisor};
use crate::domain::config::LaunchDefaults;
use crate::domain::{LaunchConfig, LaunchError, LogPattern, RunMode, SupervisorResult};
use crate::infra::job_store::FileJobStore;
use crate::infra::sockets::ProcSocketTable;
use crate::infra::syslog::SyslogSink;
use crate::output::json;

/// Arguments for the launch command.
#[derive(Args, Debug, Default)]
pub struct LaunchArgs {
    /// Unit to start
    #[arg(long, visible_aliases = ["unit", "service", "service-name"])]
    pub name: String,

    /// Seconds each start attempt may spend polling
    #[arg(long)]
    pub wait_timeout: Option<u64>,

    /// Maximum number of start attempts
    #[arg(long)]
    pub max_rescues: Option<u32>,

    /// Seconds to wait after a failed attempt
    #[arg(long)]
    pub rescue_delay: Option<u64>,

    /// Seconds between polls
    #[arg(long)]
    pub retry_delay: Option<u64>,

    /// Port the unit must listen on (repeatable or comma-separated)
    #[arg(long = "port", visible_alias = "port-list", value_delimiter = ',')]
    pub ports: Vec<u16>,

    /// Expression a log line must match from its start
    #[arg(long, visible_alias = "log-expression")]
    pub log_regexp: Option<String>,

    /// Checks (0-2) that must pass in one poll
    #[arg(long)]
    pub required_checks: Option<u8>,

    /// Service manager instance
    #[arg(long, value_enum)]
    pub scope: Option<Scope>,

    /// Suffix for the progress event tag
    #[arg(long)]
    pub epoch: Option<String>,

    /// Probe only; never start or stop the unit
    #[arg(long)]
    pub check: bool,

    /// Record progress and result under this job id
    #[arg(long)]
    pub job_id: Option<String>,

    /// Directory of job records
    #[arg(long, env = "MEGA_LAUNCH_ASYNC_DIR")]
    pub async_dir: Option<PathBuf>,
}

impl LaunchArgs {
    /// Merge flags over the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns a `LaunchError` if the result fails validation.
    pub fn to_config(&self, defaults: &LaunchDefaults) -> Result<LaunchConfig, LaunchError> {
        let mut config = LaunchConfig::new(&self.name);
        config.wait_timeout =
            Duration::from_secs(self.wait_timeout.unwrap_or(defaults.wait_timeout));
        config.max_rescues = self.max_rescues.unwrap_or(defaults.max_rescues);
        config.rescue_delay =
            Duration::from_secs(self.rescue_delay.unwrap_or(defaults.rescue_delay));
        config.retry_delay = Duration::from_secs(self.retry_delay.unwrap_or(defaults.retry_delay));
        config.expected_ports = self.ports.iter().copied().collect::<BTreeSet<u16>>();
        config.log_pattern = match self.log_regexp.as_deref() {
            Some(pattern) => LogPattern::new(pattern)?,
            None => LogPattern::any(),
        };
        config.required_checks = self.required_checks.unwrap_or(defaults.required_checks);
        config.scope = self.scope.unwrap_or(defaults.scope);
        config.epoch.clone_from(&self.epoch);
        config.validate()?;
        Ok(config)
    }

    fn mode(&self) -> RunMode {
        if self.check {
            RunMode::DryRun
        } else {
            RunMode::Live
        }
    }
}

/// Result fields stored in the job record.
fn job_result(outcome: &Result<SupervisorResult>) -> Result<Map<String, Value>> {
    let (result, failure) = match outcome {
        Ok(result) => (Some(result), None),
        Err(err) => match err.downcast_ref::<LaunchError>() {
            Some(LaunchError::RescueExhausted { result, .. }) => {
                (Some(result.as_ref()), Some(format!("{err:#}")))
            }
            _ => (None, Some(format!("{err:#}"))),
        },
    };
    let mut map = match result {
        Some(result) => match serde_json::to_value(result).context("serializing launch result")? {
            Value::Object(map) => map,
            _ => Map::new(),
        },
        None => Map::new(),
    };
    if let Some(msg) = failure {
        map.insert("failed".to_string(), Value::Bool(true));
        map.insert("msg".to_string(), Value::String(msg));
    }
    Ok(map)
}

/// Run `mega-launch launch`.
///
/// # Errors
///
/// Returns validation, resolution, start, probe and rescue-exhausted errors.
pub async fn run(args: &LaunchArgs, app: &AppContext) -> Result<()> {
    let config = args.to_config(&app.config.launch)?;
    let mode = args.mode();

    let store: Option<FileJobStore> = match &args.job_id {
        Some(_) => Some(app.job_store(args.async_dir.as_deref())?),
        None => None,
    };
    if let (Some(store), Some(job_id)) = (&store, &args.job_id) {
        record_started(store, job_id).await?;
    }

    let services = app.service_manager(config.scope);
    let logs = app.journal();
    let sockets = ProcSocketTable::new();
    let reporter = app.terminal_reporter();

    let outcome = {
        let events = SyslogSink::open(syslog_tag(&config.unit, config.epoch.as_deref()));
        LaunchSupervisor::new(
            &config,
            mode,
            Collaborators {
                services: &services,
                sockets: &sockets,
                logs: &logs,
                events: &events,
                reporter: &reporter,
            },
        )
        .run()
        .await
    };

    if let (Some(store), Some(job_id)) = (&store, &args.job_id) {
        record_finished(store, job_id, job_result(&outcome)?).await?;
    }

    match outcome {
        Ok(result) => {
            if app.is_json() {
                json::print(&result)?;
            } else {
                app.human()
                    .render_launch(&config.unit, config.required_checks, &result);
            }
            Ok(())
        }
        Err(err) => {
            if !app.is_json()
                && let Some(LaunchError::RescueExhausted { result, .. }) =
                    err.downcast_ref::<LaunchError>()
            {
                app.human()
                    .render_launch(&config.unit, config.required_checks, result);
            }
            Err(err)
        }
    }
}
