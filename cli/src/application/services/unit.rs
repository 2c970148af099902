//! Service handle: unit resolution, status queries, start and stop.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::{ProgressReporter, ServiceManager};
use crate::domain::error::LaunchError;
use crate::domain::unit::{
    KNOWN_ENABLED_STATES, ServiceStatus, ShowOutcome, UnitPresence, classify_show, parse_show,
    unit_search_prefix,
};

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// One unit as seen through a `ServiceManager`.
pub struct ServiceHandle<'a, M: ServiceManager> {
    manager: &'a M,
    unit: &'a str,
}

impl<'a, M: ServiceManager> ServiceHandle<'a, M> {
    #[must_use]
    pub fn new(manager: &'a M, unit: &'a str) -> Self {
        Self { manager, unit }
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        self.unit
    }

    /// Establish that the unit exists and return its initial status.
    ///
    /// The manager's answer to `show` selects the follow-up probes (see
    /// [`ShowOutcome`]). A unit known only as a legacy init script produces a
    /// warning, not an error.
    ///
    /// # Errors
    ///
    /// - `LaunchError::Configuration` if the unit file failed to load
    ///   (including masked units).
    /// - `LaunchError::UnitNotFound` if neither the manager nor an init
    ///   script knows the unit.
    /// - `LaunchError::UnknownState` if the status carries no `ActiveState`.
    pub async fn resolve(&self, reporter: &impl ProgressReporter) -> Result<ServiceStatus> {
        let show = self
            .manager
            .show(self.unit)
            .await
            .with_context(|| format!("querying unit {}", self.unit))?;
        let stdout = stdout_of(&show);
        let stderr = stderr_of(&show);

        let outcome = classify_show(show.status.code(), &stdout, &stderr);
        tracing::debug!(unit = self.unit, ?outcome, "show classified");

        let (status, managed) = match outcome {
            ShowOutcome::Dump => {
                let status = parse_show(&stdout);
                let managed = status.is_loaded();
                if managed && let Some(load_error) = status.load_error() {
                    return Err(LaunchError::Configuration {
                        unit: self.unit.to_string(),
                        load_error: load_error.to_string(),
                    }
                    .into());
                }
                (status, managed)
            }
            ShowOutcome::BusError => {
                let mut status = parse_show(&stdout);
                let prefix = unit_search_prefix(self.unit);
                let files = self
                    .manager
                    .list_unit_files(&format!("{prefix}*"))
                    .await
                    .context("listing unit files")?;
                let managed = stdout_of(&files).contains(&prefix);
                let active = self
                    .manager
                    .is_active(self.unit)
                    .await
                    .context("querying active state")?;
                status.active_state = Some(stdout_of(&active).trim_end_matches('\n').to_string());
                (status, managed)
            }
            ShowOutcome::Unresolved => (ServiceStatus::default(), self.known_unit_file().await?),
        };

        let presence = UnitPresence {
            managed,
            init_script: self.manager.has_init_script(self.unit),
        };
        if presence.legacy_only() {
            let msg = format!(
                "The service ({}) is actually an init script but the system is managed by systemd",
                self.unit
            );
            tracing::warn!(unit = self.unit, "legacy init script");
            reporter.warn(&msg);
        }
        if !presence.found() {
            return Err(LaunchError::UnitNotFound(self.unit.to_string()).into());
        }
        if status.active_state.is_none() {
            return Err(LaunchError::UnknownState {
                status: Box::new(status),
            }
            .into());
        }
        Ok(status)
    }

    /// `is-enabled` then `list-unit-files`: does the manager have a file for it?
    async fn known_unit_file(&self) -> Result<bool> {
        let enabled = self
            .manager
            .is_enabled(self.unit)
            .await
            .context("querying enabled state")?;
        if KNOWN_ENABLED_STATES.contains(&stdout_of(&enabled).trim()) {
            return Ok(true);
        }
        let files = self
            .manager
            .list_unit_files(self.unit)
            .await
            .context("listing unit files")?;
        Ok(files.status.success())
    }

    /// Current status.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::SupervisorQuery` if the manager reports failure.
    pub async fn query(&self) -> Result<ServiceStatus> {
        let output = self
            .manager
            .show(self.unit)
            .await
            .with_context(|| format!("querying unit {}", self.unit))?;
        if !output.status.success() {
            return Err(LaunchError::SupervisorQuery {
                unit: self.unit.to_string(),
                action: "check",
                stderr: stderr_of(&output),
            }
            .into());
        }
        Ok(parse_show(&stdout_of(&output)))
    }

    /// # Errors
    ///
    /// Returns `LaunchError::StartFailed` if the manager refuses the start.
    pub async fn start(&self) -> Result<()> {
        let output = self
            .manager
            .start(self.unit)
            .await
            .with_context(|| format!("starting unit {}", self.unit))?;
        if !output.status.success() {
            return Err(LaunchError::StartFailed {
                unit: self.unit.to_string(),
                reason: stderr_of(&output),
                status: None,
            }
            .into());
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `LaunchError::StopFailed` if the manager refuses the stop.
    pub async fn stop(&self) -> Result<()> {
        let output = self
            .manager
            .stop(self.unit)
            .await
            .with_context(|| format!("stopping unit {}", self.unit))?;
        if !output.status.success() {
            return Err(LaunchError::StopFailed {
                unit: self.unit.to_string(),
                stderr: stderr_of(&output),
            }
            .into());
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates `query` errors.
    pub async fn is_running(&self) -> Result<bool> {
        Ok(self.query().await?.is_running())
    }
}
