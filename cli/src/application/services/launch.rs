//! Launch supervisor: start, verify, rescue.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;
use chrono::Utc;
use tokio::time::{Instant, sleep};

use crate::application::ports::{
    EventSink, LogSource, ProgressReporter, ServiceManager, SocketTable,
};
use crate::application::services::probe::{LogProbe, PortProbe};
use crate::application::services::unit::ServiceHandle;
use crate::domain::error::LaunchError;
use crate::domain::launch::{AttemptState, LaunchConfig, LaunchState, RunMode, SupervisorResult};
use crate::domain::unit::ServiceStatus;

/// The ports one launch run talks to.
pub struct Collaborators<'a, M, T, L, E, R> {
    pub services: &'a M,
    pub sockets: &'a T,
    pub logs: &'a L,
    pub events: &'a E,
    pub reporter: &'a R,
}

/// How an attempt's poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollOutcome {
    /// Required checks reached or time budget spent.
    Finished,
    /// The unit stopped being active mid-attempt.
    WentDown,
    /// Dry run found the unit not active.
    DryRunDown,
}

/// Drives one unit through `Idle -> Starting -> Polling` until it is healthy
/// or the start attempts run out.
pub struct LaunchSupervisor<'a, M, T, L, E, R>
where
    M: ServiceManager,
    T: SocketTable,
    L: LogSource,
    E: EventSink,
    R: ProgressReporter,
{
    config: &'a LaunchConfig,
    mode: RunMode,
    service: ServiceHandle<'a, M>,
    ports: PortProbe<'a, T>,
    logs: LogProbe<'a, L>,
    events: &'a E,
    reporter: &'a R,
}

impl<'a, M, T, L, E, R> LaunchSupervisor<'a, M, T, L, E, R>
where
    M: ServiceManager,
    T: SocketTable,
    L: LogSource,
    E: EventSink,
    R: ProgressReporter,
{
    #[must_use]
    pub fn new(
        config: &'a LaunchConfig,
        mode: RunMode,
        with: Collaborators<'a, M, T, L, E, R>,
    ) -> Self {
        Self {
            config,
            mode,
            service: ServiceHandle::new(with.services, &config.unit),
            ports: PortProbe::new(with.sockets),
            logs: LogProbe::new(with.logs),
            events: with.events,
            reporter: with.reporter,
        }
    }

    /// Run to a terminal state.
    ///
    /// A dry run that finds the unit down ends early with `changed = false`.
    ///
    /// # Errors
    ///
    /// - Validation and resolution errors before any start.
    /// - `LaunchError::StartFailed` if a live start does not bring the unit up.
    /// - Query errors from any probe, unretried.
    /// - `LaunchError::RescueExhausted` carrying the last attempt's progress.
    pub async fn run(self) -> Result<SupervisorResult> {
        self.config.validate()?;

        let unit = self.config.unit.as_str();
        let required = self.config.required_checks;
        let dry_run = self.mode.is_dry_run();

        self.reporter.step(&format!("resolving {unit}..."));
        let initial = self.service.resolve(self.reporter).await?;
        let running_before = initial.is_running();
        tracing::info!(unit, running_before, dry_run, "unit resolved");

        let mut result = SupervisorResult {
            status: Some(initial),
            ..SupervisorResult::default()
        };
        let mut attempt = AttemptState::new(0, Utc::now());
        let mut state = LaunchState::Idle;

        loop {
            tracing::debug!(unit, ?state, attempt = attempt.number, "launch state");
            state = match state {
                LaunchState::Idle | LaunchState::RescuePending => {
                    if attempt.number < self.config.max_rescues {
                        LaunchState::Starting
                    } else {
                        LaunchState::Failed
                    }
                }
                LaunchState::Starting => {
                    let number = attempt.number + 1;
                    let started_at = Utc::now();
                    self.start(number).await?;

                    let status = self.service.query().await?;
                    if !self.is_up(&status) {
                        if dry_run {
                            tracing::info!(unit, "not active in dry run, nothing to verify");
                            result.changed = false;
                            result.status = Some(status);
                            return Ok(result);
                        }
                        return Err(LaunchError::StartFailed {
                            unit: unit.to_string(),
                            reason: format!(
                                "service is {} after start",
                                status.active_state.as_deref().unwrap_or("unknown")
                            ),
                            status: Some(Box::new(status)),
                        }
                        .into());
                    }
                    result.status = Some(status);
                    attempt = AttemptState::new(number, started_at);
                    LaunchState::Polling
                }
                LaunchState::Polling => {
                    let outcome = self.poll(&mut attempt, &mut result).await?;
                    result.absorb(&attempt);
                    if outcome == PollOutcome::DryRunDown {
                        result.changed = false;
                        return Ok(result);
                    }
                    if attempt.passed_checks >= required {
                        LaunchState::Succeeded
                    } else {
                        self.rescue(&attempt, running_before).await?;
                        LaunchState::RescuePending
                    }
                }
                LaunchState::Succeeded => {
                    result.changed = !running_before;
                    self.reporter.success(&format!(
                        "{unit} passed [{}/{required}] checks",
                        result.passed_checks
                    ));
                    return Ok(result);
                }
                LaunchState::Failed => {
                    result.changed = false;
                    result.msg = Some(format!(
                        "Passed checks [{}] less than [{required}] required checks",
                        result.passed_checks
                    ));
                    tracing::warn!(unit, attempts = attempt.number, "rescues exhausted");
                    return Err(LaunchError::RescueExhausted {
                        result: Box::new(result),
                        required,
                    }
                    .into());
                }
            };
        }
    }

    /// A dry run only trusts a fully running unit. A live start has just
    /// returned, so a unit still `activating` counts as up.
    fn is_up(&self, status: &ServiceStatus) -> bool {
        if self.mode.is_dry_run() {
            status.is_running()
        } else {
            status.is_active()
        }
    }

    async fn start(&self, number: u32) -> Result<()> {
        let unit = self.config.unit.as_str();
        let max = self.config.max_rescues;
        self.events.emit(&format!(
            "retry [{number}/{max}] {} [{unit}] service",
            self.mode.verb()
        ));
        self.reporter
            .step(&format!("attempt {number}/{max}: {} {unit}", self.mode.verb()));
        if !self.mode.is_dry_run() {
            self.service.start().await?;
        }
        Ok(())
    }

    /// Poll until the required checks pass or `wait_timeout` elapses.
    async fn poll(
        &self,
        attempt: &mut AttemptState,
        result: &mut SupervisorResult,
    ) -> Result<PollOutcome> {
        let unit = self.config.unit.as_str();
        let required = self.config.required_checks;
        let budget = self.config.wait_timeout;
        let began = Instant::now();

        while attempt.passed_checks < required && began.elapsed() < budget {
            let status = self.service.query().await?;
            let up = self.is_up(&status);
            let pid = status.main_pid();
            result.status = Some(status);
            if !up {
                if self.mode.is_dry_run() {
                    return Ok(PollOutcome::DryRunDown);
                }
                tracing::warn!(unit, attempt = attempt.number, "service went down while polling");
                return Ok(PollOutcome::WentDown);
            }

            attempt.passed_checks = 0;
            let ports = self.ports.check(pid, &self.config.expected_ports)?;
            attempt.passed_checks += ports.passed;
            attempt.observed_ports = ports.observed;

            let logs = self
                .logs
                .check(unit, attempt.started_at, &self.config.log_pattern)
                .await?;
            attempt.passed_checks += logs.passed();
            for line in logs.lines {
                attempt.record_match(line);
            }

            let remain = budget.saturating_sub(began.elapsed());
            self.events.emit(&format!(
                "remain [{:.2}] seconds [{}/{required}] checks",
                remain.as_secs_f64(),
                attempt.passed_checks
            ));
            tracing::debug!(unit, passed = attempt.passed_checks, ?pid, "poll");

            if attempt.passed_checks >= required {
                break;
            }
            sleep(self.config.retry_delay).await;
        }
        Ok(PollOutcome::Finished)
    }

    /// Stop what this run started, then pause if another attempt follows.
    async fn rescue(&self, attempt: &AttemptState, running_before: bool) -> Result<()> {
        let unit = self.config.unit.as_str();
        let should_stop = !self.mode.is_dry_run() && !running_before;
        if should_stop {
            self.service.stop().await?;
        }
        let outcome = if self.mode.is_dry_run() {
            "check_mode"
        } else if should_stop {
            "stopped"
        } else {
            "left running"
        };
        let msg = format!(
            "not enough [{}/{}] checks, [{unit}] {outcome}",
            attempt.passed_checks, self.config.required_checks
        );
        self.events.emit(&msg);
        self.reporter.warn(&msg);

        if attempt.number < self.config.max_rescues {
            sleep(self.config.rescue_delay).await;
        }
        Ok(())
    }
}
