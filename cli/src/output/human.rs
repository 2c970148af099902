//! Human-readable terminal renderer.

use std::collections::BTreeSet;

use crate::application::services::check::CheckReport;
use crate::domain::{CleanupReport, StatusReport, SupervisorResult};
use crate::output::OutputContext;

fn port_list(ports: &BTreeSet<u16>) -> String {
    if ports.is_empty() {
        return "none".to_string();
    }
    ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Renders results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render a finished (or partially finished) launch.
    pub fn render_launch(&self, unit: &str, required: u8, result: &SupervisorResult) {
        if self.ctx.quiet {
            return;
        }
        let styles = &self.ctx.styles;
        self.ctx.header(unit);
        self.ctx.kv("Changed:", yes_no(result.changed));
        self.ctx.kv_styled(
            "Checks:",
            &format!("{}/{required}", result.passed_checks),
            styles.checks(result.passed_checks, required),
        );
        self.ctx.kv("Ports:", &port_list(&result.port_list));
        if let Some(status) = &result.status {
            let active = status.active_state.as_deref().unwrap_or("unknown");
            self.ctx.kv_styled(
                "State:",
                &format!(
                    "{active}/{}",
                    status.sub_state.as_deref().unwrap_or("unknown")
                ),
                styles.active_state(active),
            );
        }
        for line in &result.matched_lines {
            self.ctx.kv("Matched:", line);
        }
    }

    pub fn render_check(&self, unit: &str, report: &CheckReport) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.header(unit);
        self.ctx.kv("Checks:", &report.passed_checks.to_string());
        self.ctx.kv("Ports:", &port_list(&report.ports));
        for line in &report.matched_lines {
            self.ctx.kv("Matched:", line);
        }
    }

    pub fn render_status(&self, report: &StatusReport) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.kv("Job:", &report.job_id);
        self.ctx.kv("Started:", yes_no(report.started));
        self.ctx.kv("Finished:", yes_no(report.finished));
        self.ctx
            .kv("Results:", &report.results_file.display().to_string());
        for line in report.warning_lines.iter().flatten() {
            self.ctx.kv("Progress:", line);
        }
    }

    pub fn render_cleanup(&self, report: &CleanupReport) {
        self.ctx
            .success(&format!("erased {}", report.erased.display()));
    }
}
