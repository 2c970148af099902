//! `journalctl` adapter for the `LogSource` port.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::application::ports::{CommandRunner, LogFormat, LogQuery, LogSource};
use crate::domain::error::LaunchError;

const JOURNALCTL: &str = "journalctl";

fn output_mode(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Short => "short",
        LogFormat::ShortIso => "short-iso",
        LogFormat::Cat => "cat",
    }
}

/// `--since` argument with millisecond precision.
fn since_arg(at: DateTime<Utc>) -> String {
    format!("@{}.{:03}", at.timestamp(), at.timestamp_subsec_millis())
}

/// Argument vector of one query.
#[must_use]
pub fn query_args(query: &LogQuery<'_>) -> Vec<String> {
    let mut args = vec![
        "--no-pager".to_string(),
        "--quiet".to_string(),
        "-t".to_string(),
        query.tag.to_string(),
    ];
    if let Some(since) = query.since {
        args.push("-S".to_string());
        args.push(since_arg(since));
    }
    args.push("-o".to_string());
    args.push(output_mode(query.format).to_string());
    args
}

/// `LogSource` backed by the systemd journal.
pub struct Journalctl<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> Journalctl<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> LogSource for Journalctl<R> {
    async fn query(&self, query: &LogQuery<'_>) -> Result<Vec<String>> {
        let args = query_args(query);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run(JOURNALCTL, &argv)
            .await
            .with_context(|| format!("journalctl -t {}", query.tag))?;
        if !output.status.success() {
            return Err(LaunchError::LogQuery {
                tag: query.tag.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.lines().map(str::to_string).collect())
    }
}
