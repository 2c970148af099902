//! Health probes over the socket table and the log source.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::application::ports::{LogFormat, LogQuery, LogSource, SocketTable};
use crate::domain::probe::{LogCheck, LogPattern, PortCheck, evaluate_ports};

/// Listening-port probe.
pub struct PortProbe<'a, T: SocketTable> {
    table: &'a T,
}

impl<'a, T: SocketTable> PortProbe<'a, T> {
    #[must_use]
    pub fn new(table: &'a T) -> Self {
        Self { table }
    }

    /// One snapshot of the socket table, judged against `expected`.
    ///
    /// A zero pid is treated as unknown.
    ///
    /// # Errors
    ///
    /// Propagates socket-table failures.
    pub fn check(&self, pid: Option<u32>, expected: &BTreeSet<u16>) -> Result<PortCheck> {
        let pid = pid.filter(|p| *p > 0);
        let observed = self.table.listening_ports(pid)?;
        tracing::debug!(?pid, ?observed, "listening ports");
        Ok(evaluate_ports(pid, expected, observed))
    }
}

/// Log-line probe.
pub struct LogProbe<'a, L: LogSource> {
    source: &'a L,
}

impl<'a, L: LogSource> LogProbe<'a, L> {
    #[must_use]
    pub fn new(source: &'a L) -> Self {
        Self { source }
    }

    /// Lines tagged `unit` since `since`, up to and including the first that
    /// matches `pattern`.
    ///
    /// # Errors
    ///
    /// Propagates log-source failures.
    pub async fn check(
        &self,
        unit: &str,
        since: DateTime<Utc>,
        pattern: &LogPattern,
    ) -> Result<LogCheck> {
        let lines = self
            .source
            .query(&LogQuery {
                tag: unit,
                since: Some(since),
                format: LogFormat::ShortIso,
            })
            .await?;
        Ok(match pattern.first_match(lines.iter().map(String::as_str)) {
            Some(line) => LogCheck {
                matched: true,
                lines: vec![line.to_string()],
            },
            None => LogCheck::default(),
        })
    }

    /// Every line tagged `unit` since `since` that matches `pattern`.
    ///
    /// # Errors
    ///
    /// Propagates log-source failures.
    pub async fn check_all(
        &self,
        unit: &str,
        since: DateTime<Utc>,
        pattern: &LogPattern,
    ) -> Result<LogCheck> {
        let lines: Vec<String> = self
            .source
            .query(&LogQuery {
                tag: unit,
                since: Some(since),
                format: LogFormat::Short,
            })
            .await?
            .into_iter()
            .filter(|l| pattern.is_match(l))
            .collect();
        Ok(LogCheck {
            matched: !lines.is_empty(),
            lines,
        })
    }

    /// Non-empty message lines tagged `tag`, unfiltered.
    ///
    /// # Errors
    ///
    /// Propagates log-source failures.
    pub async fn tail(&self, tag: &str, since: Option<DateTime<Utc>>) -> Result<Vec<String>> {
        let lines = self
            .source
            .query(&LogQuery {
                tag,
                since,
                format: LogFormat::Cat,
            })
            .await?;
        Ok(lines.into_iter().filter(|l| !l.is_empty()).collect())
    }
}
