//! Unit domain types: name validation, `show` dump parsing and the
//! unit-existence decision table.
//!
//! This module is intentionally free of I/O, async, and external layer imports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::LaunchError;

/// Characters the service manager would treat as a glob.
pub const GLOB_CHARS: [char; 3] = ['*', '?', '['];

/// stderr marker of a `show` call that failed at the bus protocol level.
pub const BUS_PARSE_ERROR: &str = "Failed to parse bus message";

/// `is-enabled` answers that prove the manager knows the unit.
pub const KNOWN_ENABLED_STATES: &[&str] = &[
    "enabled",
    "enabled-runtime",
    "linked",
    "linked-runtime",
    "masked",
    "masked-runtime",
    "static",
    "indirect",
    "disabled",
    "generated",
    "transient",
];

/// Reject empty names and names containing glob metacharacters.
///
/// # Errors
///
/// Returns `LaunchError::EmptyName` or `LaunchError::GlobInName`.
pub fn validate_unit_name(unit: &str) -> Result<(), LaunchError> {
    if unit.trim().is_empty() {
        return Err(LaunchError::EmptyName);
    }
    if let Some(pattern) = GLOB_CHARS.into_iter().find(|c| unit.contains(*c)) {
        return Err(LaunchError::GlobInName {
            unit: unit.to_string(),
            pattern,
        });
    }
    Ok(())
}

/// Prefix used to look a unit up in `list-unit-files`: `foo@` for a template
/// instance `foo@bar`, the name itself otherwise.
#[must_use]
pub fn unit_search_prefix(unit: &str) -> String {
    match unit.split_once('@') {
        Some((base, _)) => format!("{base}@"),
        None => unit.to_string(),
    }
}

/// Manager output that carries no key=value data and says the request was ignored.
#[must_use]
pub fn request_was_ignored(out: &str) -> bool {
    !out.contains('=') && (out.contains("ignoring request") || out.contains("ignoring command"))
}

// ── Service status ────────────────────────────────────────────────────────────

/// Typed view of a `show` dump. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(rename = "LoadState", default, skip_serializing_if = "Option::is_none")]
    pub load_state: Option<String>,
    #[serde(rename = "ActiveState", default, skip_serializing_if = "Option::is_none")]
    pub active_state: Option<String>,
    #[serde(rename = "SubState", default, skip_serializing_if = "Option::is_none")]
    pub sub_state: Option<String>,
    #[serde(rename = "MainPID", default, skip_serializing_if = "Option::is_none")]
    pub main_pid: Option<String>,
    #[serde(rename = "LoadError", default, skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ServiceStatus {
    /// Build a status from raw key/value pairs, lifting the known keys.
    #[must_use]
    pub fn from_fields(mut fields: BTreeMap<String, String>) -> Self {
        Self {
            load_state: fields.remove("LoadState"),
            active_state: fields.remove("ActiveState"),
            sub_state: fields.remove("SubState"),
            main_pid: fields.remove("MainPID"),
            load_error: fields.remove("LoadError"),
            extra: fields,
        }
    }

    /// Main process id, if the manager reports a positive one.
    #[must_use]
    pub fn main_pid(&self) -> Option<u32> {
        self.main_pid
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
    }

    /// Fully up: `active/running` with a live main process.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sub_state.as_deref() == Some("running")
            && self.active_state.as_deref() == Some("active")
            && self.main_pid().is_some()
    }

    /// Active or on its way there.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.active_state.as_deref(), Some("active" | "activating"))
    }

    /// The manager has a unit file for this name.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.load_state.as_deref().is_some_and(|s| s != "not-found")
    }

    #[must_use]
    pub fn is_masked(&self) -> bool {
        self.load_state.as_deref() == Some("masked")
    }

    /// Non-empty load error reported by the manager.
    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// Parse a `show` dump: newline-separated `KEY=VALUE` pairs.
///
/// `Exec*` values opening with `{` and not closed on the same line continue
/// until a line ending in `}`.
#[must_use]
pub fn parse_show(text: &str) -> ServiceStatus {
    let mut fields = BTreeMap::new();
    let mut pending: Option<(String, Vec<String>)> = None;

    for line in text.lines() {
        if let Some((key, mut parts)) = pending.take() {
            parts.push(line.to_string());
            if line.trim_end().ends_with('}') {
                fields.insert(key, parts.join("\n").trim().to_string());
            } else {
                pending = Some((key, parts));
            }
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.starts_with("Exec")
            && value.trim_start().starts_with('{')
            && !value.trim_end().ends_with('}')
        {
            pending = Some((key.to_string(), vec![value.to_string()]));
            continue;
        }
        fields.insert(key.to_string(), value.trim().to_string());
    }

    // An unterminated value still carries information.
    if let Some((key, parts)) = pending {
        fields.insert(key, parts.join("\n").trim().to_string());
    }

    ServiceStatus::from_fields(fields)
}

// ── Unit-existence decision table ─────────────────────────────────────────────

/// How a `show` call answered, which decides the follow-up probes.
///
/// | exit code | output                          | outcome      | follow-up                      |
/// |-----------|---------------------------------|--------------|--------------------------------|
/// | 0         | not "ignoring request"          | `Dump`       | parse the dump                 |
/// | 1         | stderr has bus parse failure    | `BusError`   | `list-unit-files`, `is-active` |
/// | other     | anything                        | `Unresolved` | `is-enabled`, `list-unit-files`|
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    Dump,
    BusError,
    Unresolved,
}

#[must_use]
pub fn classify_show(code: Option<i32>, stdout: &str, stderr: &str) -> ShowOutcome {
    match code {
        Some(0) if !request_was_ignored(stdout) && !request_was_ignored(stderr) => {
            ShowOutcome::Dump
        }
        Some(1) if stderr.contains(BUS_PARSE_ERROR) => ShowOutcome::BusError,
        _ => ShowOutcome::Unresolved,
    }
}

/// Where a unit is known from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitPresence {
    /// Known to the modern service manager.
    pub managed: bool,
    /// A legacy init script exists for it.
    pub init_script: bool,
}

impl UnitPresence {
    #[must_use]
    pub fn found(self) -> bool {
        self.managed || self.init_script
    }

    /// Known only as an init script the manager does not own.
    #[must_use]
    pub fn legacy_only(self) -> bool {
        self.init_script && !self.managed
    }
}
