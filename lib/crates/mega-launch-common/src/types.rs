use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which service-manager instance a unit is addressed through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    System,
    User,
    Global,
}

impl Scope {
    /// Extra `systemctl` flag selecting this scope, if any.
    #[must_use]
    pub fn systemctl_flag(self) -> Option<&'static str> {
        match self {
            Scope::System => None,
            Scope::User => Some("--user"),
            Scope::Global => Some("--global"),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::System => "system",
            Scope::User => "user",
            Scope::Global => "global",
        })
    }
}

#[derive(Debug, Error)]
#[error("unknown scope '{0}': expected system, user or global")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Scope::System),
            "user" => Ok(Scope::User),
            "global" => Ok(Scope::Global),
            other => Err(UnknownScope(other.to_string())),
        }
    }
}

/// Syslog identifier used for a launch run's progress events.
///
/// The status path queries the journal by this tag, so both sides must build
/// it the same way: `mega-launch-<unit>` with an optional `-<epoch>` suffix.
#[must_use]
pub fn syslog_tag(unit: &str, epoch: Option<&str>) -> String {
    match epoch {
        Some(e) => format!("mega-launch-{unit}-{e}"),
        None => format!("mega-launch-{unit}"),
    }
}
