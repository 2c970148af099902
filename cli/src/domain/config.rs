//! Domain types for the defaults file.
//!
//! Pure types only: no I/O, no async, no filesystem access.

use std::path::PathBuf;

use mega_launch_common::Scope;
use serde::{Deserialize, Serialize};

use crate::domain::error::LaunchError;
use crate::domain::launch::{
    DEFAULT_MAX_RESCUES, DEFAULT_REQUIRED_CHECKS, DEFAULT_RESCUE_DELAY_SECS,
    DEFAULT_RETRY_DELAY_SECS, DEFAULT_WAIT_TIMEOUT_SECS, MAX_REQUIRED_CHECKS,
};

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.mega-launch/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MegaLaunchConfig {
    /// Defaults for `launch` flags.
    pub launch: LaunchDefaults,
    /// Job file settings.
    pub jobs: JobsConfig,
}

impl MegaLaunchConfig {
    /// Reject defaults that no launch could run with.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::InvalidConfig` naming the offending key.
    pub fn validate(&self) -> Result<(), LaunchError> {
        if self.launch.required_checks > MAX_REQUIRED_CHECKS {
            return Err(LaunchError::InvalidConfig(format!(
                "launch.required_checks must be at most {MAX_REQUIRED_CHECKS}"
            )));
        }
        if self.launch.max_rescues == 0 {
            return Err(LaunchError::InvalidConfig(
                "launch.max_rescues must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Defaults applied when a `launch` flag is omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LaunchDefaults {
    pub wait_timeout: u64,
    pub max_rescues: u32,
    pub rescue_delay: u64,
    pub retry_delay: u64,
    pub required_checks: u8,
    pub scope: Scope,
}

impl Default for LaunchDefaults {
    fn default() -> Self {
        Self {
            wait_timeout: DEFAULT_WAIT_TIMEOUT_SECS,
            max_rescues: DEFAULT_MAX_RESCUES,
            rescue_delay: DEFAULT_RESCUE_DELAY_SECS,
            retry_delay: DEFAULT_RETRY_DELAY_SECS,
            required_checks: DEFAULT_REQUIRED_CHECKS,
            scope: Scope::System,
        }
    }
}

/// Where job records live.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct JobsConfig {
    /// Overrides `~/.mega-launch/jobs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub async_dir: Option<PathBuf>,
}

// ── Unit tests ───────────────────────────────────────────────────────────────
