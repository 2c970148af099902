//! Application context: unified state passed to every command handler.
//!
//! `AppContext` is built once per invocation from the global flags and the
//! defaults file, and hands out the infrastructure adapters commands need.

use std::path::{Path, PathBuf};

use anyhow::Result;
use mega_launch_common::Scope;

use crate::application::ports::ConfigStore;
use crate::domain::MegaLaunchConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::job_store::FileJobStore;
use crate::infra::journal::Journalctl;
use crate::infra::systemctl::Systemctl;
use crate::output::OutputContext;
use crate::output::human::HumanRenderer;
use crate::output::reporter::TerminalReporter;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode). Quiet in JSON mode so
    /// stdout carries only the JSON document.
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Defaults file contents.
    pub config: MegaLaunchConfig,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults file exists but cannot be read,
    /// parsed, or validated.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        Self::with_config_store(flags, &YamlConfigStore::default())
    }

    /// Construct with an explicit config source.
    ///
    /// # Errors
    ///
    /// Propagates `ConfigStore::load` failures.
    pub fn with_config_store(flags: &AppFlags, store: &impl ConfigStore) -> Result<Self> {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet || flags.json),
            mode,
            config: store.load()?,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    #[must_use]
    pub fn human(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    /// `systemctl` adapter for `scope`.
    #[must_use]
    pub fn service_manager(&self, scope: Scope) -> Systemctl<TokioCommandRunner> {
        Systemctl::new(TokioCommandRunner::from_env(), scope)
    }

    #[must_use]
    pub fn journal(&self) -> Journalctl<TokioCommandRunner> {
        Journalctl::new(TokioCommandRunner::from_env())
    }

    /// Job directory: the flag (or `MEGA_LAUNCH_ASYNC_DIR`), then the config
    /// file, then `~/.mega-launch/jobs`.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the home directory
    /// cannot be determined.
    pub fn job_store(&self, async_dir: Option<&Path>) -> Result<FileJobStore> {
        let configured: Option<PathBuf> = async_dir
            .map(Path::to_path_buf)
            .or_else(|| self.config.jobs.async_dir.clone());
        match configured {
            Some(dir) => Ok(FileJobStore::with_dir(dir)),
            None => FileJobStore::new(),
        }
    }
}
