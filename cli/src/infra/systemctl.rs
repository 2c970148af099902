//! `systemctl` adapter for the `ServiceManager` port.

use std::path::PathBuf;
use std::process::Output;

use anyhow::{Context, Result};
use mega_launch_common::Scope;

use crate::application::ports::{CommandRunner, ServiceManager};

const SYSTEMCTL: &str = "systemctl";

/// Directory holding legacy SysV init scripts.
pub const INIT_SCRIPT_DIR: &str = "/etc/init.d";

/// `ServiceManager` backed by the `systemctl` binary of one manager scope.
pub struct Systemctl<R: CommandRunner> {
    runner: R,
    scope: Scope,
    init_dir: PathBuf,
}

impl<R: CommandRunner> Systemctl<R> {
    #[must_use]
    pub fn new(runner: R, scope: Scope) -> Self {
        Self {
            runner,
            scope,
            init_dir: PathBuf::from(INIT_SCRIPT_DIR),
        }
    }

    /// Look for init scripts somewhere other than `/etc/init.d`.
    #[must_use]
    pub fn with_init_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.init_dir = dir.into();
        self
    }

    async fn systemctl(&self, verb: &str, arg: &str) -> Result<Output> {
        let mut args: Vec<&str> = Vec::with_capacity(3);
        if let Some(flag) = self.scope.systemctl_flag() {
            args.push(flag);
        }
        args.push(verb);
        args.push(arg);
        self.runner
            .run(SYSTEMCTL, &args)
            .await
            .with_context(|| format!("systemctl {verb} {arg}"))
    }
}

impl<R: CommandRunner> ServiceManager for Systemctl<R> {
    async fn show(&self, unit: &str) -> Result<Output> {
        self.systemctl("show", unit).await
    }

    async fn start(&self, unit: &str) -> Result<Output> {
        tracing::info!(unit, scope = %self.scope, "systemctl start");
        self.systemctl("start", unit).await
    }

    async fn stop(&self, unit: &str) -> Result<Output> {
        tracing::info!(unit, scope = %self.scope, "systemctl stop");
        self.systemctl("stop", unit).await
    }

    async fn is_active(&self, unit: &str) -> Result<Output> {
        self.systemctl("is-active", unit).await
    }

    async fn is_enabled(&self, unit: &str) -> Result<Output> {
        self.systemctl("is-enabled", unit).await
    }

    async fn list_unit_files(&self, pattern: &str) -> Result<Output> {
        self.systemctl("list-unit-files", pattern).await
    }

    fn has_init_script(&self, unit: &str) -> bool {
        let name = unit.strip_suffix(".service").unwrap_or(unit);
        self.init_dir.join(name).is_file()
    }
}
