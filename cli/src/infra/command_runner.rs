//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution, with an optional timeout that kills the child.

use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use crate::application::ports::CommandRunner;

/// Runtime directory of the user manager, needed by `--user` queries and
/// `journalctl` when the caller's environment does not provide one.
#[must_use]
pub fn runtime_dir_fallback(current: Option<&str>) -> Option<(String, String)> {
    if current.is_some() {
        return None;
    }
    let uid = std::fs::metadata(Path::new("/proc/self")).ok()?.uid();
    Some(("XDG_RUNTIME_DIR".to_string(), format!("/run/user/{uid}")))
}

/// Production `CommandRunner`. A child that outlives the timeout is killed.
pub struct TokioCommandRunner {
    timeout: Option<Duration>,
    envs: Vec<(String, String)>,
}

impl TokioCommandRunner {
    /// Runner without a timeout; waits as long as the child does.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: None,
            envs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Extra environment for every child.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Runner whose children see `XDG_RUNTIME_DIR`, filled in from the
    /// effective uid if the current environment lacks it.
    #[must_use]
    pub fn from_env() -> Self {
        let current = std::env::var("XDG_RUNTIME_DIR").ok();
        match runtime_dir_fallback(current.as_deref()) {
            Some((key, value)) => {
                tracing::debug!(%value, "XDG_RUNTIME_DIR unset, using fallback");
                Self::new().with_env(key, value)
            }
            None => Self::new(),
        }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        tracing::debug!(program, ?args, "run");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        let collect = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stdout_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stderr_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
            );
            Ok::<_, anyhow::Error>(Output {
                status: status.with_context(|| format!("waiting for {program}"))?,
                stdout,
                stderr,
            })
        };

        let Some(timeout) = self.timeout else {
            return collect.await;
        };
        tokio::select! {
            result = collect => result,
            () = tokio::time::sleep(timeout) => {
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }
}
