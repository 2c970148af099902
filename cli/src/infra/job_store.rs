//! Infrastructure implementation of the `JobStatusStore` port.
//!
//! `FileJobStore` keeps one JSON file per job id in a directory. Blocking file
//! I/O runs under `tokio::task::spawn_blocking`, and writes go through a temp
//! file and a rename so a poller never sees a half-written record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mega_launch_common::JobRecord;

use crate::application::ports::JobStatusStore;
use crate::domain::error::JobError;

/// Sibling temp file; job ids may contain dots, so the suffix is appended.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Job record files, one per job id.
pub struct FileJobStore {
    dir: PathBuf,
}

impl FileJobStore {
    /// Store rooted at `~/.mega-launch/jobs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_dir(home.join(".mega-launch").join("jobs")))
    }

    #[must_use]
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_sync(path: &Path) -> Result<Option<JobRecord>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading job file {}", path.display()));
            }
        };
        // The writer creates the file before the first record lands in it.
        if content.trim().is_empty() {
            return Ok(None);
        }
        let record = serde_json::from_str(&content).map_err(|e| JobError::RecordParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Some(record))
    }

    fn write_sync(path: &Path, record: &JobRecord) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string(record).context("serializing job record")?;

        let temp_path = temp_path(path);
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("finalizing job file {}", path.display()))?;
        Ok(())
    }

    fn erase_sync(job_id: &str, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(JobError::NotFound {
                job_id: job_id.to_string(),
                path: path.to_path_buf(),
            }
            .into()),
            Err(e) => Err(e).with_context(|| format!("removing job file {}", path.display())),
        }
    }
}

impl JobStatusStore for FileJobStore {
    fn path(&self, job_id: &str) -> PathBuf {
        self.dir.join(job_id)
    }

    async fn read(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let path = self.path(job_id);
        tokio::task::spawn_blocking(move || Self::read_sync(&path))
            .await
            .context("job read task panicked")?
    }

    async fn write(&self, job_id: &str, record: &JobRecord) -> Result<()> {
        let path = self.path(job_id);
        let record = record.clone();
        tokio::task::spawn_blocking(move || Self::write_sync(&path, &record))
            .await
            .context("job write task panicked")?
    }

    async fn erase(&self, job_id: &str) -> Result<PathBuf> {
        let path = self.path(job_id);
        let job_id = job_id.to_string();
        let erased = path.clone();
        tokio::task::spawn_blocking(move || Self::erase_sync(&job_id, &path))
            .await
            .context("job erase task panicked")??;
        Ok(erased)
    }
}
