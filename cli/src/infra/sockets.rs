//! `/proc`-backed implementation of the `SocketTable` port.

use std::collections::{BTreeSet, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::application::ports::SocketTable;
use crate::domain::error::LaunchError;

/// `st` column value of a listening TCP socket.
const TCP_LISTEN: &str = "0A";

const TCP_TABLES: [&str; 2] = ["tcp", "tcp6"];

/// One row of `/proc/net/tcp{,6}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpEntry {
    pub local_port: u16,
    pub listening: bool,
    pub inode: u64,
}

/// Parse one data row. Returns `None` for the header and malformed rows.
#[must_use]
pub fn parse_tcp_line(line: &str) -> Option<TcpEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 10 || !fields[0].ends_with(':') {
        return None;
    }
    let (_, port_hex) = fields[1].rsplit_once(':')?;
    Some(TcpEntry {
        local_port: u16::from_str_radix(port_hex, 16).ok()?,
        listening: fields[3] == TCP_LISTEN,
        inode: fields[9].parse().ok()?,
    })
}

/// Parse a whole table.
#[must_use]
pub fn parse_tcp_table(text: &str) -> Vec<TcpEntry> {
    text.lines().filter_map(parse_tcp_line).collect()
}

/// Socket inode behind an fd link target such as `socket:[12345]`.
#[must_use]
pub fn socket_inode(link: &Path) -> Option<u64> {
    link.to_str()?
        .strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

/// Reads listening sockets from procfs.
pub struct ProcSocketTable {
    root: PathBuf,
}

impl ProcSocketTable {
    #[must_use]
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Read from a procfs mounted elsewhere.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn socket_error(pid: Option<u32>, reason: impl ToString) -> anyhow::Error {
        LaunchError::SocketQuery {
            pid,
            reason: reason.to_string(),
        }
        .into()
    }

    /// Rows of `net_dir/tcp` and `net_dir/tcp6`; a missing table is empty.
    fn tables(&self, net_dir: &Path, pid: Option<u32>) -> Result<Vec<TcpEntry>> {
        let mut entries = Vec::new();
        for name in TCP_TABLES {
            match std::fs::read_to_string(net_dir.join(name)) {
                Ok(text) => entries.extend(parse_tcp_table(&text)),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(Self::socket_error(pid, e)),
            }
        }
        Ok(entries)
    }

    /// Socket inodes held open by `pid`, or `None` if the process is gone.
    fn socket_inodes(&self, pid: u32) -> Result<Option<HashSet<u64>>> {
        let fd_dir = self.root.join(pid.to_string()).join("fd");
        let dir = match std::fs::read_dir(&fd_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::socket_error(Some(pid), e)),
        };
        // fds close while we walk the directory; skip those.
        let inodes = dir
            .filter_map(std::result::Result::ok)
            .filter_map(|entry| std::fs::read_link(entry.path()).ok())
            .filter_map(|link| socket_inode(&link))
            .collect();
        Ok(Some(inodes))
    }
}

impl Default for ProcSocketTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SocketTable for ProcSocketTable {
    fn listening_ports(&self, pid: Option<u32>) -> Result<BTreeSet<u16>> {
        let Some(pid) = pid else {
            let entries = self.tables(&self.root.join("net"), None)?;
            return Ok(entries
                .into_iter()
                .filter(|e| e.listening)
                .map(|e| e.local_port)
                .collect());
        };

        let Some(inodes) = self.socket_inodes(pid)? else {
            tracing::debug!(pid, "process not found, no listeners");
            return Ok(BTreeSet::new());
        };
        let entries = self.tables(&self.root.join(pid.to_string()).join("net"), Some(pid))?;
        Ok(entries
            .into_iter()
            .filter(|e| e.listening && inodes.contains(&e.inode))
            .map(|e| e.local_port)
            .collect())
    }
}
