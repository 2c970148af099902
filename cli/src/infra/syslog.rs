//! Syslog-backed `EventSink`.
//!
//! Events are sent as RFC 3164 datagrams (facility user, severity info) to
//! the local syslog socket, where the journal indexes them by tag. The status
//! path reads them back with `journalctl -t <tag>`.

use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};

use crate::application::ports::EventSink;

/// Local syslog socket.
pub const DEV_LOG: &str = "/dev/log";

/// `<facility * 8 + severity>` for user.info.
const PRI_USER_INFO: u8 = 14;

/// Format one datagram.
#[must_use]
pub fn format_datagram(tag: &str, pid: u32, message: &str) -> String {
    format!("<{PRI_USER_INFO}>{tag}[{pid}]: {message}")
}

/// Connected for the lifetime of one launch run; dropping it closes the
/// socket.
pub struct SyslogSink {
    socket: Option<UnixDatagram>,
    path: PathBuf,
    tag: String,
    pid: u32,
}

impl SyslogSink {
    /// Open the sink on `/dev/log`.
    #[must_use]
    pub fn open(tag: impl Into<String>) -> Self {
        Self::open_at(DEV_LOG, tag)
    }

    /// Open the sink on an arbitrary datagram socket. An unreachable socket
    /// yields a sink that drops every event.
    #[must_use]
    pub fn open_at(path: impl AsRef<Path>, tag: impl Into<String>) -> Self {
        let path = path.as_ref().to_path_buf();
        let tag = tag.into();
        let socket = match UnixDatagram::unbound() {
            Ok(socket) => match socket.connect(&path) {
                Ok(()) => Some(socket),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "syslog unavailable, events dropped");
                    None
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "cannot create datagram socket, events dropped");
                None
            }
        };
        Self {
            socket,
            path,
            tag,
            pid: std::process::id(),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }
}

impl EventSink for SyslogSink {
    fn emit(&self, message: &str) {
        tracing::info!(tag = %self.tag, "{message}");
        let Some(socket) = &self.socket else {
            return;
        };
        let datagram = format_datagram(&self.tag, self.pid, message);
        if let Err(e) = socket.send(datagram.as_bytes()) {
            tracing::debug!(path = %self.path.display(), error = %e, "syslog send failed");
        }
    }
}

impl Drop for SyslogSink {
    fn drop(&mut self) {
        if self.socket.take().is_some() {
            tracing::debug!(tag = %self.tag, "syslog sink closed");
        }
    }
}
