//! Shared test helpers: scripted port fakes and output constructors.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::process::{ExitStatus, Output};

use anyhow::Result;
use mega_launch_cli::application::ports::{
    EventSink, LogQuery, LogSource, ProgressReporter, ServiceManager, SocketTable,
};

// ── Output constructors ──────────────────────────────────────────────────────

/// Build an `ExitStatus` from a logical exit code.
///
/// The raw wait-status encodes the exit code in bits 8 to 15, so we shift.
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

pub const DEAD: &[u8] = b"LoadState=loaded\nActiveState=inactive\nSubState=dead\nMainPID=0\n";
pub const RUNNING: &[u8] = b"LoadState=loaded\nActiveState=active\nSubState=running\nMainPID=4242\n";

// ── Service manager ──────────────────────────────────────────────────────────

/// `ServiceManager` fake. Each verb answers from its own queue; the last
/// queued answer repeats. Unscripted verbs fail the call.
#[derive(Default)]
pub struct FakeManager {
    scripts: RefCell<HashMap<&'static str, VecDeque<Output>>>,
    init_script: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeManager {
    pub fn answer(self, verb: &'static str, out: Output) -> Self {
        self.scripts
            .borrow_mut()
            .entry(verb)
            .or_default()
            .push_back(out);
        self
    }

    pub fn with_init_script(mut self) -> Self {
        self.init_script = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.split(' ').next() == Some(verb))
            .count()
    }

    fn next(&self, verb: &'static str, arg: &str) -> Result<Output> {
        self.calls.borrow_mut().push(format!("{verb} {arg}"));
        let mut scripts = self.scripts.borrow_mut();
        let Some(queue) = scripts.get_mut(verb) else {
            anyhow::bail!("{verb} not expected in this test");
        };
        let out = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        out.ok_or_else(|| anyhow::anyhow!("{verb} script is empty"))
    }
}

impl ServiceManager for FakeManager {
    async fn show(&self, unit: &str) -> Result<Output> {
        self.next("show", unit)
    }
    async fn start(&self, unit: &str) -> Result<Output> {
        self.next("start", unit)
    }
    async fn stop(&self, unit: &str) -> Result<Output> {
        self.next("stop", unit)
    }
    async fn is_active(&self, unit: &str) -> Result<Output> {
        self.next("is-active", unit)
    }
    async fn is_enabled(&self, unit: &str) -> Result<Output> {
        self.next("is-enabled", unit)
    }
    async fn list_unit_files(&self, pattern: &str) -> Result<Output> {
        self.next("list-unit-files", pattern)
    }
    fn has_init_script(&self, _: &str) -> bool {
        self.init_script
    }
}

// ── Logs, sockets, events ────────────────────────────────────────────────────

/// Log source returning the same lines to every query and counting queries.
#[derive(Default)]
pub struct FakeLogs {
    lines: Vec<String>,
    queries: Cell<usize>,
    tags: RefCell<Vec<String>>,
}

impl FakeLogs {
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| (*l).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.get()
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.borrow().clone()
    }
}

impl LogSource for FakeLogs {
    async fn query(&self, query: &LogQuery<'_>) -> Result<Vec<String>> {
        self.queries.set(self.queries.get() + 1);
        self.tags.borrow_mut().push(query.tag.to_string());
        Ok(self.lines.clone())
    }
}

/// Socket table with a fixed set of listeners.
pub struct FakeSockets(pub BTreeSet<u16>);

impl FakeSockets {
    pub fn listening(ports: &[u16]) -> Self {
        Self(ports.iter().copied().collect())
    }
}

impl SocketTable for FakeSockets {
    fn listening_ports(&self, _: Option<u32>) -> Result<BTreeSet<u16>> {
        Ok(self.0.clone())
    }
}

/// Event sink that keeps every message.
#[derive(Default)]
pub struct RecordingSink(RefCell<Vec<String>>);

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, message: &str) {
        self.0.borrow_mut().push(message.to_string());
    }
}

/// Reporter that keeps warnings and drops the rest.
#[derive(Default)]
pub struct WarnCollector(RefCell<Vec<String>>);

impl WarnCollector {
    pub fn warnings(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl ProgressReporter for WarnCollector {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, message: &str) {
        self.0.borrow_mut().push(message.to_string());
    }
}
