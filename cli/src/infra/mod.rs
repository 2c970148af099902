//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! `systemctl` and `journalctl` adapters, procfs socket enumeration, the
//! syslog event sink, and job/config files.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod job_store;
pub mod journal;
pub mod sockets;
pub mod syslog;
pub mod systemctl;
