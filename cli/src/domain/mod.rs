//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod job;
pub mod launch;
pub mod probe;
pub mod unit;

pub use config::MegaLaunchConfig;
pub use error::{JobError, LaunchError};
pub use job::{CleanupReport, StatusReport};
pub use launch::{AttemptState, LaunchConfig, LaunchState, RunMode, SupervisorResult};
pub use probe::{LogCheck, LogPattern, PortCheck, evaluate_ports};
pub use unit::{ServiceStatus, parse_show, validate_unit_name};
