//! Unit tests for mega-launch
//!
//! These tests use scripted fakes of the ports and run without touching the
//! host's service manager, journal or sockets.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod helpers;
mod launch_supervisor;
mod property_tests;
mod unit_resolution;
