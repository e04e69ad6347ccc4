//! Integration tests for focus
//!
//! These tests drive sessions and the CLI against scratch hosts and config
//! files, so they never touch the real /etc/hosts.

pub mod cli;
pub mod foreground;
pub mod helpers;
