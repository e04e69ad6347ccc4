//! Start command - blocks the configured sites for a session

use super::load_config;
use crate::daemon::{DaemonStatus, FocusDaemon};
use crate::hosts::HostsFile;
use crate::session::{Session, SessionOutcome, SessionPlan};
use anyhow::{bail, Result};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub config: Option<PathBuf>,
    /// Hosts file override for this run
    pub hosts_path: Option<String>,
    /// Minutes override for this run
    pub duration: Option<u64>,
    pub background: bool,
    pub forever: bool,
}

/// What `start` did before handing over to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartResult {
    AlreadyBlocked,
    Finished(SessionOutcome),
}

pub fn execute(options: StartOptions) -> Result<StartResult> {
    let (_, config) = load_config(options.config.as_deref())?;
    let config = config.with_overrides(options.hosts_path, options.duration);
    config.validate()?;

    if config.blocked_sites.is_empty() {
        bail!("No sites to block. Add some with `focus add <URL>...`");
    }

    let run_dir = config.run_dir();
    let had_pid_file = config.pid_path().exists();
    match FocusDaemon::check_status(&run_dir) {
        DaemonStatus::Running | DaemonStatus::ProcessOnly => {
            let pid = FocusDaemon::read_pid(&run_dir).unwrap_or_default();
            bail!("A focus session is already running (pid {pid}). Use `focus stop` first");
        }
        DaemonStatus::NotRunning if had_pid_file && !config.pid_path().exists() => {
            println!(
                "{} Stale PID file found. Deleted.",
                "!".yellow().bold()
            );
        }
        DaemonStatus::NotRunning => {}
    }

    let hosts = HostsFile::new(&config.hosts_path);
    if hosts.is_blocked()? {
        println!("{} Blocking is already active", "!".yellow().bold());
        return Ok(StartResult::AlreadyBlocked);
    }

    let plan = SessionPlan::from_config(&config, options.forever, !options.background);
    let session = Session::new(plan);
    let daemon = FocusDaemon::new(&run_dir);

    let outcome = if options.background {
        println!("{} Moving to background...", "→".cyan().bold());
        daemon.start(&session)?
    } else {
        daemon.run_foreground(&session)?
    };
    tracing::info!(?outcome, "session finished");
    Ok(StartResult::Finished(outcome))
}
