//! Status command - reports whether a session runs and whether sites are blocked

use super::load_config;
use crate::daemon::{DaemonStatus, FocusDaemon};
use crate::hosts::HostsFile;
use crate::session::SessionInfo;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub daemon: DaemonStatus,
    pub session: Option<SessionInfo>,
    pub blocked: bool,
}

/// Gather the status without printing it.
pub fn collect(config: Option<PathBuf>) -> Result<StatusReport> {
    let (_, config) = load_config(config.as_deref())?;
    let run_dir = config.run_dir();

    let daemon = FocusDaemon::check_status(&run_dir);
    let session = match daemon {
        DaemonStatus::Running => match FocusDaemon::query_status(&run_dir) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(error = %e, "status query failed");
                None
            }
        },
        _ => None,
    };

    let blocked = HostsFile::new(&config.hosts_path)
        .is_blocked()
        .context("Failed to read hosts file")?;

    Ok(StatusReport {
        daemon,
        session,
        blocked,
    })
}

pub fn execute(config: Option<PathBuf>) -> Result<()> {
    let report = collect(config)?;

    match (report.daemon, &report.session) {
        (DaemonStatus::Running, Some(info)) => println!(
            "{} Focus is running (pid {}), {}",
            "✓".green().bold(),
            info.pid,
            describe_remaining(info, Utc::now())
        ),
        (DaemonStatus::Running, None) => {
            println!("{} Focus is running", "✓".green().bold())
        }
        (DaemonStatus::ProcessOnly, _) => println!(
            "{} Focus is running but not answering on its socket (try sudo)",
            "!".yellow().bold()
        ),
        (DaemonStatus::NotRunning, _) => println!("{} Focus is not running", "─".dimmed()),
    }

    if report.blocked {
        println!("{} Sites are blocked", "✓".green().bold());
        if report.daemon == DaemonStatus::NotRunning {
            println!(
                "{} No session owns this block. Run `focus stop` to remove it",
                "!".yellow().bold()
            );
        }
    } else {
        println!("{} Sites are not blocked", "─".dimmed());
    }
    Ok(())
}

/// Human summary of time left, e.g. "12 minutes remaining".
pub fn describe_remaining(info: &SessionInfo, now: DateTime<Utc>) -> String {
    match info.remaining(now) {
        None => "blocking until stopped".to_string(),
        Some(left) => {
            let minutes = left.num_minutes();
            match minutes {
                0 => "less than a minute remaining".to_string(),
                1 => "1 minute remaining".to_string(),
                m => format!("{m} minutes remaining"),
            }
        }
    }
}
