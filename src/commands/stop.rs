//! Stop command - ends the running session and removes any leftover block

use super::load_config;
use crate::daemon::FocusDaemon;
use crate::dns;
use crate::hosts::HostsFile;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

pub fn execute(config: Option<PathBuf>) -> Result<()> {
    let (_, config) = load_config(config.as_deref())?;
    let run_dir = config.run_dir();

    let stopped = if FocusDaemon::is_running(&run_dir) {
        println!("{} Stopping focus session...", "→".cyan().bold());
        let pid = FocusDaemon::stop(&run_dir).context("Failed to stop focus session")?;
        println!("{} Focus session (pid {pid}) stopped", "✓".green().bold());
        true
    } else {
        println!("{} No active focus session found to stop", "─".dimmed());
        false
    };

    // A crashed or killed session can leave its block behind.
    let hosts = HostsFile::new(&config.hosts_path);
    if hosts.clear()? {
        println!("{} Sites were still blocked. Unblocked.", "→".cyan().bold());
        dns::flush_cache();
    } else if !stopped {
        println!("{} Sites are not blocked", "─".dimmed());
    }
    Ok(())
}
