//! Block list management: add, remove, list

use super::load_config;
use crate::daemon::FocusDaemon;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

pub fn add(config: Option<PathBuf>, urls: Vec<String>) -> Result<usize> {
    let (path, mut config) = load_config(config.as_deref())?;
    let added = config.add_sites(&urls)?;
    config.validate()?;
    config
        .save(&path)
        .context("Failed to save configuration")?;

    println!(
        "{} Added {added} site(s) ({} skipped)",
        "✓".green().bold(),
        urls.len() - added
    );
    note_running_session(&config.run_dir());
    Ok(added)
}

pub fn remove(config: Option<PathBuf>, urls: Vec<String>) -> Result<usize> {
    let (path, mut config) = load_config(config.as_deref())?;
    let removed = config.remove_sites(&urls)?;
    config
        .save(&path)
        .context("Failed to save configuration")?;

    if removed == 0 {
        println!("{} None of those sites were on the list", "─".dimmed());
    } else {
        println!("{} Removed {removed} site(s)", "✓".green().bold());
        note_running_session(&config.run_dir());
    }
    Ok(removed)
}

pub fn list(config: Option<PathBuf>) -> Result<()> {
    let (_, config) = load_config(config.as_deref())?;
    if config.blocked_sites.is_empty() {
        println!("{} No sites configured", "─".dimmed());
        return Ok(());
    }
    for site in &config.blocked_sites {
        println!("  {site}");
    }
    Ok(())
}

fn note_running_session(run_dir: &std::path::Path) {
    if FocusDaemon::is_running(run_dir) {
        println!(
            "{} A session is running. Changes apply to the next one.",
            "!".yellow().bold()
        );
    }
}
