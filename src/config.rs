//! Persistent configuration stored as TOML.
//!
//! The config file holds the block list and the locations focus works with.
//! CLI flags can override the hosts path and duration for a single run; those
//! overrides are never written back.

use crate::error::{FocusError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "/usr/local/etc/focus/config.toml";
pub const CONFIG_ENV_VAR: &str = "FOCUS_CONFIG";

/// Longest timed session accepted: one year.
pub const MAX_DURATION_MINUTES: u64 = 60 * 24 * 365;

const PID_FILE: &str = "focus.pid";
const SOCKET_FILE: &str = "focus.sock";
const OUT_FILE: &str = "focus.out";
const ERR_FILE: &str = "focus.err";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hosts_path: String,
    pub block_ip: String,
    pub blocked_sites: Vec<String>,
    /// Session length in minutes. Zero blocks until `focus stop`.
    pub duration: u64,
    pub data_directory: String,
    pub log_directory: String,
    pub start_audio: String,
    pub end_audio: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hosts_path: "/etc/hosts".to_string(),
            block_ip: "127.0.0.1".to_string(),
            blocked_sites: Vec::new(),
            duration: 25,
            data_directory: "/usr/local/share/focus".to_string(),
            log_directory: "/var/log/focus".to_string(),
            start_audio: "start.wav".to_string(),
            end_audio: "end.wav".to_string(),
        }
    }
}

/// Pick the config file: explicit flag, then `FOCUS_CONFIG`, then the system default.
pub fn resolve_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

/// Reduce a user-supplied URL to the bare hostname the hosts file understands.
///
/// `https://www.Example.com/watch?v=1` becomes `www.example.com`.
pub fn normalize_site(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    host.trim_end_matches('.').to_lowercase()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| FocusError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| FocusError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let encoded = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| FocusError::ConfigWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        fs::write(path, encoded).map_err(|source| FocusError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_ip.parse::<IpAddr>().is_err() {
            return Err(FocusError::InvalidConfig {
                message: format!("block_ip '{}' is not an IP address", self.block_ip),
            });
        }
        if self.hosts_path.trim().is_empty() {
            return Err(FocusError::InvalidConfig {
                message: "hosts_path is empty".to_string(),
            });
        }
        if self.duration > MAX_DURATION_MINUTES {
            return Err(FocusError::InvalidConfig {
                message: format!(
                    "duration {} exceeds the maximum of {MAX_DURATION_MINUTES} minutes (use --forever to block until stopped)",
                    self.duration
                ),
            });
        }
        for site in &self.blocked_sites {
            if site.is_empty() || site.chars().any(char::is_whitespace) {
                return Err(FocusError::InvalidConfig {
                    message: format!("'{site}' is not a valid hostname"),
                });
            }
        }
        Ok(())
    }

    /// Apply one-shot CLI overrides.
    pub fn with_overrides(mut self, hosts_path: Option<String>, duration: Option<u64>) -> Self {
        if let Some(path) = hosts_path {
            self.hosts_path = path;
        }
        if let Some(minutes) = duration {
            self.duration = minutes;
        }
        self
    }

    /// Add sites, skipping ones already listed. Returns how many were added.
    pub fn add_sites(&mut self, sites: &[String]) -> Result<usize> {
        if sites.is_empty() {
            return Err(FocusError::NoSites);
        }
        let mut added = 0;
        for site in sites.iter().map(|s| normalize_site(s)) {
            if site.is_empty() || self.blocked_sites.contains(&site) {
                continue;
            }
            self.blocked_sites.push(site);
            added += 1;
        }
        Ok(added)
    }

    /// Remove sites. Returns how many entries were dropped.
    pub fn remove_sites(&mut self, sites: &[String]) -> Result<usize> {
        if sites.is_empty() {
            return Err(FocusError::NoSites);
        }
        let targets: Vec<String> = sites.iter().map(|s| normalize_site(s)).collect();
        let before = self.blocked_sites.len();
        self.blocked_sites.retain(|site| !targets.contains(site));
        Ok(before - self.blocked_sites.len())
    }

    pub fn run_dir(&self) -> PathBuf {
        PathBuf::from(&self.log_directory)
    }

    pub fn pid_path(&self) -> PathBuf {
        pid_file(&self.run_dir())
    }
}

/// Run-file locations inside a run directory. The daemon only knows the directory.
pub fn pid_file(run_dir: &Path) -> PathBuf {
    run_dir.join(PID_FILE)
}

pub fn socket_file(run_dir: &Path) -> PathBuf {
    run_dir.join(SOCKET_FILE)
}

pub fn out_file(run_dir: &Path) -> PathBuf {
    run_dir.join(OUT_FILE)
}

pub fn err_file(run_dir: &Path) -> PathBuf {
    run_dir.join(ERR_FILE)
}
