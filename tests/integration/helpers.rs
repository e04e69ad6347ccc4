//! Shared fixtures: a scratch hosts file, run directory and config.

use focus::config::Config;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const ETC_HOSTS: &str = "127.0.0.1\tlocalhost\n::1\tlocalhost ip6-localhost\n";

pub struct Sandbox {
    _temp: TempDir,
    pub hosts: PathBuf,
    pub run_dir: PathBuf,
    pub config_path: PathBuf,
}

impl Sandbox {
    pub fn new(sites: &[&str]) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let hosts = temp.path().join("hosts");
        let run_dir = temp.path().join("run");
        fs::write(&hosts, ETC_HOSTS).expect("Failed to write hosts");

        let config = Config {
            hosts_path: hosts.display().to_string(),
            log_directory: run_dir.display().to_string(),
            data_directory: temp.path().join("audio").display().to_string(),
            blocked_sites: sites.iter().map(|s| s.to_string()).collect(),
            ..Config::default()
        };
        let config_path = temp.path().join("config.toml");
        config.save(&config_path).expect("Failed to save config");

        Self {
            _temp: temp,
            hosts,
            run_dir,
            config_path,
        }
    }

    pub fn hosts_content(&self) -> String {
        fs::read_to_string(&self.hosts).expect("Failed to read hosts")
    }

    pub fn config(&self) -> Config {
        Config::load(&self.config_path).expect("Failed to load config")
    }
}
