//! A single focus session: block, guard, wait, restore.
//!
//! Signal handlers and the daemon's control socket only raise the shared
//! shutdown flag. The thread running [`Session::run`] notices it within one
//! poll interval and performs the cleanup itself.

mod guard;

use crate::audio::{self, AudioCues};
use crate::config::Config;
use crate::dns::{self, FlushOutcome};
use crate::error::{FocusError, Result};
use crate::hosts::{render_block, HostsFile};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub use guard::spawn_guard;

/// How often the hosts file is checked for tampering.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything needed to run one session, resolved from config and flags.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub hosts_path: PathBuf,
    pub block_ip: String,
    pub sites: Vec<String>,
    /// `None` blocks until the session is stopped.
    pub length: Option<Duration>,
    pub audio: Option<AudioCues>,
    pub flush_dns: bool,
    pub check_interval: Duration,
}

impl SessionPlan {
    pub fn from_config(config: &Config, forever: bool, with_audio: bool) -> Self {
        let length = if forever || config.duration == 0 {
            None
        } else {
            Some(Duration::from_secs(config.duration.saturating_mul(60)))
        };
        let audio = with_audio.then(|| {
            AudioCues::new(
                Path::new(&config.data_directory),
                &config.start_audio,
                &config.end_audio,
            )
        });
        Self {
            hosts_path: PathBuf::from(&config.hosts_path),
            block_ip: config.block_ip.clone(),
            sites: config.blocked_sites.clone(),
            length,
            audio,
            flush_dns: true,
            check_interval: CHECK_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The timer ran out.
    Expired,
    /// Stopped early by a signal or `focus stop`.
    Interrupted,
}

/// Snapshot of a running session, served to `focus status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub sites: Vec<String>,
}

impl SessionInfo {
    /// Time left at `now`, clamped to zero. `None` for open-ended sessions.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.ends_at
            .map(|end| (end - now).max(chrono::Duration::zero()))
    }
}

pub struct Session {
    plan: SessionPlan,
    hosts: HostsFile,
    block: String,
}

impl Session {
    pub fn new(plan: SessionPlan) -> Self {
        let hosts = HostsFile::new(&plan.hosts_path);
        let block = render_block(&plan.block_ip, &plan.sites);
        Self { plan, hosts, block }
    }

    /// Describe this session as if it started now in process `pid`.
    pub fn info(&self, pid: u32) -> SessionInfo {
        let started_at = Utc::now();
        let ends_at = self.plan.length.and_then(|length| {
            chrono::Duration::from_std(length)
                .ok()
                .and_then(|length| started_at.checked_add_signed(length))
        });
        SessionInfo {
            pid,
            started_at,
            ends_at,
            sites: self.plan.sites.clone(),
        }
    }

    /// Run to completion. Fails with [`FocusError::AlreadyActive`] before
    /// touching anything when the hosts file already carries a block.
    pub fn run(&self, shutdown: &Arc<AtomicBool>) -> Result<SessionOutcome> {
        self.begin()?;

        let guard_stop = Arc::new(AtomicBool::new(false));
        let guard = spawn_guard(
            self.hosts.clone(),
            self.block.clone(),
            self.plan.check_interval,
            Arc::clone(&guard_stop),
        );

        let outcome = self.wait(shutdown);

        guard_stop.store(true, Ordering::SeqCst);
        match guard.join() {
            Ok(repairs) if repairs > 0 => {
                tracing::info!(repairs, "guard re-applied the block during the session")
            }
            Ok(_) => {}
            Err(_) => tracing::error!("tamper guard thread panicked"),
        }

        match outcome {
            SessionOutcome::Expired => {
                println!("{} Time's up! Unblocking sites.", "→".cyan().bold())
            }
            SessionOutcome::Interrupted => println!("{} Cleaning up...", "→".cyan().bold()),
        }
        self.finish()?;
        Ok(outcome)
    }

    fn begin(&self) -> Result<()> {
        if !self.hosts.apply(&self.block)? {
            return Err(FocusError::AlreadyActive);
        }
        tracing::debug!(
            hosts = %self.hosts.path().display(),
            sites = self.plan.sites.len(),
            "block written"
        );

        match self.plan.length {
            Some(length) => println!(
                "{} Blocking {} site(s) for {} minutes",
                "→".cyan().bold(),
                self.plan.sites.len(),
                length.as_secs() / 60
            ),
            None => println!(
                "{} Blocking {} site(s) until you unblock them",
                "→".cyan().bold(),
                self.plan.sites.len()
            ),
        }

        self.flush_dns();
        if let Some(cues) = &self.plan.audio {
            play_cue(&cues.start);
        }
        Ok(())
    }

    fn wait(&self, shutdown: &AtomicBool) -> SessionOutcome {
        // A deadline past what Instant can hold behaves as open-ended.
        let deadline = self
            .plan
            .length
            .and_then(|length| Instant::now().checked_add(length));
        loop {
            if shutdown.load(Ordering::SeqCst) {
                return SessionOutcome::Interrupted;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return SessionOutcome::Expired;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn finish(&self) -> Result<()> {
        if let Err(e) = self.hosts.clear() {
            eprintln!(
                "{} CRITICAL: Failed to restore hosts file. Please remove the focus block manually from {}",
                "✗".red().bold(),
                self.hosts.path().display()
            );
            return Err(e);
        }
        self.flush_dns();
        if let Some(cues) = &self.plan.audio {
            play_cue(&cues.end);
        }
        println!("{} Sites unblocked", "✓".green().bold());
        Ok(())
    }

    fn flush_dns(&self) {
        if !self.plan.flush_dns {
            return;
        }
        println!("{} Flushing DNS cache", "→".cyan().bold());
        match dns::flush_cache() {
            FlushOutcome::Flushed | FlushOutcome::Unsupported => {}
            FlushOutcome::Failed(reason) => {
                println!("{} Failed to flush DNS cache: {reason}", "!".yellow().bold())
            }
        }
    }
}

fn play_cue(path: &Path) {
    if let Err(e) = audio::play(path) {
        tracing::debug!(path = %path.display(), error = %e, "audio cue skipped");
        println!("{} {e}", "!".yellow().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosts::{is_blocked, BLOCK_BEGIN};
    use std::fs;
    use tempfile::TempDir;

    const ETC_HOSTS: &str = "127.0.0.1\tlocalhost\n";

    fn test_plan(hosts_path: PathBuf, length: Option<Duration>) -> SessionPlan {
        SessionPlan {
            hosts_path,
            block_ip: "127.0.0.1".to_string(),
            sites: vec!["youtube.com".to_string(), "reddit.com".to_string()],
            length,
            audio: None,
            flush_dns: false,
            check_interval: Duration::from_millis(50),
        }
    }

    fn scratch_hosts() -> (TempDir, PathBuf) {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("hosts");
        fs::write(&path, ETC_HOSTS).expect("Failed to write hosts");
        (temp, path)
    }

    #[test]
    fn test_plan_from_config() {
        let config = Config {
            duration: 45,
            blocked_sites: vec!["x.com".to_string()],
            ..Config::default()
        };
        let plan = SessionPlan::from_config(&config, false, true);
        assert_eq!(plan.length, Some(Duration::from_secs(45 * 60)));
        assert_eq!(plan.sites, vec!["x.com".to_string()]);
        assert!(plan.audio.is_some());
        assert_eq!(plan.check_interval, CHECK_INTERVAL);
    }

    #[test]
    fn test_plan_forever_and_zero_duration() {
        let config = Config::default();
        assert_eq!(SessionPlan::from_config(&config, true, false).length, None);

        let config = Config {
            duration: 0,
            ..Config::default()
        };
        let plan = SessionPlan::from_config(&config, false, false);
        assert_eq!(plan.length, None);
        assert!(plan.audio.is_none());
    }

    #[test]
    fn test_session_expires_and_restores() {
        let (_temp, path) = scratch_hosts();
        let session = Session::new(test_plan(path.clone(), Some(Duration::from_millis(300))));
        let shutdown = Arc::new(AtomicBool::new(false));

        let outcome = session.run(&shutdown).expect("session failed");

        assert_eq!(outcome, SessionOutcome::Expired);
        assert_eq!(fs::read_to_string(&path).unwrap(), ETC_HOSTS);
    }

    #[test]
    fn test_session_interrupted_by_flag() {
        let (_temp, path) = scratch_hosts();
        let session = Session::new(test_plan(path.clone(), None));
        let shutdown = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&shutdown);
        let watcher_path = path.clone();
        let stopper = thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(5);
            while Instant::now() < deadline {
                if is_blocked(&fs::read_to_string(&watcher_path).unwrap_or_default()) {
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
            flag.store(true, Ordering::SeqCst);
        });

        let outcome = session.run(&shutdown).expect("session failed");
        stopper.join().unwrap();

        assert_eq!(outcome, SessionOutcome::Interrupted);
        assert_eq!(fs::read_to_string(&path).unwrap(), ETC_HOSTS);
    }

    #[test]
    fn test_session_reblocks_after_tamper() {
        let (_temp, path) = scratch_hosts();
        let session = Session::new(test_plan(path.clone(), None));
        let shutdown = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&shutdown);
        let tamper_path = path.clone();
        let tamperer = thread::spawn(move || {
            // Wait for the block, wipe it, then wait for the guard to put it back.
            let mut wiped = false;
            let mut restored = false;
            let deadline = Instant::now() + Duration::from_secs(5);
            while Instant::now() < deadline {
                let content = fs::read_to_string(&tamper_path).unwrap_or_default();
                if !wiped && is_blocked(&content) {
                    fs::write(&tamper_path, ETC_HOSTS).unwrap();
                    wiped = true;
                } else if wiped && is_blocked(&content) {
                    restored = true;
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
            flag.store(true, Ordering::SeqCst);
            restored
        });

        session.run(&shutdown).expect("session failed");
        assert!(tamperer.join().unwrap(), "guard never re-applied the block");
        assert_eq!(fs::read_to_string(&path).unwrap(), ETC_HOSTS);
    }

    #[test]
    fn test_session_refuses_when_already_blocked() {
        let (_temp, path) = scratch_hosts();
        let existing = render_block("0.0.0.0", &["other.com".to_string()]);
        fs::write(&path, format!("{ETC_HOSTS}{existing}")).unwrap();

        let session = Session::new(test_plan(path.clone(), Some(Duration::from_millis(50))));
        let err = session
            .run(&Arc::new(AtomicBool::new(false)))
            .unwrap_err();

        assert!(matches!(err, FocusError::AlreadyActive));
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(BLOCK_BEGIN).count(), 1);
        assert!(content.contains("other.com"));
    }

    #[test]
    fn test_info_and_remaining() {
        let (_temp, path) = scratch_hosts();
        let session = Session::new(test_plan(path, Some(Duration::from_secs(600))));
        let info = session.info(4321);

        assert_eq!(info.pid, 4321);
        assert_eq!(info.sites.len(), 2);
        let ends_at = info.ends_at.expect("timed session has an end");
        assert_eq!(ends_at - info.started_at, chrono::Duration::seconds(600));

        let remaining = info.remaining(info.started_at).unwrap();
        assert_eq!(remaining, chrono::Duration::seconds(600));
        let after = info.remaining(ends_at + chrono::Duration::seconds(5)).unwrap();
        assert_eq!(after, chrono::Duration::zero());
    }

    #[test]
    fn test_info_with_unrepresentable_end_is_open_ended() {
        let (_temp, path) = scratch_hosts();
        let length = Duration::from_secs(1_000_000_000_000 * 60);
        let info = Session::new(test_plan(path, Some(length))).info(1);
        assert!(info.ends_at.is_none());
    }

    #[test]
    fn test_session_with_huge_length_still_restores() {
        let (_temp, path) = scratch_hosts();
        let session = Session::new(test_plan(path.clone(), Some(Duration::MAX)));
        let shutdown = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&shutdown);
        let watcher_path = path.clone();
        let stopper = thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(5);
            while Instant::now() < deadline {
                if is_blocked(&fs::read_to_string(&watcher_path).unwrap_or_default()) {
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
            flag.store(true, Ordering::SeqCst);
        });

        let outcome = session.run(&shutdown).expect("session failed");
        stopper.join().unwrap();

        assert_eq!(outcome, SessionOutcome::Interrupted);
        assert_eq!(fs::read_to_string(&path).unwrap(), ETC_HOSTS);
    }

    #[test]
    fn test_open_ended_info_has_no_remaining() {
        let (_temp, path) = scratch_hosts();
        let info = Session::new(test_plan(path, None)).info(1);
        assert!(info.ends_at.is_none());
        assert!(info.remaining(Utc::now()).is_none());
    }
}
