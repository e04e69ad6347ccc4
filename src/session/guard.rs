//! Tamper guard: puts the block back if someone edits it out mid-session.

use crate::hosts::HostsFile;
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const STOP_POLL: Duration = Duration::from_millis(25);

/// Spawn the guard thread. It checks every `interval` until `stop` is set and
/// returns how many times it had to re-apply the block.
pub fn spawn_guard(
    hosts: HostsFile,
    block: String,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> JoinHandle<u32> {
    thread::spawn(move || {
        let mut repairs = 0;
        while sleep_unless_stopped(interval, &stop) {
            match hosts.contains(&block) {
                Ok(true) => {}
                Ok(false) => {
                    println!("{} Tamper detected! Reblocking sites...", "!".red().bold());
                    tracing::warn!(hosts = %hosts.path().display(), "focus block was modified");
                    match hosts.reapply(&block) {
                        Ok(()) => repairs += 1,
                        Err(e) => tracing::error!(error = %e, "failed to re-apply block"),
                    }
                }
                Err(e) => tracing::warn!(error = %e, "could not read hosts file, retrying"),
            }
        }
        repairs
    })
}

/// Sleep for `interval` in short slices. Returns `false` once `stop` is set.
fn sleep_unless_stopped(interval: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    while Instant::now() < deadline {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        thread::sleep(STOP_POLL.min(interval));
    }
    !stop.load(Ordering::SeqCst)
}
