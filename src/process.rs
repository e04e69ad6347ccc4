//! Process helpers for finding and signalling a running focus daemon.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

fn to_pid(pid: u32) -> Option<Pid> {
    i32::try_from(pid).ok().map(Pid::from_raw)
}

/// Check if a process with the given PID is alive.
///
/// Sends the null signal. `EPERM` means the process exists but belongs to
/// someone else (a root daemon seen from an unprivileged `focus status`), so
/// it counts as alive.
pub fn is_process_alive(pid: u32) -> bool {
    let Some(pid) = to_pid(pid) else {
        return false;
    };

    match kill(pid, None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Check whether `pid` is running the same executable as this process.
///
/// A PID file outlives its process across crashes and reboots, and the PID
/// may since have been handed to something unrelated.
///
/// # Returns
/// `Some(true)` for a focus process, `Some(false)` for anything else, and
/// `None` when `/proc/<pid>/exe` cannot be read (process gone, owned by
/// another user, or no procfs).
pub fn is_focus_process(pid: u32) -> Option<bool> {
    let ours = std::env::current_exe().ok()?;
    let theirs = fs::read_link(format!("/proc/{pid}/exe")).ok()?;
    Some(without_deleted_suffix(&theirs) == without_deleted_suffix(&ours))
}

/// The kernel appends " (deleted)" to the exe link once the binary is replaced.
fn without_deleted_suffix(path: &Path) -> PathBuf {
    match path.as_os_str().as_bytes().strip_suffix(b" (deleted)") {
        Some(trimmed) => PathBuf::from(OsStr::from_bytes(trimmed)),
        None => path.to_path_buf(),
    }
}

/// Ask a process to exit with SIGTERM.
pub fn terminate(pid: u32) -> nix::Result<()> {
    let Some(pid) = to_pid(pid) else {
        return Err(Errno::ESRCH);
    };
    kill(pid, Signal::SIGTERM)
}

/// Poll until `pid` is gone or `timeout` passes. Returns whether it exited.
pub fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !is_process_alive(pid) {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    !is_process_alive(pid)
}
