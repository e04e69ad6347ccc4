//! Core FocusDaemon struct, status checks and client-side helpers.

use super::super::protocol::{read_message, write_message, Request, Response};
use crate::config::{err_file, out_file, pid_file, socket_file};
use crate::process::{is_focus_process, is_process_alive};
use crate::session::SessionInfo;
use anyhow::{bail, Context, Result};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Maximum number of concurrent client connections allowed.
pub(super) const MAX_CONNECTIONS: usize = 16;

/// How long a client waits for the daemon to answer.
pub(super) const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Daemon status indicating process and socket state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonStatus {
    /// No focus process found
    NotRunning,
    /// Process running and socket responsive
    Running,
    /// Process exists but the socket is unreachable (hung, or still starting)
    ProcessOnly,
}

/// Hosts a session and answers status and stop requests on a Unix socket.
pub struct FocusDaemon {
    pub(super) run_dir: PathBuf,
    pub(super) socket_path: PathBuf,
    pub(super) pid_path: PathBuf,
    pub(super) out_path: PathBuf,
    pub(super) err_path: PathBuf,
    pub(super) shutdown_flag: Arc<AtomicBool>,
    pub(super) connection_count: Arc<AtomicUsize>,
}

impl FocusDaemon {
    /// Create a daemon whose run files live in `run_dir`.
    ///
    /// # Arguments
    /// * `run_dir` - The configured `log_directory`; created on start if missing
    pub fn new(run_dir: &Path) -> Self {
        Self {
            run_dir: run_dir.to_path_buf(),
            socket_path: socket_file(run_dir),
            pid_path: pid_file(run_dir),
            out_path: out_file(run_dir),
            err_path: err_file(run_dir),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            connection_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Flag that ends the session when raised.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_flag)
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
    }

    /// Check daemon status with a socket connectivity test.
    ///
    /// Stale PID and socket files left by a crashed session are removed. A PID
    /// that now belongs to some other program counts as stale.
    ///
    /// # Arguments
    /// * `run_dir` - Directory holding `focus.pid` and `focus.sock`
    ///
    /// # Returns
    /// `DaemonStatus` indicating whether a session is running and responsive
    pub fn check_status(run_dir: &Path) -> DaemonStatus {
        let pid_path = pid_file(run_dir);
        let socket_path = socket_file(run_dir);

        let Some(pid) = Self::read_pid(run_dir) else {
            if pid_path.exists() {
                tracing::debug!(path = %pid_path.display(), "removing unreadable PID file");
                let _ = std::fs::remove_file(&pid_path);
            }
            if socket_path.exists() {
                let _ = std::fs::remove_file(&socket_path);
            }
            return DaemonStatus::NotRunning;
        };

        let alive = is_process_alive(pid);
        let identity = if alive { is_focus_process(pid) } else { None };

        if !alive || identity == Some(false) {
            tracing::debug!(pid, alive, "removing stale run files");
            let _ = std::fs::remove_file(&pid_path);
            let _ = std::fs::remove_file(&socket_path);
            return DaemonStatus::NotRunning;
        }

        if !socket_path.exists() {
            // A focus process without a socket is still starting up
            return if identity == Some(true) {
                DaemonStatus::ProcessOnly
            } else {
                DaemonStatus::NotRunning
            };
        }

        match UnixStream::connect(&socket_path) {
            Ok(_) => DaemonStatus::Running,
            Err(_) => DaemonStatus::ProcessOnly,
        }
    }

    /// `true` if a session process exists, responsive or not.
    pub fn is_running(run_dir: &Path) -> bool {
        matches!(
            Self::check_status(run_dir),
            DaemonStatus::Running | DaemonStatus::ProcessOnly
        )
    }

    /// Read the PID from the PID file.
    ///
    /// # Returns
    /// `None` when the file is missing or does not hold a number
    pub fn read_pid(run_dir: &Path) -> Option<u32> {
        std::fs::read_to_string(pid_file(run_dir))
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
    }

    /// Send one request and wait for its response.
    ///
    /// # Arguments
    /// * `run_dir` - Directory holding the session's socket
    /// * `request` - The request to send
    ///
    /// # Returns
    /// The daemon's response, or an error when it cannot be reached or does
    /// not answer within five seconds
    pub fn request(run_dir: &Path, request: &Request) -> Result<Response> {
        let socket_path = socket_file(run_dir);
        let mut stream =
            UnixStream::connect(&socket_path).context("Failed to connect to focus socket")?;
        stream
            .set_read_timeout(Some(RESPONSE_TIMEOUT))
            .context("Failed to set read timeout")?;

        write_message(&mut stream, request).context("Failed to send request")?;

        match read_message(&mut stream) {
            Ok(response) => Ok(response),
            Err(e) => {
                if let Some(io_err) = e.downcast_ref::<std::io::Error>() {
                    if matches!(
                        io_err.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) {
                        bail!(
                            "Focus did not respond within {} seconds. \
                             It may be frozen. Try: kill $(cat {})",
                            RESPONSE_TIMEOUT.as_secs(),
                            pid_file(run_dir).display()
                        );
                    }
                }
                Err(e).context("Failed to read response")
            }
        }
    }

    /// Fetch the running session's details.
    pub fn query_status(run_dir: &Path) -> Result<SessionInfo> {
        match Self::request(run_dir, &Request::Status)? {
            Response::Status(info) => Ok(info),
            Response::Error { message } => bail!("Focus returned error: {message}"),
            other => bail!("Unexpected response from focus: {other:?}"),
        }
    }
}
