//! Daemon lifecycle: start, serve, stop.

use super::client::handle_client_connection;
use super::core::{DaemonStatus, FocusDaemon, MAX_CONNECTIONS, RESPONSE_TIMEOUT};
use super::super::protocol::{Request, Response};
use crate::process::{is_focus_process, terminate, wait_for_exit};
use crate::session::{Session, SessionInfo, SessionOutcome};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use nix::unistd::{fork, setsid, ForkResult};
use std::fs::{self, File, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long `stop` waits for the session process to exit.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the launching process waits for the detached daemon to come up.
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(3);

const ACCEPT_POLL: Duration = Duration::from_millis(100);

impl FocusDaemon {
    /// Stop the session running out of `run_dir` and wait for it to exit.
    ///
    /// Asks over the socket first and falls back to SIGTERM when the daemon
    /// is unresponsive. SIGTERM is only sent to a process confirmed to be
    /// focus.
    ///
    /// # Arguments
    /// * `run_dir` - Directory holding the session's PID file and socket
    ///
    /// # Returns
    /// The PID that was stopped
    pub fn stop(run_dir: &Path) -> Result<u32> {
        let status = Self::check_status(run_dir);
        let pid = match (status, Self::read_pid(run_dir)) {
            (DaemonStatus::NotRunning, _) | (_, None) => {
                bail!("No active focus session found to stop")
            }
            (_, Some(pid)) => pid,
        };

        if status == DaemonStatus::Running {
            match Self::request(run_dir, &Request::Stop) {
                Ok(Response::Ok) => {}
                Ok(other) => {
                    tracing::warn!(?other, "unexpected stop response, sending SIGTERM");
                    Self::force_stop(pid)?;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stop request failed, sending SIGTERM");
                    Self::force_stop(pid)?;
                }
            }
        } else {
            Self::force_stop(pid)?;
        }

        if !wait_for_exit(pid, STOP_TIMEOUT) {
            bail!(
                "Focus (pid {pid}) did not exit within {} seconds",
                STOP_TIMEOUT.as_secs()
            );
        }
        Ok(pid)
    }

    /// SIGTERM `pid`, but only once it is known to be a focus process.
    fn force_stop(pid: u32) -> Result<()> {
        match is_focus_process(pid) {
            Some(true) => terminate(pid).context("Failed to signal focus process"),
            Some(false) => bail!("Refusing to signal pid {pid}: it is not a focus process"),
            None => bail!(
                "Cannot confirm that pid {pid} is a focus process (are you running as sudo?)"
            ),
        }
    }

    /// Detach into the background and run `session` there.
    ///
    /// The calling process exits once the daemon answers on its socket.
    /// Only the detached grandchild returns from this function.
    ///
    /// # Arguments
    /// * `session` - The session to run inside the daemon
    ///
    /// # Returns
    /// How the session ended, in the daemon process only
    pub fn start(&self, session: &Session) -> Result<SessionOutcome> {
        self.prepare_run_dir()?;

        // First fork - parent reports the launch and exits
        match unsafe { fork() }.context("First fork failed")? {
            ForkResult::Parent { .. } => {
                self.report_launch();
                std::process::exit(0);
            }
            ForkResult::Child => {}
        }

        // Create new session (detach from controlling terminal)
        setsid().context("setsid failed")?;

        // Second fork - prevents acquiring a controlling terminal
        match unsafe { fork() }.context("Second fork failed")? {
            ForkResult::Parent { .. } => std::process::exit(0),
            ForkResult::Child => {}
        }

        std::env::set_current_dir(&self.run_dir)
            .context("Failed to change to the run directory")?;
        self.write_pid()?;

        let out_file = File::create(&self.out_path).context("Failed to create output log")?;
        let err_file = File::create(&self.err_path).context("Failed to create error log")?;

        // Close stdin and redirect stdout/stderr to the run directory
        unsafe {
            libc::close(0);
            if libc::dup2(out_file.as_raw_fd(), 1) < 0 {
                bail!("Failed to redirect stdout");
            }
            if libc::dup2(err_file.as_raw_fd(), 2) < 0 {
                bail!("Failed to redirect stderr");
            }
        }

        self.install_signal_handler()?;
        self.serve(session)
    }

    /// Run `session` attached to the terminal, still answering on the socket.
    ///
    /// Writes the PID file and installs the signal handler exactly like the
    /// background path, so `focus status` and `focus stop` work the same way.
    pub fn run_foreground(&self, session: &Session) -> Result<SessionOutcome> {
        self.prepare_run_dir()?;
        self.write_pid()?;
        self.install_signal_handler()?;
        self.serve(session)
    }

    /// Bind the socket, run the session, then remove the run files.
    pub(super) fn serve(&self, session: &Session) -> Result<SessionOutcome> {
        let listener =
            UnixListener::bind(&self.socket_path).context("Failed to bind Unix socket")?;

        // Owner read/write only: stopping a session needs the same rights as starting it
        fs::set_permissions(&self.socket_path, Permissions::from_mode(0o600))
            .context("Failed to set socket permissions")?;
        listener
            .set_nonblocking(true)
            .context("Failed to set socket to non-blocking")?;

        let info = Arc::new(session.info(std::process::id()));
        let done = Arc::new(AtomicBool::new(false));
        let acceptor = self.spawn_acceptor(listener, info, Arc::clone(&done));

        let result = session.run(&self.shutdown_flag);

        done.store(true, Ordering::SeqCst);
        if acceptor.join().is_err() {
            tracing::error!("socket acceptor thread panicked");
        }

        let cleanup = self.cleanup();
        let outcome = result?;
        cleanup?;
        Ok(outcome)
    }

    fn spawn_acceptor(
        &self,
        listener: UnixListener,
        info: Arc<SessionInfo>,
        done: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let shutdown_flag = Arc::clone(&self.shutdown_flag);
        let connection_count = Arc::clone(&self.connection_count);

        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _addr)) => {
                        let current = connection_count.load(Ordering::SeqCst);
                        if current >= MAX_CONNECTIONS {
                            tracing::warn!("connection limit reached ({MAX_CONNECTIONS}), rejecting");
                            drop(stream);
                            continue;
                        }
                        if stream.set_nonblocking(false).is_err()
                            || stream.set_read_timeout(Some(RESPONSE_TIMEOUT)).is_err()
                        {
                            continue;
                        }

                        connection_count.fetch_add(1, Ordering::SeqCst);
                        let info = Arc::clone(&info);
                        let shutdown_flag = Arc::clone(&shutdown_flag);
                        let connection_count = Arc::clone(&connection_count);

                        thread::spawn(move || {
                            let result = handle_client_connection(stream, info, shutdown_flag);
                            connection_count.fetch_sub(1, Ordering::SeqCst);
                            if let Err(e) = result {
                                tracing::warn!(error = %e, "client handler error");
                            }
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(ACCEPT_POLL);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept error");
                        break;
                    }
                }
            }
        })
    }

    /// Signals only raise the shutdown flag; the session thread cleans up.
    fn install_signal_handler(&self) -> Result<()> {
        let flag = self.shutdown_flag();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .context("Failed to set signal handler")
    }

    fn prepare_run_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.run_dir).with_context(|| {
            format!(
                "Failed to create run directory {}",
                self.run_dir.display()
            )
        })?;
        // Ignore NotFound to avoid TOCTOU race
        if let Err(e) = fs::remove_file(&self.socket_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e).context("Failed to remove stale socket file");
            }
        }
        Ok(())
    }

    /// Write the PID file via rename so readers never see it half written.
    fn write_pid(&self) -> Result<()> {
        let tmp = self.pid_path.with_extension("pid.tmp");
        fs::write(&tmp, format!("{}", std::process::id())).context("Failed to write PID file")?;
        fs::rename(&tmp, &self.pid_path).context("Failed to write PID file")
    }

    /// Runs in the launching process: wait for the daemon's socket to answer.
    fn report_launch(&self) {
        let deadline = Instant::now() + LAUNCH_TIMEOUT;
        while Instant::now() < deadline {
            // Not check_status: that would delete a PID file caught mid-write.
            if let Some(pid) = Self::read_pid(&self.run_dir) {
                if UnixStream::connect(&self.socket_path).is_ok() {
                    println!(
                        "{} Focus running in background (pid {pid})",
                        "✓".green().bold()
                    );
                    return;
                }
            }
            thread::sleep(Duration::from_millis(50));
        }
        println!(
            "{} Focus did not report in yet. Check {}",
            "!".yellow().bold(),
            self.err_path.display()
        );
    }

    /// Remove socket and PID files.
    pub(super) fn cleanup(&self) -> Result<()> {
        if let Err(e) = fs::remove_file(&self.socket_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e).context("Failed to remove socket file");
            }
        }
        if let Err(e) = fs::remove_file(&self.pid_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e).context("Failed to remove PID file");
            }
        }
        Ok(())
    }
}
