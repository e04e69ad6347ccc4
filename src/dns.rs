//! Resolver cache flushing so hosts changes take effect immediately.

use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    Flushed,
    /// No supported resolver tool on PATH.
    Unsupported,
    Failed(String),
}

/// Flush the systemd-resolved cache. Never fatal: blocking still works once
/// cached entries expire.
pub fn flush_cache() -> FlushOutcome {
    let Ok(resolvectl) = which::which("resolvectl") else {
        tracing::debug!("resolvectl not found, skipping DNS flush");
        return FlushOutcome::Unsupported;
    };

    let mut child = match Command::new(&resolvectl)
        .arg("flush-caches")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return FlushOutcome::Failed(format!("failed to run resolvectl: {e}")),
    };

    match child.wait_timeout(FLUSH_TIMEOUT) {
        Ok(Some(status)) if status.success() => FlushOutcome::Flushed,
        Ok(Some(status)) => FlushOutcome::Failed(format!("resolvectl exited with {status}")),
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            FlushOutcome::Failed(format!(
                "resolvectl timed out after {}s",
                FLUSH_TIMEOUT.as_secs()
            ))
        }
        Err(e) => FlushOutcome::Failed(format!("failed to wait for resolvectl: {e}")),
    }
}
