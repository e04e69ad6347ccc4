//! Start and end cues played around a foreground session.
//!
//! Cues are decoded and played in-process through the default output device.
//! Focus usually runs under sudo, where the user's sound server socket is only
//! reachable through their runtime directory, so `XDG_RUNTIME_DIR` is pointed
//! at it before the device is opened.

use gag::Gag;
use rodio::{Decoder, OutputStreamBuilder, Sink};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const PLAYBACK_TIMEOUT: Duration = Duration::from_secs(30);
const PLAYBACK_POLL: Duration = Duration::from_millis(50);
const FALLBACK_RUNTIME_DIR: &str = "/run/user/1000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioCues {
    pub start: PathBuf,
    pub end: PathBuf,
}

impl AudioCues {
    pub fn new(data_directory: &Path, start_audio: &str, end_audio: &str) -> Self {
        Self {
            start: data_directory.join(start_audio),
            end: data_directory.join(end_audio),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("Audio file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Audio file {} could not be decoded ({reason})", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Audio device unavailable ({0})")]
    DeviceUnavailable(String),
}

/// Runtime directory of the invoking user's session.
pub fn runtime_dir() -> String {
    if let Ok(uid) = env::var("SUDO_UID") {
        return format!("/run/user/{uid}");
    }
    if let Ok(dir) = env::var("XDG_RUNTIME_DIR") {
        return dir;
    }
    FALLBACK_RUNTIME_DIR.to_string()
}

fn point_at_user_runtime_dir() {
    if env::var_os("XDG_RUNTIME_DIR").is_none() || env::var_os("SUDO_UID").is_some() {
        env::set_var("XDG_RUNTIME_DIR", runtime_dir());
    }
}

/// Play `path` to completion, giving up after 30 seconds.
///
/// The audio backend's own chatter on stderr is silenced while the device is
/// open.
pub fn play(path: &Path) -> Result<(), PlayError> {
    let file = File::open(path).map_err(|_| PlayError::MissingFile(path.to_path_buf()))?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| PlayError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    point_at_user_runtime_dir();
    let _quiet = Gag::stderr().ok();

    let mut stream = OutputStreamBuilder::open_default_stream()
        .map_err(|e| PlayError::DeviceUnavailable(e.to_string()))?;
    stream.log_on_drop(false);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);

    let deadline = Instant::now() + PLAYBACK_TIMEOUT;
    while !sink.empty() {
        if Instant::now() >= deadline {
            sink.stop();
            return Err(PlayError::DeviceUnavailable("playback timed out".to_string()));
        }
        thread::sleep(PLAYBACK_POLL);
    }
    Ok(())
}
