use crate::session::SessionInfo;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Largest message accepted from the socket.
const MAX_MESSAGE_LEN: usize = 10 * 1024 * 1024;

/// Client request to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Ping to check if daemon is alive
    Ping,
    /// Ask for the running session
    Status,
    /// End the session early and shut down
    Stop,
}

/// Daemon response to client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Ok,
    Pong,
    Status(SessionInfo),
    Error { message: String },
}

/// Write a length-prefixed JSON message to a stream.
///
/// Format: 4-byte big-endian length prefix + JSON data
pub fn write_message<T: Serialize, W: Write>(stream: &mut W, message: &T) -> Result<()> {
    let json = serde_json::to_vec(message).context("Failed to serialize message")?;
    let len = u32::try_from(json.len()).context("Message too large to send")?;

    stream
        .write_all(&len.to_be_bytes())
        .context("Failed to write message length")?;
    stream
        .write_all(&json)
        .context("Failed to write message body")?;
    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read a length-prefixed JSON message from a stream.
pub fn read_message<T: for<'de> Deserialize<'de>, R: Read>(stream: &mut R) -> Result<T> {
    let mut len_bytes = [0u8; 4];
    stream
        .read_exact(&mut len_bytes)
        .context("Failed to read message length")?;
    let len = u32::from_be_bytes(len_bytes) as usize;

    if len > MAX_MESSAGE_LEN {
        anyhow::bail!("Message too large: {len} bytes");
    }

    let mut json_bytes = vec![0u8; len];
    stream
        .read_exact(&mut json_bytes)
        .context("Failed to read message body")?;

    serde_json::from_slice(&json_bytes).context("Failed to deserialize message")
}
