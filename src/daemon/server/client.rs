//! Client connection handling.

use super::super::protocol::{read_message, write_message, Request, Response};
use crate::session::SessionInfo;
use anyhow::Result;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Serve requests on one connection until the client hangs up or asks to stop.
pub fn handle_client_connection(
    mut stream: UnixStream,
    info: Arc<SessionInfo>,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<()> {
    loop {
        let request: Request = match read_message(&mut stream) {
            Ok(req) => req,
            Err(_) => break,
        };
        tracing::debug!(?request, "control request");

        match request {
            Request::Ping => write_message(&mut stream, &Response::Pong)?,
            Request::Status => write_message(&mut stream, &Response::Status((*info).clone()))?,
            Request::Stop => {
                tracing::info!("stop requested over the control socket");
                shutdown_flag.store(true, Ordering::SeqCst);
                write_message(&mut stream, &Response::Ok)?;
                break;
            }
        }
    }

    Ok(())
}
