mod protocol;
mod server;

pub use protocol::{read_message, write_message, Request, Response};
pub use server::{DaemonStatus, FocusDaemon};
