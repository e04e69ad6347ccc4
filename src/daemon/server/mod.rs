//! Session host with a Unix socket control channel.

mod client;
mod core;
mod lifecycle;


pub use self::core::{DaemonStatus, FocusDaemon};
