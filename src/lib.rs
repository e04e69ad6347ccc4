pub mod audio;
pub mod commands;
pub mod completions;
pub mod config;
pub mod daemon;
pub mod dns;
pub mod error;
pub mod hosts;
pub mod logging;
pub mod process;
pub mod session;

pub use error::{FocusError, Result};
