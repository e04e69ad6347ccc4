use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FocusError {
    #[error("Could not read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not encode config to TOML: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("Could not write config {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to access hosts file {path}{hint}: {source}")]
    Hosts {
        path: PathBuf,
        hint: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Please provide a list of one or more URLs")]
    NoSites,

    #[error("Blocking is already active")]
    AlreadyActive,
}

impl FocusError {
    /// Wrap an IO error on the hosts file, hinting at sudo when access is denied.
    pub fn hosts(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let hint = if source.kind() == std::io::ErrorKind::PermissionDenied {
            " (are you running as sudo?)"
        } else {
            ""
        };
        FocusError::Hosts {
            path: path.into(),
            hint,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FocusError>;
