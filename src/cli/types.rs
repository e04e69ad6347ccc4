use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "focus")]
#[command(about = "Block distracting websites for a focused stretch of time", long_about = None)]
#[command(version)]
#[command(subcommand_help_heading = "Commands")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Session length in minutes (0 blocks until `focus stop`)
    #[arg(short, long, global = true)]
    pub duration: Option<u64>,

    /// Run the session in the background
    #[arg(short, long, global = true, default_value_t = false)]
    pub background: bool,

    /// Block until `focus stop`, ignoring the duration
    #[arg(short, long, global = true, default_value_t = false)]
    pub forever: bool,

    /// Hosts file to edit instead of the configured one
    #[arg(short, long, global = true)]
    pub path: Option<String>,

    /// Config file (defaults to $FOCUS_CONFIG, then /usr/local/etc/focus/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start a focus session (the default when no command is given)
    Start,

    /// Show whether a session is running and sites are blocked
    Status,

    /// End the running session and unblock sites
    Stop,

    /// Add sites to the block list
    Add {
        /// Hostnames or URLs to block
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
    },

    /// Remove sites from the block list
    Remove {
        /// Hostnames or URLs to unblock
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
    },

    /// Print the block list
    List,

    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish)
        shell: String,
    },
}
