use anyhow::Result;
use clap::CommandFactory;
use focus::commands::start::StartOptions;
use focus::commands::{sites, start, status, stop};
use focus::completions::{generate_completions, Shell};
use std::str::FromStr;

use super::types::{Cli, Commands};

pub fn dispatch(cli: Cli) -> Result<()> {
    let config = cli.config.clone();

    match cli.command {
        None | Some(Commands::Start) => {
            start::execute(StartOptions {
                config,
                hosts_path: cli.path,
                duration: cli.duration,
                background: cli.background,
                forever: cli.forever,
            })?;
            Ok(())
        }
        Some(Commands::Status) => status::execute(config),
        Some(Commands::Stop) => stop::execute(config),
        Some(Commands::Add { urls }) => sites::add(config, urls).map(|_| ()),
        Some(Commands::Remove { urls }) => sites::remove(config, urls).map(|_| ()),
        Some(Commands::List) => sites::list(config),
        Some(Commands::Completions { shell }) => {
            let shell = Shell::from_str(&shell)?;
            generate_completions(&mut Cli::command(), shell);
            Ok(())
        }
    }
}
