mod cli;

use clap::Parser;
use colored::Colorize;

use cli::{dispatch, Cli};

fn main() {
    let cli = Cli::parse();
    focus::logging::init(cli.verbose);

    if let Err(e) = dispatch(cli) {
        eprintln!("{} {e:#}", "✗".red().bold());
        std::process::exit(1);
    }
}
