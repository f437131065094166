//! styleguard — incremental CSS audit pipeline

use anyhow::Result;
use clap::Parser;
use styleguard_cli::{run, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Init { path }) => {
            styleguard_cli::init::run(path.as_deref())?;
            Ok(())
        }
        None => {
            let exit_code = run(&cli)?;
            std::process::exit(exit_code);
        }
    }
}
