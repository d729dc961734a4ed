mod az;
mod cli;
mod config;
mod pr;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Pr { cmd: Some(cmd) }) => pr::run(cmd).await,
        Some(Command::Pr { cmd: None }) => print_subcommand_help("pr"),
        Some(Command::Auth { json }) => az::show_auth(json).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Show help for a subcommand invoked without an action
fn print_subcommand_help(name: &str) -> Result<()> {
    let mut command = Cli::command();
    if let Some(sub) = command.find_subcommand_mut(name) {
        sub.print_help()?;
    }
    Ok(())
}
