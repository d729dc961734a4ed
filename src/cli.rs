use clap::{Parser, Subcommand};

use crate::pr::PrCommand;

#[derive(Parser)]
#[command(name = "ado")]
#[command(about = "Azure DevOps pull request CLI", long_about = None)]
#[command(version)]
#[command(after_help = "\x1b[2mExamples:\x1b[0m
    ado pr list                            \x1b[2m# Your open PRs (created + reviewing)\x1b[0m
    ado pr list -r creator --json          \x1b[2m# PRs you created, as JSON\x1b[0m
    ado pr threads 4217                    \x1b[2m# Review comment threads of PR 4217\x1b[0m
    ado pr open 4217                       \x1b[2m# Open PR 4217 in the browser\x1b[0m
    ado auth                               \x1b[2m# Show how credentials resolve\x1b[0m")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Pull request operations (list, threads, open)
    Pr {
        #[command(subcommand)]
        cmd: Option<PrCommand>,
    },

    /// Show the resolved credential source and subscription
    Auth {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}
