//! Pull request operations
//!
//! Listing via `az repos pr list`, review threads via the REST API, and
//! opening PRs in the browser.

mod cli;
mod client;
mod display;
mod list;
mod threads;
pub mod types;

use anyhow::{Context, Result};

pub use cli::PrCommand;
use cli::OpenArgs;

use crate::az::AzCliExecutor;
use crate::config::AzureSettings;
use threads::{show_pr, ThreadLocation};

/// Run a pull request subcommand
pub async fn run(cmd: PrCommand) -> Result<()> {
    match cmd {
        PrCommand::List(args) => list::run(args).await,
        PrCommand::Threads(args) => threads::run(args).await,
        PrCommand::Open(args) => cmd_open(args).await,
    }
}

/// Open a PR's web page in the default browser
async fn cmd_open(args: OpenArgs) -> Result<()> {
    let settings = crate::config::load_settings()?;
    let az = AzCliExecutor::new();
    let pr = show_pr(&az, &settings, args.id).await?;
    let url = pr_web_url(&pr, &settings, args.id)?;

    println!("Opening {url}");
    open::that(&url).with_context(|| format!("Failed to open {url}"))
}

fn pr_web_url(
    pr: &crate::pr::types::PullRequest,
    settings: &AzureSettings,
    id: u64,
) -> Result<String> {
    let loc = ThreadLocation::of(pr, settings)?;
    Ok(format!(
        "https://dev.azure.com/{}/{}/_git/{}/pullrequest/{id}",
        urlencoding::encode(&loc.org),
        urlencoding::encode(&loc.project),
        urlencoding::encode(&loc.repo),
    ))
}
