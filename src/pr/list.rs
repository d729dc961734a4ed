//! Handle `ado pr list`
//!
//! Fetches PRs created by the caller and PRs assigned to them for review via
//! two `az repos pr list` invocations, merges the two sets and renders them.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::az::{AzCli, AzCliExecutor};
use crate::config::AzureSettings;

use super::cli::{ListArgs, Role};
use super::display;
use super::types::{OutputFormat, PullRequest};

pub async fn run(args: ListArgs) -> Result<()> {
    let settings = crate::config::load_settings()?;
    let az = AzCliExecutor::new();
    let prs = fetch_prs(&az, &settings, &args).await?;
    display::output_prs(&prs, OutputFormat::from_json_flag(args.json))
}

/// Fetch and merge PRs for the requested role(s)
async fn fetch_prs(
    az: &impl AzCli,
    settings: &AzureSettings,
    args: &ListArgs,
) -> Result<Vec<PullRequest>> {
    let (created, reviewing) = match args.role {
        Role::Creator => (fetch_role(az, settings, args, "--creator").await?, vec![]),
        Role::Reviewer => (vec![], fetch_role(az, settings, args, "--reviewer").await?),
        Role::All => {
            // independent lookups, interleaved at the event loop
            let (created, reviewing) = tokio::join!(
                fetch_role(az, settings, args, "--creator"),
                fetch_role(az, settings, args, "--reviewer"),
            );
            (created?, reviewing?)
        }
    };
    Ok(merge_prs(created, reviewing))
}

async fn fetch_role(
    az: &impl AzCli,
    settings: &AzureSettings,
    args: &ListArgs,
    role_flag: &str,
) -> Result<Vec<PullRequest>> {
    let line = list_command(settings, args, role_flag);
    let value = az.run(&line).await?;
    serde_json::from_value(value).context("Unexpected `az repos pr list` payload")
}

/// Build one `az repos pr list` command line
fn list_command(settings: &AzureSettings, args: &ListArgs, role_flag: &str) -> String {
    let mut line = format!(
        "repos pr list {role_flag} @me --status {} --top {} --output json",
        args.status, args.limit
    );
    if let Some(org) = &settings.organization {
        line.push_str(&format!(" --organization https://dev.azure.com/{org}"));
    }
    if let Some(project) = &settings.project {
        // quoted: project names may contain spaces
        line.push_str(&format!(" --project \"{project}\""));
    }
    line
}

/// Merge the two result sets: dedup by pull-request id (first occurrence
/// wins), newest first
pub(crate) fn merge_prs(
    created: Vec<PullRequest>,
    reviewing: Vec<PullRequest>,
) -> Vec<PullRequest> {
    let mut seen = HashSet::new();
    let mut merged: Vec<PullRequest> = created
        .into_iter()
        .chain(reviewing)
        .filter(|pr| seen.insert(pr.pull_request_id))
        .collect();
    merged.sort_by_key(|pr| std::cmp::Reverse(creation_instant(pr)));
    merged
}

/// Parse the creation date, treating unparseable dates as the epoch so they
/// sort last
fn creation_instant(pr: &PullRequest) -> DateTime<Utc> {
    pr.creation_date
        .as_deref()
        .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
