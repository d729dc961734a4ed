//! Handle `ado pr threads`
//!
//! Locates the pull request via `az repos pr show`, then pulls its comment
//! threads from the REST API with a resolver-supplied bearer token.

use anyhow::{Context, Result};

use crate::az::{AzCli, AzCliExecutor, CredentialResolver};
use crate::config::AzureSettings;

use super::cli::ThreadsArgs;
use super::client::{AdoApi, AdoRestClient};
use super::display;
use super::types::{CommentThread, OutputFormat, PullRequest};

pub async fn run(args: ThreadsArgs) -> Result<()> {
    let settings = crate::config::load_settings()?;
    let az = AzCliExecutor::new();

    let pr = show_pr(&az, &settings, args.id).await?;
    let location = ThreadLocation::of(&pr, &settings)?;

    let mut resolver = CredentialResolver::new(az);
    let token = resolver.access_token().await?;
    let client = AdoRestClient::new(token)?;

    let threads = fetch_threads(&client, &location, args.id, args.all).await?;
    display::output_threads(&pr, &threads, OutputFormat::from_json_flag(args.json))
}

/// Pull the threads of one PR, dropping system noise unless `all` is set
async fn fetch_threads(
    client: &impl AdoApi,
    location: &ThreadLocation,
    id: u64,
    all: bool,
) -> Result<Vec<CommentThread>> {
    let threads = client
        .list_threads(&location.org, &location.project, &location.repo, id)
        .await?;
    Ok(if all { threads } else { user_threads(threads) })
}

/// Fetch the PR so we know which repository and project it lives in
pub(crate) async fn show_pr(
    az: &impl AzCli,
    settings: &AzureSettings,
    id: u64,
) -> Result<PullRequest> {
    let mut line = format!("repos pr show --id {id} --output json");
    if let Some(org) = &settings.organization {
        line.push_str(&format!(" --organization https://dev.azure.com/{org}"));
    }
    let value = az.run(&line).await?;
    serde_json::from_value(value).context("Unexpected `az repos pr show` payload")
}

/// Where a pull request's threads live in the REST API
#[derive(Debug)]
pub(crate) struct ThreadLocation {
    pub org: String,
    pub project: String,
    pub repo: String,
}

impl ThreadLocation {
    pub(crate) fn of(pr: &PullRequest, settings: &AzureSettings) -> Result<Self> {
        let org = settings.organization.clone().context(
            "Azure DevOps organization is not set. \
             Add it to ~/.config/ado/settings.toml or set AZURE_DEVOPS_ORG.",
        )?;
        let project = pr
            .project_name()
            .map(str::to_string)
            .or_else(|| settings.project.clone())
            .context("Could not determine the project this pull request belongs to")?;
        let repo = pr
            .repository
            .as_ref()
            .map(|r| r.name.clone())
            .context("Pull request payload has no repository")?;
        Ok(Self { org, project, repo })
    }
}

/// Drop system activity: keep only threads with live, human comments, and
/// within them only the human comments
fn user_threads(threads: Vec<CommentThread>) -> Vec<CommentThread> {
    threads
        .into_iter()
        .filter(|t| !t.is_deleted && t.has_user_comments())
        .map(|mut t| {
            t.comments.retain(|c| c.is_user_comment());
            t
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thread(value: serde_json::Value) -> CommentThread {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn user_threads_drops_system_only_threads() {
        let threads = vec![
            thread(json!({
                "id": 1,
                "comments": [{ "id": 1, "commentType": "system", "content": "joined" }]
            })),
            thread(json!({
                "id": 2,
                "comments": [
                    { "id": 1, "commentType": "text", "content": "please rename" },
                    { "id": 2, "commentType": "system", "content": "policy" }
                ]
            })),
        ];
        let kept = user_threads(threads);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 2);
        // the system comment inside the kept thread is gone too
        assert_eq!(kept[0].comments.len(), 1);
        assert_eq!(kept[0].comments[0].content, "please rename");
    }

    #[test]
    fn user_threads_drops_deleted_threads() {
        let threads = vec![thread(json!({
            "id": 3,
            "isDeleted": true,
            "comments": [{ "id": 1, "commentType": "text", "content": "old" }]
        }))];
        assert!(user_threads(threads).is_empty());
    }

    #[test]
    fn location_prefers_pr_project_over_settings() {
        let pr: PullRequest = serde_json::from_value(json!({
            "pullRequestId": 1,
            "repository": { "name": "web", "project": { "name": "Platform" } }
        }))
        .unwrap();
        let settings = AzureSettings {
            organization: Some("contoso".to_string()),
            project: Some("Other".to_string()),
        };
        let loc = ThreadLocation::of(&pr, &settings).unwrap();
        assert_eq!(loc.org, "contoso");
        assert_eq!(loc.project, "Platform");
        assert_eq!(loc.repo, "web");
    }

    #[test]
    fn location_requires_an_organization() {
        let pr: PullRequest = serde_json::from_value(json!({
            "pullRequestId": 1,
            "repository": { "name": "web" }
        }))
        .unwrap();
        let err = ThreadLocation::of(&pr, &AzureSettings::default()).unwrap_err();
        assert!(err.to_string().contains("AZURE_DEVOPS_ORG"));
    }

    mod fetch {
        use super::*;
        use async_trait::async_trait;
        use std::sync::Mutex;

        /// Mock REST API recording what it was asked for
        struct MockAdo {
            threads: Vec<CommentThread>,
            requests: Mutex<Vec<(String, String, String, u64)>>,
        }

        #[async_trait]
        impl AdoApi for MockAdo {
            async fn list_threads(
                &self,
                org: &str,
                project: &str,
                repo: &str,
                pr_id: u64,
            ) -> Result<Vec<CommentThread>> {
                self.requests.lock().unwrap().push((
                    org.to_string(),
                    project.to_string(),
                    repo.to_string(),
                    pr_id,
                ));
                Ok(self.threads.clone())
            }
        }

        fn mock_with_mixed_threads() -> MockAdo {
            MockAdo {
                threads: vec![
                    thread(json!({
                        "id": 1,
                        "comments": [{ "id": 1, "commentType": "system", "content": "joined" }]
                    })),
                    thread(json!({
                        "id": 2,
                        "comments": [{ "id": 1, "commentType": "text", "content": "rename this" }]
                    })),
                ],
                requests: Mutex::new(vec![]),
            }
        }

        fn location() -> ThreadLocation {
            ThreadLocation {
                org: "contoso".to_string(),
                project: "Platform".to_string(),
                repo: "web".to_string(),
            }
        }

        #[tokio::test]
        async fn fetch_threads_filters_system_noise_by_default() {
            let client = mock_with_mixed_threads();
            let threads = fetch_threads(&client, &location(), 42, false).await.unwrap();
            assert_eq!(threads.len(), 1);
            assert_eq!(threads[0].id, 2);
        }

        #[tokio::test]
        async fn fetch_threads_all_keeps_everything() {
            let client = mock_with_mixed_threads();
            let threads = fetch_threads(&client, &location(), 42, true).await.unwrap();
            assert_eq!(threads.len(), 2);
        }

        #[tokio::test]
        async fn fetch_threads_addresses_the_right_pr() {
            let client = mock_with_mixed_threads();
            fetch_threads(&client, &location(), 42, false).await.unwrap();
            let requests = client.requests.lock().unwrap();
            assert_eq!(
                requests.as_slice(),
                &[(
                    "contoso".to_string(),
                    "Platform".to_string(),
                    "web".to_string(),
                    42
                )]
            );
        }
    }

    #[test]
    fn location_requires_a_repository() {
        let pr: PullRequest =
            serde_json::from_value(json!({ "pullRequestId": 1 })).unwrap();
        let settings = AzureSettings {
            organization: Some("contoso".to_string()),
            project: Some("Platform".to_string()),
        };
        assert!(ThreadLocation::of(&pr, &settings).is_err());
    }
}
