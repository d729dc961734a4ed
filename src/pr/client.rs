//! Azure DevOps REST client
//!
//! Only the endpoints `az repos` has no coverage for: pull-request comment
//! threads. Auth is the bearer token produced by the credential resolver.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};

use super::types::{CommentThread, ThreadsResponse};

const ADO_BASE_URL: &str = "https://dev.azure.com";
const API_VERSION: &str = "7.1";
const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

/// REST operations, as a trait for testability
#[async_trait]
pub trait AdoApi: Send + Sync {
    /// Fetch every comment thread of a pull request, following pagination
    async fn list_threads(
        &self,
        org: &str,
        project: &str,
        repo: &str,
        pr_id: u64,
    ) -> Result<Vec<CommentThread>>;
}

/// Production client
pub struct AdoRestClient {
    http: Client,
    token: String,
}

impl AdoRestClient {
    pub fn new(token: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent("ado-cli/0.2")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, token })
    }

    fn threads_url(org: &str, project: &str, repo: &str, pr_id: u64) -> String {
        format!(
            "{ADO_BASE_URL}/{}/{}/_apis/git/repositories/{}/pullRequests/{pr_id}/threads",
            urlencoding::encode(org),
            urlencoding::encode(project),
            urlencoding::encode(repo),
        )
    }

    /// Query string for one page of a paginated list
    fn page_query(continuation: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = vec![("api-version", API_VERSION.to_string())];
        if let Some(token) = continuation {
            query.push(("continuationToken", token.to_string()));
        }
        query
    }

    /// Continuation token of the next page, if the service sent one
    fn next_continuation(headers: &HeaderMap) -> Option<String> {
        headers
            .get(CONTINUATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Error message for statuses that mean the credentials were rejected
    fn credential_rejection(status: StatusCode) -> Option<String> {
        (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN).then(|| {
            format!(
                "Azure DevOps rejected the credentials ({status}). \
                 Check the token's scopes or run: az login"
            )
        })
    }
}

#[async_trait]
impl AdoApi for AdoRestClient {
    async fn list_threads(
        &self,
        org: &str,
        project: &str,
        repo: &str,
        pr_id: u64,
    ) -> Result<Vec<CommentThread>> {
        let url = Self::threads_url(org, project, repo, pr_id);
        let mut threads = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .query(&Self::page_query(continuation.as_deref()))
                .send()
                .await
                .context("Failed to reach Azure DevOps")?;

            let status = response.status();
            if let Some(message) = Self::credential_rejection(status) {
                bail!(message);
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                bail!("Azure DevOps API error {}: {}", status, body);
            }

            continuation = Self::next_continuation(response.headers());

            let page: ThreadsResponse = response
                .json()
                .await
                .context("Failed to parse threads response")?;
            threads.extend(page.value);

            if continuation.is_none() {
                return Ok(threads);
            }
        }
    }
}
