//! Azure DevOps data types
//!
//! Shapes of `az repos pr` output and of the REST thread payloads. Fields we
//! do not consume are omitted; everything optional is defaulted so partial
//! payloads still deserialize.

use serde::{Deserialize, Serialize};

/// Output format for commands supporting `--json`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// A pull request as returned by `az repos pr list` / `az repos pr show`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub pull_request_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub created_by: Option<IdentityRef>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub source_ref_name: String,
    #[serde(default)]
    pub target_ref_name: String,
    #[serde(default)]
    pub repository: Option<PrRepository>,
}

impl PullRequest {
    /// Display name of the author, falling back to the unique name
    pub fn author(&self) -> &str {
        self.created_by
            .as_ref()
            .map(IdentityRef::display)
            .unwrap_or("-")
    }

    pub fn repo_name(&self) -> &str {
        self.repository.as_ref().map(|r| r.name.as_str()).unwrap_or("-")
    }

    pub fn project_name(&self) -> Option<&str> {
        self.repository
            .as_ref()
            .and_then(|r| r.project.as_ref())
            .map(|p| p.name.as_str())
    }

    /// Branch name without the `refs/heads/` prefix
    pub fn source_branch(&self) -> &str {
        strip_ref(&self.source_ref_name)
    }
}

fn strip_ref(name: &str) -> &str {
    name.strip_prefix("refs/heads/").unwrap_or(name)
}

/// A user reference in az/REST payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub unique_name: String,
}

impl IdentityRef {
    pub fn display(&self) -> &str {
        if self.display_name.is_empty() {
            &self.unique_name
        } else {
            &self.display_name
        }
    }
}

/// Repository a pull request belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrRepository {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub name: String,
}

/// A review thread from the REST `threads` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub thread_context: Option<ThreadContext>,
}

impl CommentThread {
    /// True iff the thread has at least one human-authored, non-deleted
    /// comment
    pub fn has_user_comments(&self) -> bool {
        self.comments.iter().any(|c| c.is_user_comment())
    }
}

/// File location a thread is anchored to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadContext {
    #[serde(default)]
    pub file_path: Option<String>,
}

/// A single comment within a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub author: Option<IdentityRef>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub comment_type: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Comment {
    pub fn is_user_comment(&self) -> bool {
        !self.is_deleted && self.comment_type.as_deref() != Some("system")
    }

    pub fn author_name(&self) -> &str {
        self.author.as_ref().map(IdentityRef::display).unwrap_or("-")
    }
}

/// Envelope of REST list responses
#[derive(Debug, Deserialize)]
pub struct ThreadsResponse {
    #[serde(default)]
    pub value: Vec<CommentThread>,
}
