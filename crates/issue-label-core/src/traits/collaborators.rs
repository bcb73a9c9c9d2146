//! External collaborators required by the pipeline and the consumer.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::repo_config::RepoLabelSettings;

/// Title and body of an issue. Empty strings are valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueText {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Source of issue text.
#[async_trait]
pub trait IssueTextSource: Send + Sync {
    async fn get_issue_text(&self, issue_num: u64, org: &str, repo: &str)
        -> CoreResult<IssueText>;
}

/// Source of issue embeddings.
#[async_trait]
pub trait IssueEmbedder: Send + Sync {
    /// Embed an issue.
    ///
    /// # Returns
    /// - `Ok(Some(vec))` on success
    /// - `Ok(None)` when the service answered without an embedding (non-success status)
    /// - `Err(_)` only when the service could not be reached
    async fn issue_embedding(&self, title: &str, body: &str) -> CoreResult<Option<Vec<f32>>>;
}

/// Key-value blob store addressed by `(bucket, object path)`.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn download(&self, bucket: &str, object: &str, destination: &Path) -> CoreResult<()>;
}

/// Per-repository label settings.
#[async_trait]
pub trait RepoSettingsSource: Send + Sync {
    /// `Ok(None)` when the repository has no settings file.
    async fn repo_settings(&self, org: &str, repo: &str) -> CoreResult<Option<RepoLabelSettings>>;
}

/// Applies labels and posts comments on issues.
///
/// Both calls may be repeated for redelivered messages; implementations
/// must tolerate that.
#[async_trait]
pub trait LabelSink: Send + Sync {
    async fn add_labels(
        &self,
        installation_id: &str,
        org: &str,
        repo: &str,
        issue_num: u64,
        labels: &[String],
    ) -> CoreResult<()>;

    async fn create_comment(
        &self,
        installation_id: &str,
        org: &str,
        repo: &str,
        issue_num: u64,
        body: &str,
    ) -> CoreResult<()>;
}
