//! In-memory collaborators.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use issue_label_core::error::{CoreError, CoreResult};
use issue_label_core::repo_config::RepoLabelSettings;
use issue_label_core::traits::{
    ArtifactStore, IssueEmbedder, IssueText, IssueTextSource, LabelSink, RepoSettingsSource,
};

/// Issues keyed by `(org, repo, number)`.
#[derive(Default)]
pub struct InMemoryIssueSource {
    issues: HashMap<(String, String, u64), IssueText>,
}

impl InMemoryIssueSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(mut self, org: &str, repo: &str, issue_num: u64, title: &str, body: &str) -> Self {
        self.issues.insert(
            (org.to_string(), repo.to_string(), issue_num),
            IssueText {
                title: title.to_string(),
                body: body.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl IssueTextSource for InMemoryIssueSource {
    async fn get_issue_text(&self, issue_num: u64, org: &str, repo: &str) -> CoreResult<IssueText> {
        self.issues
            .get(&(org.to_string(), repo.to_string(), issue_num))
            .cloned()
            .ok_or_else(|| {
                CoreError::collaborator("github", format!("{}/{}#{} not found", org, repo, issue_num))
            })
    }
}

/// Returns the same embedding (or none) for every issue.
pub struct StaticEmbedder {
    embedding: Option<Vec<f32>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StaticEmbedder {
    pub fn new(embedding: Vec<f32>) -> Self {
        Self {
            embedding: Some(embedding),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Behaves like a service answering with a non-success status.
    pub fn unavailable() -> Self {
        Self {
            embedding: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(title, body)` of every request.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl IssueEmbedder for StaticEmbedder {
    async fn issue_embedding(&self, title: &str, body: &str) -> CoreResult<Option<Vec<f32>>> {
        self.calls.lock().push((title.to_string(), body.to_string()));
        Ok(self.embedding.clone())
    }
}

/// Settings per `org/repo`; unknown repositories have none.
#[derive(Default)]
pub struct StaticRepoSettings {
    settings: HashMap<String, RepoLabelSettings>,
}

impl StaticRepoSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_list(mut self, org: &str, repo: &str, labels: &[&str]) -> Self {
        self.settings.insert(
            format!("{}/{}", org, repo),
            RepoLabelSettings {
                predicted_labels: Some(labels.iter().map(|l| l.to_string()).collect()),
            },
        );
        self
    }
}

#[async_trait]
impl RepoSettingsSource for StaticRepoSettings {
    async fn repo_settings(&self, org: &str, repo: &str) -> CoreResult<Option<RepoLabelSettings>> {
        Ok(self.settings.get(&format!("{}/{}", org, repo)).cloned())
    }
}

/// One side effect observed by [`RecordingLabelSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelAction {
    AddLabels {
        installation_id: String,
        issue: String,
        labels: Vec<String>,
    },
    Comment {
        installation_id: String,
        issue: String,
        body: String,
    },
}

/// Records every call in order.
#[derive(Default)]
pub struct RecordingLabelSink {
    actions: Mutex<Vec<LabelAction>>,
    fail: bool,
}

impl RecordingLabelSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose calls all fail after being recorded.
    pub fn failing() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn actions(&self) -> Vec<LabelAction> {
        self.actions.lock().clone()
    }

    pub fn labels_added(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                LabelAction::AddLabels { labels, .. } => Some(labels),
                LabelAction::Comment { .. } => None,
            })
            .flatten()
            .collect()
    }

    pub fn comments(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                LabelAction::Comment { body, .. } => Some(body),
                LabelAction::AddLabels { .. } => None,
            })
            .collect()
    }

    fn record(&self, action: LabelAction) -> CoreResult<()> {
        self.actions.lock().push(action);
        if self.fail {
            return Err(CoreError::collaborator("github", "label sink unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl LabelSink for RecordingLabelSink {
    async fn add_labels(
        &self,
        installation_id: &str,
        org: &str,
        repo: &str,
        issue_num: u64,
        labels: &[String],
    ) -> CoreResult<()> {
        self.record(LabelAction::AddLabels {
            installation_id: installation_id.to_string(),
            issue: format!("{}/{}#{}", org, repo, issue_num),
            labels: labels.to_vec(),
        })
    }

    async fn create_comment(
        &self,
        installation_id: &str,
        org: &str,
        repo: &str,
        issue_num: u64,
        body: &str,
    ) -> CoreResult<()> {
        self.record(LabelAction::Comment {
            installation_id: installation_id.to_string(),
            issue: format!("{}/{}#{}", org, repo, issue_num),
            body: body.to_string(),
        })
    }
}

/// Objects held in memory, written to the requested destination on download.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    objects: HashMap<(String, String), Vec<u8>>,
    downloads: Mutex<Vec<(String, String, PathBuf)>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, bucket: &str, object: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.objects
            .insert((bucket.to_string(), object.to_string()), contents.into());
        self
    }

    /// `(bucket, object, destination)` of every download, in order.
    pub fn downloads(&self) -> Vec<(String, String, PathBuf)> {
        self.downloads.lock().clone()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn download(&self, bucket: &str, object: &str, destination: &Path) -> CoreResult<()> {
        self.downloads
            .lock()
            .push((bucket.to_string(), object.to_string(), destination.to_path_buf()));

        let contents = self
            .objects
            .get(&(bucket.to_string(), object.to_string()))
            .ok_or_else(|| CoreError::collaborator("storage", format!("gs://{}/{} not found", bucket, object)))?;
        tokio::fs::write(destination, contents).await?;
        Ok(())
    }
}
