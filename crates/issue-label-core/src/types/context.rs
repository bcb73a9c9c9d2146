//! Observability bundle passed alongside every prediction call.

use std::sync::OnceLock;

/// `{org, repo, issue}` identity attached to model logs.
///
/// Models must not change their output based on the context. The only
/// thing a model may record here is the issue embedding it used, which the
/// pipeline hands back to callers that want it.
#[derive(Debug, Clone, Default)]
pub struct PredictionContext {
    pub repo_owner: String,
    pub repo_name: String,
    pub issue_num: Option<u64>,
    embedding: OnceLock<Vec<f32>>,
}

impl PredictionContext {
    pub fn for_issue(repo_owner: &str, repo_name: &str, issue_num: u64) -> Self {
        Self {
            repo_owner: repo_owner.to_string(),
            repo_name: repo_name.to_string(),
            issue_num: Some(issue_num),
            embedding: OnceLock::new(),
        }
    }

    pub fn for_repo(repo_owner: &str, repo_name: &str) -> Self {
        Self {
            repo_owner: repo_owner.to_string(),
            repo_name: repo_name.to_string(),
            ..Self::default()
        }
    }

    /// Record the embedding used. The first recorder wins.
    pub fn record_embedding(&self, embedding: &[f32]) {
        let _ = self.embedding.set(embedding.to_vec());
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.get().map(Vec::as_slice)
    }

    pub fn take_embedding(self) -> Option<Vec<f32>> {
        self.embedding.into_inner()
    }
}
