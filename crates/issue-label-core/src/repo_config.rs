//! Per-repository configuration: label settings and artifact locations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::types::LabelName;

/// Path of the settings file inside a repository.
pub const REPO_SETTINGS_PATH: &str = ".github/issue_label_bot.yaml";

/// Default bucket holding repo-specific model artifacts.
pub const DEFAULT_MODEL_BUCKET: &str = "repo-models";

/// Settings a repository can declare in its YAML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoLabelSettings {
    /// Allow-list of labels the bot may apply. `None` means no restriction.
    #[serde(rename = "predicted-labels", default)]
    pub predicted_labels: Option<Vec<LabelName>>,
}

impl RepoLabelSettings {
    pub fn from_yaml(text: &str) -> CoreResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn allowed_labels(&self) -> Option<&[LabelName]> {
        self.predicted_labels.as_deref()
    }
}

/// Where the artifacts of one repo-specific model live, remotely and locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoArtifactPaths {
    pub bucket: String,
    pub model_object: String,
    pub labels_object: String,
    pub model_local_path: PathBuf,
    pub labels_local_path: PathBuf,
}

impl RepoArtifactPaths {
    /// Layout `<owner>/<repo>.model` and `<owner>/<repo>.labels` in `bucket`,
    /// mirrored under `local_dir`.
    pub fn new(owner: &str, repo: &str, bucket: &str, local_dir: &Path) -> Self {
        let repo_dir = local_dir.join(owner);
        Self {
            bucket: bucket.to_string(),
            model_object: format!("{}/{}.model", owner, repo),
            labels_object: format!("{}/{}.labels", owner, repo),
            model_local_path: repo_dir.join(format!("{}.model", repo)),
            labels_local_path: repo_dir.join(format!("{}.labels", repo)),
        }
    }
}
