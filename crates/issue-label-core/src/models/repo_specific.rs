//! Repo-specific model: issue embedding -> MLP -> calibrated thresholds.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::calibration::LabelColumns;
use crate::error::{CoreError, CoreResult};
use crate::repo_config::RepoArtifactPaths;
use crate::traits::{ArtifactStore, IssueEmbedder, IssueLabelModel, ProbabilityClassifier};
use crate::types::{PredictionContext, ProbabilityMap};

use super::{join_text, MlpClassifier};

/// Classifier plus the label columns it was calibrated with.
///
/// Built as one value so the index-to-name mapping can never be swapped
/// independently of the classifier.
pub struct LoadedRepoModel {
    columns: LabelColumns,
    classifier: Arc<dyn ProbabilityClassifier>,
}

impl LoadedRepoModel {
    /// # Errors
    /// - `LabelColumnsMismatch` if the classifier width differs from the label count
    pub fn new(columns: LabelColumns, classifier: Arc<dyn ProbabilityClassifier>) -> CoreResult<Self> {
        if classifier.label_count() != columns.labels().len() {
            return Err(CoreError::LabelColumnsMismatch {
                labels: columns.labels().len(),
                thresholds: classifier.label_count(),
            });
        }
        Ok(Self { columns, classifier })
    }

    pub fn columns(&self) -> &LabelColumns {
        &self.columns
    }
}

pub struct RepoSpecificModel {
    name: String,
    embedder: Arc<dyn IssueEmbedder>,
    loaded: RwLock<Option<Arc<LoadedRepoModel>>>,
}

impl RepoSpecificModel {
    /// An unloaded model for `owner/repo`. Call [`refresh`](Self::refresh)
    /// or [`install`](Self::install) before predicting.
    pub fn new(owner: &str, repo: &str, embedder: Arc<dyn IssueEmbedder>) -> Self {
        Self {
            name: format!("{}/{}", owner, repo),
            embedder,
            loaded: RwLock::new(None),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.read().is_some()
    }

    /// Swap in a new classifier/label-columns bundle.
    pub fn install(&self, bundle: LoadedRepoModel) {
        *self.loaded.write() = Some(Arc::new(bundle));
    }

    /// Download both artifacts, load them, then swap them in together.
    ///
    /// On any failure the previously loaded bundle stays in place.
    pub async fn refresh(&self, store: &dyn ArtifactStore, paths: &RepoArtifactPaths) -> CoreResult<()> {
        for local in [&paths.model_local_path, &paths.labels_local_path] {
            if let Some(parent) = local.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        store
            .download(&paths.bucket, &paths.model_object, &paths.model_local_path)
            .await?;
        store
            .download(&paths.bucket, &paths.labels_object, &paths.labels_local_path)
            .await?;

        let classifier = MlpClassifier::from_json_file(&paths.model_local_path).await?;
        let labels_yaml = tokio::fs::read_to_string(&paths.labels_local_path).await?;
        let columns = LabelColumns::from_yaml_str(&labels_yaml)?;

        let bundle = LoadedRepoModel::new(columns, Arc::new(classifier))?;
        info!(
            model = %self.name,
            labels = bundle.columns.labels().len(),
            "Repo model loaded"
        );
        self.install(bundle);
        Ok(())
    }
}

#[async_trait]
impl IssueLabelModel for RepoSpecificModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn predict_issue_labels(
        &self,
        _org: &str,
        _repo: &str,
        title: &str,
        text: &[String],
        context: &PredictionContext,
    ) -> CoreResult<ProbabilityMap> {
        let bundle = self
            .loaded
            .read()
            .clone()
            .ok_or_else(|| CoreError::ModelNotLoaded {
                key: self.name.clone(),
            })?;

        let Some(embedding) = self
            .embedder
            .issue_embedding(title, &join_text(text))
            .await?
        else {
            warn!(
                model = %self.name,
                issue_num = ?context.issue_num,
                "No embedding available; repo model has no signal"
            );
            return Ok(ProbabilityMap::new());
        };
        context.record_embedding(&embedding);

        let rows = bundle.classifier.predict_proba(std::slice::from_ref(&embedding))?;
        let probabilities = rows.first().ok_or_else(|| {
            CoreError::Classifier(format!("{} returned no rows for one input", self.name))
        })?;

        bundle.columns.filter(probabilities)
    }
}
