//! Per-event processing: predict, filter against the repository allow-list,
//! then apply labels or explain why none were applied.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use issue_label_core::repo_config::RepoArtifactPaths;
use issue_label_core::traits::{ArtifactStore, LabelSink, RepoSettingsSource};
use issue_label_core::types::{IssueEvent, Prediction};
use issue_label_core::IssueLabelPredictor;

use crate::consumer::EventProcessor;
use crate::error::WorkerResult;

const APP_HOMEPAGE: &str = "https://github.com/marketplace/issue-label-bot";
const CODE_URL: &str = "https://github.com/hamelsmu/MLapp";

/// Where repo-specific model artifacts are fetched from and cached.
#[derive(Debug, Clone)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub local_dir: PathBuf,
}

impl ArtifactLocation {
    pub fn paths_for(&self, owner: &str, repo: &str) -> RepoArtifactPaths {
        RepoArtifactPaths::new(owner, repo, &self.bucket, &self.local_dir)
    }
}

/// The Processing step wired to real collaborators.
pub struct LabelWorker {
    predictor: IssueLabelPredictor,
    settings: Arc<dyn RepoSettingsSource>,
    sink: Arc<dyn LabelSink>,
    store: Arc<dyn ArtifactStore>,
    artifacts: ArtifactLocation,
    app_url: String,
}

impl LabelWorker {
    pub fn new(
        predictor: IssueLabelPredictor,
        settings: Arc<dyn RepoSettingsSource>,
        sink: Arc<dyn LabelSink>,
        store: Arc<dyn ArtifactStore>,
        artifacts: ArtifactLocation,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            predictor,
            settings,
            sink,
            store,
            artifacts,
            app_url: app_url.into(),
        }
    }

    /// Re-download the repository's model, if one is registered.
    ///
    /// A failed refresh keeps whatever bundle was loaded before; prediction
    /// then reports `ModelNotLoaded` if there never was one.
    async fn refresh_repo_model(&self, event: &IssueEvent) {
        let Some(model) = self
            .predictor
            .registry()
            .repo_model(&event.repo_owner, &event.repo_name)
        else {
            return;
        };

        let paths = self.artifacts.paths_for(&event.repo_owner, &event.repo_name);
        if let Err(e) = model.refresh(self.store.as_ref(), &paths).await {
            warn!(
                repo_owner = %event.repo_owner,
                repo_name = %event.repo_name,
                kind = e.kind(),
                error = %e,
                "Repo model refresh failed"
            );
        }
    }

    async fn apply(&self, event: &IssueEvent, applied: &Prediction) -> WorkerResult<()> {
        if applied.is_empty() {
            let body = not_confident_comment(&self.app_url, &event.repo_owner, &event.repo_name);
            self.sink
                .create_comment(
                    &event.installation_id,
                    &event.repo_owner,
                    &event.repo_name,
                    event.issue_num,
                    &body,
                )
                .await?;
            return Ok(());
        }

        self.sink
            .add_labels(
                &event.installation_id,
                &event.repo_owner,
                &event.repo_name,
                event.issue_num,
                &applied.labels,
            )
            .await?;

        let body = labeled_comment(&self.app_url, &event.repo_owner, &event.repo_name, applied);
        self.sink
            .create_comment(
                &event.installation_id,
                &event.repo_owner,
                &event.repo_name,
                event.issue_num,
                &body,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventProcessor for LabelWorker {
    async fn process(&self, event: &IssueEvent) -> WorkerResult<Prediction> {
        let settings = self
            .settings
            .repo_settings(&event.repo_owner, &event.repo_name)
            .await?
            .unwrap_or_default();

        self.refresh_repo_model(event).await;

        let issue = self
            .predictor
            .predict_labels_for_issue(&event.repo_owner, &event.repo_name, event.issue_num, None)
            .await?;

        let predicted = Prediction::from_map(&issue.probabilities);
        let applied = predicted.retain_allowed(settings.allowed_labels());

        info!(
            repo_owner = %event.repo_owner,
            repo_name = %event.repo_name,
            issue_num = event.issue_num,
            model = %issue.model_name,
            predicted = ?predicted.labels,
            labels = ?applied.labels,
            "Prediction"
        );

        self.apply(event, &applied).await?;
        Ok(applied)
    }
}

fn dashboard_url(app_url: &str, owner: &str, repo: &str) -> String {
    format!("{}data/{}/{}", app_url, owner, repo)
}

/// Comment posted after labels were applied.
pub fn labeled_comment(app_url: &str, owner: &str, repo: &str, applied: &Prediction) -> String {
    let labels = applied.labels.join("`, `");
    let confidences = applied
        .probabilities
        .iter()
        .map(|p| format!("{:.2}", p))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Issue-Label Bot is automatically applying the labels `{}` to this issue, \
         with the confidence of {}.\n\
         Please mark this comment with :thumbsup: or :thumbsdown: to give our bot feedback!\n\
         Links: [app homepage]({}), [dashboard]({}) and [code]({}) for this bot.",
        labels,
        confidences,
        APP_HOMEPAGE,
        dashboard_url(app_url, owner, repo),
        CODE_URL
    )
}

/// Comment posted when no label survived the thresholds and the allow-list.
pub fn not_confident_comment(app_url: &str, owner: &str, repo: &str) -> String {
    format!(
        "Issue Label Bot is not confident enough to auto-label this issue.\n\
         See [dashboard]({}) for more details.",
        dashboard_url(app_url, owner, repo)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = "https://label-bot-prod.mlbot.net/";

    #[test]
    fn test_labeled_comment_lists_labels_and_confidences() {
        let mut applied = Prediction::default();
        applied.push("bug", 0.912);
        applied.push("question", 0.6);

        let body = labeled_comment(APP, "kubeflow", "examples", &applied);
        assert!(body.starts_with(
            "Issue-Label Bot is automatically applying the labels `bug`, `question` to this issue, with the confidence of 0.91, 0.60.\n"
        ));
        assert!(body.contains("[dashboard](https://label-bot-prod.mlbot.net/data/kubeflow/examples)"));
        assert!(body.contains(":thumbsup:"));
    }

    #[test]
    fn test_not_confident_comment() {
        let body = not_confident_comment(APP, "kubeflow", "examples");
        assert_eq!(
            body,
            "Issue Label Bot is not confident enough to auto-label this issue.\n\
             See [dashboard](https://label-bot-prod.mlbot.net/data/kubeflow/examples) for more details."
        );
    }

    #[test]
    fn test_artifact_location() {
        let location = ArtifactLocation {
            bucket: "repo-models".into(),
            local_dir: PathBuf::from("/tmp/models"),
        };
        let paths = location.paths_for("kubeflow", "examples");
        assert_eq!(paths.bucket, "repo-models");
        assert_eq!(paths.model_object, "kubeflow/examples.model");
    }
}
