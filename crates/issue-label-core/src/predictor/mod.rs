//! Prediction pipeline: issue identity (or raw text) in, filtered labels out.

mod payload;


use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CoreResult;
use crate::registry::ModelRegistry;
use crate::traits::IssueTextSource;
use crate::types::{PredictionContext, ProbabilityMap};

pub use payload::{PredictRequest, ISSUE_KEYS, TEXT_KEYS};

/// Result of predicting labels for a stored issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuePrediction {
    /// Registry key of the model that produced `probabilities`.
    pub model_name: String,
    pub probabilities: ProbabilityMap,
    /// Issue embedding a repo-specific member used, if any.
    pub embedding: Option<Vec<f32>>,
}

/// Drives a registry model for one request.
///
/// Holds the registry by `Arc`; it is never mutated after construction.
#[derive(Clone)]
pub struct IssueLabelPredictor {
    registry: Arc<ModelRegistry>,
    issues: Arc<dyn IssueTextSource>,
}

impl IssueLabelPredictor {
    pub fn new(registry: Arc<ModelRegistry>, issues: Arc<dyn IssueTextSource>) -> Self {
        Self { registry, issues }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Predict from raw text, bypassing the issue fetch.
    ///
    /// # Errors
    /// - `ModelNotFound` if `model_name` is not registered
    /// - any error raised by the model
    pub async fn predict_labels_for_data(
        &self,
        model_name: &str,
        org: &str,
        repo: &str,
        title: &str,
        text: &[String],
        context: &PredictionContext,
    ) -> CoreResult<ProbabilityMap> {
        let model = self.registry.get(model_name)?;
        model
            .predict_issue_labels(org, repo, title, text, context)
            .await
    }

    /// Fetch an issue and predict its labels.
    ///
    /// Without `model_name` the most specific registered model for
    /// `org/repo` is used.
    pub async fn predict_labels_for_issue(
        &self,
        org: &str,
        repo: &str,
        issue_num: u64,
        model_name: Option<&str>,
    ) -> CoreResult<IssuePrediction> {
        let model_name = match model_name {
            Some(name) => name.to_string(),
            None => self.registry.resolve_model(org, repo),
        };

        let issue = self.issues.get_issue_text(issue_num, org, repo).await?;
        if issue.title.is_empty() {
            warn!(repo_owner = %org, repo_name = %repo, issue_num, "Issue has an empty title");
        }
        if issue.body.is_empty() {
            warn!(repo_owner = %org, repo_name = %repo, issue_num, "Issue has an empty body");
        }

        info!(
            repo_owner = %org,
            repo_name = %repo,
            issue_num,
            model = %model_name,
            "Predicting labels"
        );

        let context = PredictionContext::for_issue(org, repo, issue_num);
        let probabilities = self
            .predict_labels_for_data(&model_name, org, repo, &issue.title, &[issue.body], &context)
            .await?;

        Ok(IssuePrediction {
            model_name,
            probabilities,
            embedding: context.take_embedding(),
        })
    }

    /// Generic entry point dispatching on which field set `payload` carries.
    ///
    /// # Errors
    /// - `MissingFields` naming both accepted field sets when neither is complete
    /// - `InvalidPayload` when a field has the wrong type
    pub async fn predict(
        &self,
        payload: &serde_json::Map<String, serde_json::Value>,
    ) -> CoreResult<ProbabilityMap> {
        match PredictRequest::from_payload(payload)? {
            PredictRequest::Text {
                model_name,
                org,
                repo,
                title,
                text,
            } => {
                let context = PredictionContext::for_repo(&org, &repo);
                self.predict_labels_for_data(&model_name, &org, &repo, &title, &text, &context)
                    .await
            }
            PredictRequest::Issue {
                org,
                repo,
                issue_num,
                model_name,
            } => Ok(self
                .predict_labels_for_issue(&org, &repo, issue_num, model_name.as_deref())
                .await?
                .probabilities),
        }
    }
}
