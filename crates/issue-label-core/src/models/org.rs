//! Organization-wide model backed by a remote text classifier.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::CoreResult;
use crate::traits::{IssueLabelModel, TextClassifier};
use crate::types::{PredictionContext, ProbabilityMap};

use super::join_text;

/// Scores below this are dropped unless configured otherwise.
pub const DEFAULT_ORG_MIN_SCORE: f32 = 0.5;

pub struct OrgModel {
    name: String,
    classifier: Arc<dyn TextClassifier>,
    min_score: f32,
}

impl OrgModel {
    /// `name` is the registry key, i.e. the organization name.
    pub fn new(name: impl Into<String>, classifier: Arc<dyn TextClassifier>, min_score: f32) -> Self {
        Self {
            name: name.into(),
            classifier,
            min_score,
        }
    }
}

#[async_trait]
impl IssueLabelModel for OrgModel {
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
        let mut scores = self.classifier.classify(title, &join_text(text)).await?;
        scores.retain(|_, p| *p >= self.min_score);

        debug!(
            model = %self.name,
            issue_num = ?context.issue_num,
            labels = ?scores.keys().collect::<Vec<_>>(),
            "Org model predictions"
        );
        Ok(scores)
    }
}
