//! The Model capability.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{PredictionContext, ProbabilityMap};

/// Predicts label probabilities for an issue.
///
/// Implementations apply their own confidence policy: the returned map only
/// holds labels the model is willing to stand behind.
#[async_trait]
pub trait IssueLabelModel: Send + Sync {
    /// Identity used in logs and in ensemble failure reports.
    fn name(&self) -> &str;

    /// Predict labels.
    ///
    /// # Arguments
    /// * `org`, `repo` - owner of the issue; models may ignore them
    /// * `title` - issue title
    /// * `text` - body and comment texts
    /// * `context` - observability bundle
    async fn predict_issue_labels(
        &self,
        org: &str,
        repo: &str,
        title: &str,
        text: &[String],
        context: &PredictionContext,
    ) -> CoreResult<ProbabilityMap>;
}
