//! Universal kind model: one global classifier for every repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CoreResult;
use crate::registry::UNIVERSAL_MODEL_NAME;
use crate::traits::{IssueLabelModel, TextClassifier};
use crate::types::{LabelName, PredictionContext, ProbabilityMap};

use super::join_text;

/// Labels the universal model predicts.
pub const DEFAULT_CLASS_NAMES: [&str; 3] = ["bug", "feature", "question"];

/// Cut-off for every class without its own entry.
pub const DEFAULT_CLASS_THRESHOLD: f32 = 0.52;

/// Cut-off for the "question" class.
pub const QUESTION_CLASS_THRESHOLD: f32 = 0.60;

/// Static per-class cut-offs: an explicit table plus a documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassThresholds {
    pub default: f32,
    #[serde(default)]
    pub per_label: HashMap<LabelName, f32>,
}

impl Default for ClassThresholds {
    fn default() -> Self {
        let mut per_label = HashMap::new();
        per_label.insert("question".to_string(), QUESTION_CLASS_THRESHOLD);
        Self {
            default: DEFAULT_CLASS_THRESHOLD,
            per_label,
        }
    }
}

impl ClassThresholds {
    pub fn threshold_for(&self, label: &str) -> f32 {
        self.per_label.get(label).copied().unwrap_or(self.default)
    }
}

/// Predicts the kind of an issue (bug / feature / question) from raw text.
pub struct UniversalKindLabelModel {
    classifier: Arc<dyn TextClassifier>,
    class_names: Vec<LabelName>,
    thresholds: ClassThresholds,
}

impl UniversalKindLabelModel {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self::with_classes(
            classifier,
            DEFAULT_CLASS_NAMES.iter().map(|c| c.to_string()).collect(),
            ClassThresholds::default(),
        )
    }

    pub fn with_classes(
        classifier: Arc<dyn TextClassifier>,
        class_names: Vec<LabelName>,
        thresholds: ClassThresholds,
    ) -> Self {
        Self {
            classifier,
            class_names,
            thresholds,
        }
    }

    pub fn class_names(&self) -> &[LabelName] {
        &self.class_names
    }

    pub fn thresholds(&self) -> &ClassThresholds {
        &self.thresholds
    }
}

#[async_trait]
impl IssueLabelModel for UniversalKindLabelModel {
    fn name(&self) -> &str {
        UNIVERSAL_MODEL_NAME
    }

    async fn predict_issue_labels(
        &self,
        _org: &str,
        _repo: &str,
        title: &str,
        text: &[String],
        context: &PredictionContext,
    ) -> CoreResult<ProbabilityMap> {
        let raw = self.classifier.classify(title, &join_text(text)).await?;

        let results: ProbabilityMap = self
            .class_names
            .iter()
            .filter_map(|class| raw.get(class).map(|p| (class.clone(), *p)))
            .filter(|(class, p)| *p >= self.thresholds.threshold_for(class))
            .collect();

        info!(
            repo_owner = %context.repo_owner,
            repo_name = %context.repo_name,
            issue_num = ?context.issue_num,
            predictions = ?raw,
            labels = ?results.keys().collect::<Vec<_>>(),
            "Universal model predictions"
        );

        Ok(results)
    }
}
