//! Ensemble combiner.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::traits::IssueLabelModel;
use crate::types::{PredictionContext, ProbabilityMap};

/// Ordered list of models whose outputs are merged into one map.
///
/// Every member sees identical inputs. When two members score the same
/// label, the later member wins: more specific models are appended after
/// the universal one. A failing member fails the whole combination.
pub struct CombinedLabelModels {
    name: String,
    models: Vec<Arc<dyn IssueLabelModel>>,
}

impl std::fmt::Debug for CombinedLabelModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedLabelModels")
            .field("name", &self.name)
            .field("models", &self.member_names())
            .finish()
    }
}

impl CombinedLabelModels {
    /// # Errors
    /// - `ConfigError` if `models` is empty
    pub fn new(name: impl Into<String>, models: Vec<Arc<dyn IssueLabelModel>>) -> CoreResult<Self> {
        let name = name.into();
        if models.is_empty() {
            return Err(CoreError::ConfigError(format!(
                "combined model {} needs at least one member",
                name
            )));
        }
        Ok(Self { name, models })
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }
}

#[async_trait]
impl IssueLabelModel for CombinedLabelModels {
    fn name(&self) -> &str {
        &self.name
    }

    async fn predict_issue_labels(
        &self,
        org: &str,
        repo: &str,
        title: &str,
        text: &[String],
        context: &PredictionContext,
    ) -> CoreResult<ProbabilityMap> {
        let mut combined = ProbabilityMap::new();

        for model in &self.models {
            let predictions = model
                .predict_issue_labels(org, repo, title, text, context)
                .await
                .map_err(|e| CoreError::EnsembleMemberFailure {
                    model: model.name().to_string(),
                    source: Box::new(e),
                })?;

            debug!(
                combined = %self.name,
                model = %model.name(),
                labels = ?predictions.keys().collect::<Vec<_>>(),
                "Member predictions"
            );
            combined.extend(predictions);
        }

        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        name: &'static str,
        scores: Vec<(&'static str, f32)>,
    }

    #[async_trait]
    impl IssueLabelModel for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn predict_issue_labels(
            &self,
            _org: &str,
            _repo: &str,
            _title: &str,
            _text: &[String],
            _context: &PredictionContext,
        ) -> CoreResult<ProbabilityMap> {
            Ok(self.scores.iter().map(|(l, p)| (l.to_string(), *p)).collect())
        }
    }

    struct Broken;

    #[async_trait]
    impl IssueLabelModel for Broken {
        fn name(&self) -> &str {
            "kubeflow/kubeflow"
        }

        async fn predict_issue_labels(
            &self,
            _org: &str,
            _repo: &str,
            _title: &str,
            _text: &[String],
            _context: &PredictionContext,
        ) -> CoreResult<ProbabilityMap> {
            Err(CoreError::ModelNotLoaded {
                key: "kubeflow/kubeflow".to_string(),
            })
        }
    }

    async fn run(combined: &CombinedLabelModels) -> CoreResult<ProbabilityMap> {
        combined
            .predict_issue_labels("o", "r", "t", &[], &PredictionContext::default())
            .await
    }

    #[tokio::test]
    async fn test_later_model_overrides_earlier() {
        let a: Arc<dyn IssueLabelModel> = Arc::new(Fixed {
            name: "a",
            scores: vec![("bug", 0.3)],
        });
        let b: Arc<dyn IssueLabelModel> = Arc::new(Fixed {
            name: "b",
            scores: vec![("bug", 0.9), ("feature", 0.4)],
        });
        let combined = CombinedLabelModels::new("o_combined", vec![a, b]).unwrap();

        let out = run(&combined).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.get("bug"), Some(&0.9));
        assert_eq!(out.get("feature"), Some(&0.4));
        assert_eq!(combined.member_names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_earlier_only_labels_are_kept() {
        let a: Arc<dyn IssueLabelModel> = Arc::new(Fixed {
            name: "a",
            scores: vec![("question", 0.7)],
        });
        let b: Arc<dyn IssueLabelModel> = Arc::new(Fixed {
            name: "b",
            scores: vec![],
        });
        let combined = CombinedLabelModels::new("c", vec![a, b]).unwrap();
        assert_eq!(run(&combined).await.unwrap().get("question"), Some(&0.7));
    }

    #[tokio::test]
    async fn test_member_failure_names_the_model() {
        let a: Arc<dyn IssueLabelModel> = Arc::new(Fixed {
            name: "a",
            scores: vec![("bug", 0.9)],
        });
        let combined = CombinedLabelModels::new("c", vec![a, Arc::new(Broken)]).unwrap();

        match run(&combined).await {
            Err(CoreError::EnsembleMemberFailure { model, source }) => {
                assert_eq!(model, "kubeflow/kubeflow");
                assert_eq!(source.kind(), "ModelNotLoaded");
            }
            other => panic!("expected EnsembleMemberFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_member_list_is_rejected() {
        assert!(CombinedLabelModels::new("c", vec![]).is_err());
    }
}
