//! End-to-end tests of the decision core with in-memory collaborators.
//!
//! 1. Calibration on reproducible data, exported as a label-columns artifact
//! 2. Registry built from all model variants, repo model loaded from storage
//! 3. Most specific combined model drives the prediction
//! 4. An unavailable embedding removes only the repo model's signal

use std::sync::Arc;

use issue_label_core::calibration::{calibrate, LabelColumns, ThresholdCalibrator};
use issue_label_core::models::{OrgModel, RepoSpecificModel, UniversalKindLabelModel};
use issue_label_core::repo_config::{RepoArtifactPaths, DEFAULT_MODEL_BUCKET};
use issue_label_core::{IssueLabelPredictor, ModelRegistry};
use issue_label_test_utils::{
    separable_dataset, synthetic_scores, FixedTextClassifier, InMemoryArtifactStore,
    InMemoryIssueSource, StaticEmbedder,
};

const MODEL_JSON: &str = r#"{"layers": [{"weights": [[0.0, 0.0], [0.0, 0.0]], "bias": [-5.0, 5.0]}]}"#;
const LABELS_YAML: &str = "labels: [label1, label2]\nprobability_thresholds:\n  0: 0.5\n  1: 0.5\n";

async fn predictor(embedder: StaticEmbedder) -> (IssueLabelPredictor, tempfile::TempDir) {
    let universal = UniversalKindLabelModel::new(Arc::new(FixedTextClassifier::new(&[
        ("bug", 0.8),
        ("feature", 0.3),
        ("question", 0.55),
    ])));
    let org = OrgModel::new(
        "kubeflow",
        Arc::new(FixedTextClassifier::new(&[("area/docs", 0.7), ("area/ui", 0.2)])),
        0.5,
    );

    let local = tempfile::tempdir().unwrap();
    let store = InMemoryArtifactStore::new()
        .with_object(DEFAULT_MODEL_BUCKET, "kubeflow/kubeflow.model", MODEL_JSON)
        .with_object(DEFAULT_MODEL_BUCKET, "kubeflow/kubeflow.labels", LABELS_YAML);
    let paths = RepoArtifactPaths::new("kubeflow", "kubeflow", DEFAULT_MODEL_BUCKET, local.path());
    let repo_model = Arc::new(RepoSpecificModel::new("kubeflow", "kubeflow", Arc::new(embedder)));
    repo_model.refresh(&store, &paths).await.unwrap();
    assert_eq!(store.downloads().len(), 2);

    let registry = ModelRegistry::builder(Arc::new(universal))
        .with_org_model("kubeflow", Arc::new(org))
        .with_repo_model("kubeflow", "kubeflow", repo_model)
        .build()
        .unwrap();

    let issues = InMemoryIssueSource::new()
        .with_issue("kubeflow", "kubeflow", 1, "Docs link broken", "The link 404s")
        .with_issue("kubeflow", "pipelines", 2, "Crash", "")
        .with_issue("tensorflow", "tensorflow", 3, "Crash", "");

    (IssueLabelPredictor::new(Arc::new(registry), Arc::new(issues)), local)
}

#[test]
fn test_calibration_floors_hold_across_seeds() {
    for seed in 100..110 {
        let (scores, truth) = synthetic_scores(150, 3, seed);
        let report = calibrate(&scores, &truth, 0.7, 0.5).unwrap();
        assert_eq!(report.records.len(), 3);

        for record in report.records.iter().filter(|r| r.threshold.is_some()) {
            assert!(record.precision >= 0.7, "seed {}: {:?}", seed, record);
            assert!(record.recall >= 0.5, "seed {}: {:?}", seed, record);
        }
    }
}

#[test]
fn test_calibration_report_becomes_label_columns_artifact() {
    let (scores, truth) = synthetic_scores(200, 2, 7);
    let report = calibrate(&scores, &truth, 0.6, 0.3).unwrap();

    let columns = report
        .to_label_columns(vec!["kind/bug".into(), "kind/feature".into()])
        .unwrap();
    let restored = LabelColumns::from_yaml_str(&columns.to_yaml_string().unwrap()).unwrap();
    assert_eq!(restored, columns);
    assert_eq!(restored.thresholds(), &report.thresholds());
}

#[test]
fn test_calibrator_default_split_is_seventy_thirty() {
    struct Identity {
        fitted: usize,
    }
    impl issue_label_core::traits::ProbabilityClassifier for Identity {
        fn predict_proba(
            &self,
            features: &[Vec<f32>],
        ) -> issue_label_core::CoreResult<Vec<Vec<f32>>> {
            Ok(features.to_vec())
        }
        fn label_count(&self) -> usize {
            1
        }
    }
    impl issue_label_core::traits::TrainableClassifier for Identity {
        fn fit(&mut self, features: &[Vec<f32>], _labels: &[Vec<bool>]) -> issue_label_core::CoreResult<()> {
            self.fitted = features.len();
            Ok(())
        }
    }

    let (features, labels) = separable_dataset(100, 20);
    let mut clf = Identity { fitted: 0 };
    let report = ThresholdCalibrator::default()
        .find_probability_thresholds(&mut clf, &features, &labels)
        .unwrap();

    assert_eq!(clf.fitted, 70);
    assert_eq!(report.records[0].precision, 1.0);
}

#[tokio::test]
async fn test_repo_issue_uses_repo_combined_model() {
    let (predictor, _dir) = predictor(StaticEmbedder::new(vec![1.0, 2.0])).await;

    let prediction = predictor
        .predict_labels_for_issue("kubeflow", "kubeflow", 1, None)
        .await
        .unwrap();

    assert_eq!(prediction.model_name, "kubeflow/kubeflow_combined");
    assert_eq!(
        prediction.probabilities.keys().collect::<Vec<_>>(),
        vec!["area/docs", "bug", "label2"]
    );
    assert!(prediction.probabilities["label2"] > 0.99);
    assert_eq!(prediction.embedding, Some(vec![1.0, 2.0]));
}

#[tokio::test]
async fn test_unavailable_embedding_drops_only_repo_labels() {
    let (predictor, _dir) = predictor(StaticEmbedder::unavailable()).await;

    let prediction = predictor
        .predict_labels_for_issue("kubeflow", "kubeflow", 1, None)
        .await
        .unwrap();

    assert_eq!(
        prediction.probabilities.keys().collect::<Vec<_>>(),
        vec!["area/docs", "bug"]
    );
    assert!(prediction.embedding.is_none());
}

#[tokio::test]
async fn test_org_and_universal_fallbacks() {
    let (predictor, _dir) = predictor(StaticEmbedder::new(vec![1.0, 2.0])).await;

    let org = predictor
        .predict_labels_for_issue("kubeflow", "pipelines", 2, None)
        .await
        .unwrap();
    assert_eq!(org.model_name, "kubeflow_combined");
    assert!(org.embedding.is_none());

    let universal = predictor
        .predict_labels_for_issue("tensorflow", "tensorflow", 3, None)
        .await
        .unwrap();
    assert_eq!(universal.model_name, "universal");
    assert_eq!(universal.probabilities.keys().collect::<Vec<_>>(), vec!["bug"]);
}
