//! Consumer plus LabelWorker end to end, with in-memory collaborators.
//!
//! 1. Confident predictions are intersected with the repo allow-list, applied, and commented
//! 2. No surviving label yields the low-confidence comment
//! 3. Every failure is acknowledged and leaves no side effects
//! 4. Repo-specific artifacts are refreshed before each prediction

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use issue_label_core::models::{OrgModel, RepoSpecificModel, UniversalKindLabelModel};
use issue_label_core::repo_config::DEFAULT_MODEL_BUCKET;
use issue_label_core::{IssueLabelPredictor, ModelRegistry};
use issue_label_test_utils::{
    FixedTextClassifier, InMemoryArtifactStore, InMemoryIssueSource, LabelAction,
    RecordingLabelSink, StaticEmbedder, StaticRepoSettings,
};
use issue_label_worker::consumer::ConsumerConfig;
use issue_label_worker::{
    ArtifactLocation, LabelWorker, MessageConsumer, MessageSource, ProcessingOutcome,
    ReceivedMessage, WorkerResult,
};

const APP_URL: &str = "https://label-bot-prod.mlbot.net/";
const MODEL_JSON: &str = r#"{"layers": [{"weights": [[0.0, 0.0], [0.0, 0.0]], "bias": [-5.0, 5.0]}]}"#;
const LABELS_YAML: &str = "labels: [label1, label2]\nprobability_thresholds:\n  0: 0.5\n  1: 0.5\n";

// =========================================================================
// Fixtures
// =========================================================================

#[derive(Default)]
struct QueueSource {
    pending: Mutex<VecDeque<ReceivedMessage>>,
    acks: Mutex<Vec<String>>,
}

impl QueueSource {
    fn push(&self, ack_id: &str, owner: &str, repo: &str, issue_num: u64) {
        let attributes: HashMap<String, String> = [
            ("installation_id", "10000".to_string()),
            ("repo_owner", owner.to_string()),
            ("repo_name", repo.to_string()),
            ("issue_num", issue_num.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        self.pending.lock().push_back(ReceivedMessage {
            ack_id: ack_id.to_string(),
            message_id: format!("m-{}", ack_id),
            attributes,
        });
    }

    fn acks(&self) -> Vec<String> {
        self.acks.lock().clone()
    }
}

#[async_trait]
impl MessageSource for QueueSource {
    async fn pull(&self) -> WorkerResult<Option<ReceivedMessage>> {
        Ok(self.pending.lock().pop_front())
    }

    async fn acknowledge(&self, ack_id: &str) -> WorkerResult<()> {
        self.acks.lock().push(ack_id.to_string());
        Ok(())
    }
}

struct Harness {
    source: Arc<QueueSource>,
    sink: Arc<RecordingLabelSink>,
    store: Arc<InMemoryArtifactStore>,
    consumer: Arc<MessageConsumer>,
    _models_dir: tempfile::TempDir,
}

fn harness(sink: RecordingLabelSink, embedder: StaticEmbedder) -> Harness {
    let universal = UniversalKindLabelModel::new(Arc::new(FixedTextClassifier::new(&[
        ("bug", 0.8),
        ("feature", 0.3),
        ("question", 0.55),
    ])));
    let org = OrgModel::new(
        "kubeflow",
        Arc::new(FixedTextClassifier::new(&[("area/docs", 0.7)])),
        0.5,
    );
    let repo_model = Arc::new(RepoSpecificModel::new("kubeflow", "kubeflow", Arc::new(embedder)));

    let registry = ModelRegistry::builder(Arc::new(universal))
        .with_org_model("kubeflow", Arc::new(org))
        .with_repo_model("kubeflow", "kubeflow", repo_model)
        .build()
        .unwrap();

    let issues = InMemoryIssueSource::new()
        .with_issue("kubeflow", "kubeflow", 1, "Docs link broken", "The link 404s")
        .with_issue("kubeflow", "pipelines", 2, "Crash on start", "stack trace")
        .with_issue("tensorflow", "tensorflow", 3, "Crash", "");
    let settings = StaticRepoSettings::new()
        .with_allow_list("kubeflow", "pipelines", &["bug", "feature"])
        .with_allow_list("tensorflow", "tensorflow", &["feature"]);

    let store = Arc::new(
        InMemoryArtifactStore::new()
            .with_object(DEFAULT_MODEL_BUCKET, "kubeflow/kubeflow.model", MODEL_JSON)
            .with_object(DEFAULT_MODEL_BUCKET, "kubeflow/kubeflow.labels", LABELS_YAML),
    );
    let models_dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(sink);

    let worker = LabelWorker::new(
        IssueLabelPredictor::new(Arc::new(registry), Arc::new(issues)),
        Arc::new(settings),
        sink.clone(),
        store.clone(),
        ArtifactLocation {
            bucket: DEFAULT_MODEL_BUCKET.to_string(),
            local_dir: models_dir.path().to_path_buf(),
        },
        APP_URL,
    );

    let source = Arc::new(QueueSource::default());
    let consumer = Arc::new(MessageConsumer::new(
        source.clone(),
        Arc::new(worker),
        ConsumerConfig {
            poll_interval: Duration::from_millis(5),
            processing_timeout: Some(Duration::from_secs(10)),
        },
    ));

    Harness {
        source,
        sink,
        store,
        consumer,
        _models_dir: models_dir,
    }
}

fn message(ack_id: &str, owner: &str, repo: &str, issue_num: u64) -> ReceivedMessage {
    let source = QueueSource::default();
    source.push(ack_id, owner, repo, issue_num);
    let message = source.pending.lock().pop_front().unwrap();
    message
}

// =========================================================================
// Outcomes
// =========================================================================

#[tokio::test]
async fn test_allow_listed_labels_are_applied_with_comment() {
    let h = harness(RecordingLabelSink::new(), StaticEmbedder::new(vec![1.0, 2.0]));

    let outcome = h
        .consumer
        .handle_message(message("a1", "kubeflow", "pipelines", 2))
        .await;

    // area/docs from the org model is not in the allow-list.
    assert_eq!(
        outcome,
        ProcessingOutcome::Labeled {
            labels: vec!["bug".into()]
        }
    );

    let actions = h.sink.actions();
    assert_eq!(actions.len(), 2);
    assert_eq!(
        actions[0],
        LabelAction::AddLabels {
            installation_id: "10000".into(),
            issue: "kubeflow/pipelines#2".into(),
            labels: vec!["bug".into()],
        }
    );
    let comments = h.sink.comments();
    assert!(comments[0].contains("applying the labels `bug` to this issue, with the confidence of 0.80"));
    assert!(comments[0].contains("data/kubeflow/pipelines"));
    assert_eq!(h.source.acks(), vec!["a1"]);
}

#[tokio::test]
async fn test_nothing_allowed_posts_low_confidence_comment() {
    let h = harness(RecordingLabelSink::new(), StaticEmbedder::new(vec![1.0, 2.0]));

    let outcome = h
        .consumer
        .handle_message(message("a1", "tensorflow", "tensorflow", 3))
        .await;

    assert_eq!(outcome, ProcessingOutcome::NotConfident);
    assert!(h.sink.labels_added().is_empty());
    assert_eq!(
        h.sink.comments(),
        vec![format!(
            "Issue Label Bot is not confident enough to auto-label this issue.\n\
             See [dashboard]({}data/tensorflow/tensorflow) for more details.",
            APP_URL
        )]
    );
}

#[tokio::test]
async fn test_repo_model_is_refreshed_before_predicting() {
    let h = harness(RecordingLabelSink::new(), StaticEmbedder::new(vec![1.0, 2.0]));

    for (i, ack) in ["a1", "a2"].iter().enumerate() {
        let outcome = h
            .consumer
            .handle_message(message(ack, "kubeflow", "kubeflow", 1))
            .await;
        assert_eq!(
            outcome,
            ProcessingOutcome::Labeled {
                labels: vec!["area/docs".into(), "bug".into(), "label2".into()]
            }
        );
        assert_eq!(h.store.downloads().len(), 2 * (i + 1));
    }
}

#[tokio::test]
async fn test_missing_embedding_still_labels_from_other_models() {
    let h = harness(RecordingLabelSink::new(), StaticEmbedder::unavailable());

    let outcome = h
        .consumer
        .handle_message(message("a1", "kubeflow", "kubeflow", 1))
        .await;

    assert_eq!(
        outcome,
        ProcessingOutcome::Labeled {
            labels: vec!["area/docs".into(), "bug".into()]
        }
    );
}

// =========================================================================
// Failures
// =========================================================================

#[tokio::test]
async fn test_unknown_issue_fails_without_side_effects() {
    let h = harness(RecordingLabelSink::new(), StaticEmbedder::new(vec![1.0, 2.0]));

    let outcome = h
        .consumer
        .handle_message(message("a1", "kubeflow", "pipelines", 99))
        .await;

    assert!(matches!(outcome, ProcessingOutcome::Failed { ref kind, .. } if kind == "Collaborator"));
    assert!(h.sink.actions().is_empty());
    assert_eq!(h.source.acks(), vec!["a1"]);
}

#[tokio::test]
async fn test_label_sink_failure_is_acknowledged() {
    let h = harness(RecordingLabelSink::failing(), StaticEmbedder::new(vec![1.0, 2.0]));

    let outcome = h
        .consumer
        .handle_message(message("a1", "kubeflow", "pipelines", 2))
        .await;

    assert!(outcome.is_failure());
    assert_eq!(h.sink.actions().len(), 1);
    assert_eq!(h.source.acks(), vec!["a1"]);
    assert_eq!(h.consumer.stats().failed, 1);
}

// =========================================================================
// Run loop
// =========================================================================

#[tokio::test]
async fn test_run_drains_queue_and_stops_on_shutdown() {
    let h = harness(RecordingLabelSink::new(), StaticEmbedder::new(vec![1.0, 2.0]));
    h.source.push("a1", "kubeflow", "pipelines", 2);
    h.source.push("a2", "kubeflow", "pipelines", 99);
    h.source.push("a3", "tensorflow", "tensorflow", 3);

    let shutdown = h.consumer.shutdown_handle();
    let runner = {
        let consumer = h.consumer.clone();
        tokio::spawn(async move { consumer.run().await })
    };

    for _ in 0..400 {
        if h.source.acks().len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    shutdown.shutdown();
    runner.await.unwrap();

    assert_eq!(h.source.acks(), vec!["a1", "a2", "a3"]);
    let stats = h.consumer.stats();
    assert_eq!(stats.labeled, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.not_confident, 1);
    assert_eq!(h.sink.comments().len(), 2);
}
