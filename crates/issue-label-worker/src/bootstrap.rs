//! Wiring from [`Config`] to a runnable consumer.
//!
//! The registry is built here once, before the first message is pulled, and
//! is read-only afterwards.

use std::sync::Arc;

use tracing::info;

use issue_label_core::models::{OrgModel, RepoSpecificModel, UniversalKindLabelModel};
use issue_label_core::traits::IssueEmbedder;
use issue_label_core::{Config, IssueLabelPredictor, ModelRegistry};

use crate::consumer::{ConsumerConfig, MessageConsumer};
use crate::error::WorkerResult;
use crate::http::{
    GcsArtifactStore, GithubClient, HttpIssueEmbedder, HttpTextClassifier, PubSubPullSource,
    DEFAULT_REQUEST_TIMEOUT,
};
use crate::labeler::{ArtifactLocation, LabelWorker};

/// Universal model, one model per configured org, one per configured repo.
pub fn build_registry(config: &Config, embedder: Arc<dyn IssueEmbedder>) -> WorkerResult<ModelRegistry> {
    let models = &config.models;

    let universal = HttpTextClassifier::new(
        "universal",
        &models.universal_endpoint,
        None,
        DEFAULT_REQUEST_TIMEOUT,
    )?;
    let universal = UniversalKindLabelModel::with_classes(
        Arc::new(universal),
        models.class_names.clone(),
        models.class_thresholds(),
    );

    let mut builder = ModelRegistry::builder(Arc::new(universal));
    for org in &models.org_models {
        let classifier = HttpTextClassifier::new(org.org.clone(), &org.endpoint, None, DEFAULT_REQUEST_TIMEOUT)?;
        let model = OrgModel::new(org.org.clone(), Arc::new(classifier), org.min_score);
        builder = builder.with_org_model(org.org.clone(), Arc::new(model));
    }
    for repo in &models.repo_models {
        let model = RepoSpecificModel::new(&repo.owner, &repo.repo, embedder.clone());
        builder = builder.with_repo_model(repo.owner.clone(), repo.repo.clone(), Arc::new(model));
    }

    let registry = builder.build()?;
    info!(models = ?registry.keys(), "Model registry built");
    Ok(registry)
}

/// The Processing step backed by GitHub, the embedding service and storage.
pub fn build_label_worker(config: &Config) -> WorkerResult<LabelWorker> {
    let github = Arc::new(GithubClient::new(
        &config.github.api_base,
        config.github.token.as_deref(),
    )?);
    let embedder = Arc::new(HttpIssueEmbedder::new(
        &config.embedding.endpoint,
        config.embedding.api_key.as_deref(),
        config.embedding.dimension,
        config.embedding.request_timeout(),
    )?);
    let store = Arc::new(GcsArtifactStore::new(
        &config.storage.api_base,
        config.storage.access_token.as_deref(),
    )?);

    let registry = build_registry(config, embedder)?;
    let predictor = IssueLabelPredictor::new(Arc::new(registry), github.clone());

    Ok(LabelWorker::new(
        predictor,
        github.clone(),
        github,
        store,
        ArtifactLocation {
            bucket: config.storage.model_bucket.clone(),
            local_dir: config.storage.local_dir.clone(),
        },
        config.github.app_url.clone(),
    ))
}

pub fn consumer_config(config: &Config) -> ConsumerConfig {
    ConsumerConfig {
        poll_interval: config.pubsub.poll_interval(),
        processing_timeout: config.worker.processing_timeout(),
    }
}

/// Subscription source plus label worker, ready to `run()`.
///
/// # Errors
/// - `Config` when the subscription is not configured or a header value is invalid
pub fn build_consumer(config: &Config) -> WorkerResult<MessageConsumer> {
    let source = PubSubPullSource::new(
        &config.pubsub.api_base,
        &config.pubsub.project_id,
        &config.pubsub.subscription,
        config.pubsub.access_token.as_deref(),
    )?;
    let worker = build_label_worker(config)?;

    info!(
        subscription = %source.subscription_url(),
        max_outstanding_messages = config.pubsub.max_outstanding_messages,
        "Consumer configured"
    );
    Ok(MessageConsumer::new(
        Arc::new(source),
        Arc::new(worker),
        consumer_config(config),
    ))
}
