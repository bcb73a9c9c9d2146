//! Message-driven consumer.
//!
//! States cycle `Idle -> Receiving -> Processing -> Acking -> Idle`. At most
//! one message is in `Processing` at any time: the loop pulls one message,
//! processes it inline and acknowledges it before pulling the next.
//!
//! # Failure policy
//!
//! The processing step returns a typed [`ProcessingOutcome`]. It runs on its
//! own task, so a panic becomes a `Panic` failure instead of unwinding
//! through the loop. A failed outcome is logged with the event identity and error kind, and the message
//! is acknowledged anyway. A permanently failing event would otherwise be
//! redelivered forever with no backoff.
//!
//! # Shutdown
//!
//! [`ShutdownHandle::shutdown`] stops further pulls. A message already in
//! `Processing` runs through `Acking` before [`MessageConsumer::run`] returns.

mod stats;


use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{error, info, warn};
use uuid::Uuid;

use issue_label_core::types::{IssueEvent, Prediction};

use crate::error::{WorkerError, WorkerResult};

pub use stats::{ConsumerStats, ConsumerStatsInternal};

/// One delivery pulled from the subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub ack_id: String,
    pub message_id: String,
    pub attributes: HashMap<String, String>,
}

/// Pull-based queue transport.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Pull at most one message. `Ok(None)` when nothing is waiting.
    async fn pull(&self) -> WorkerResult<Option<ReceivedMessage>>;

    async fn acknowledge(&self, ack_id: &str) -> WorkerResult<()>;
}

/// The Processing step for one event.
///
/// Returns the labels actually applied; an empty prediction means the
/// models were not confident enough.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process(&self, event: &IssueEvent) -> WorkerResult<Prediction>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerState {
    #[default]
    Idle,
    Receiving,
    Processing,
    Acking,
}

/// Typed result of the Processing step, inspected before acknowledging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessingOutcome {
    Labeled { labels: Vec<String> },
    NotConfident,
    Failed { kind: String, error: String },
}

impl ProcessingOutcome {
    fn from_result(result: WorkerResult<Prediction>) -> Self {
        match result {
            Ok(prediction) if prediction.is_empty() => ProcessingOutcome::NotConfident,
            Ok(prediction) => ProcessingOutcome::Labeled {
                labels: prediction.labels,
            },
            Err(e) => ProcessingOutcome::Failed {
                kind: e.kind().to_string(),
                error: e.to_string(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ProcessingOutcome::Failed { .. })
    }
}

/// Consumer settings.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Wait after an empty or failed pull.
    pub poll_interval: Duration,
    /// Upper bound on one message's processing; `None` waits indefinitely.
    pub processing_timeout: Option<Duration>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            processing_timeout: None,
        }
    }
}

/// Cloneable handle stopping a running consumer.
#[derive(Clone)]
pub struct ShutdownHandle {
    notify: Arc<Notify>,
    is_running: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Stop pulling. The in-flight message, if any, still completes.
    pub fn shutdown(&self) {
        info!("Consumer shutdown requested");
        self.is_running.store(false, Ordering::SeqCst);
        self.notify.notify_one();
    }
}

pub struct MessageConsumer {
    source: Arc<dyn MessageSource>,
    processor: Arc<dyn EventProcessor>,
    config: ConsumerConfig,
    shutdown_notify: Arc<Notify>,
    is_running: Arc<AtomicBool>,
    stats: Arc<ConsumerStatsInternal>,
}

impl MessageConsumer {
    pub fn new(
        source: Arc<dyn MessageSource>,
        processor: Arc<dyn EventProcessor>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            source,
            processor,
            config,
            shutdown_notify: Arc::new(Notify::new()),
            is_running: Arc::new(AtomicBool::new(true)),
            stats: Arc::new(ConsumerStatsInternal::default()),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            notify: self.shutdown_notify.clone(),
            is_running: self.is_running.clone(),
        }
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Pull and process messages until shut down.
    pub async fn run(&self) {
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            processing_timeout = ?self.config.processing_timeout,
            "Consumer started"
        );

        while self.is_running() {
            self.stats.set_state(ConsumerState::Receiving);

            let pulled = tokio::select! {
                biased;
                _ = self.shutdown_notify.notified() => break,
                pulled = self.source.pull() => pulled,
            };

            match pulled {
                Ok(Some(message)) => {
                    self.handle_message(message).await;
                }
                Ok(None) => {
                    self.stats.set_state(ConsumerState::Idle);
                    self.wait_for_next_poll().await;
                }
                Err(e) => {
                    warn!(error = %e, kind = e.kind(), "Pull failed");
                    self.stats.record_pull_failure();
                    self.stats.set_state(ConsumerState::Idle);
                    self.wait_for_next_poll().await;
                }
            }
        }

        self.is_running.store(false, Ordering::SeqCst);
        self.stats.set_state(ConsumerState::Idle);
        info!(stats = ?self.stats.snapshot(), "Consumer stopped");
    }

    async fn wait_for_next_poll(&self) {
        tokio::select! {
            _ = self.shutdown_notify.notified() => {
                self.is_running.store(false, Ordering::SeqCst);
            }
            _ = tokio::time::sleep(self.config.poll_interval) => {}
        }
    }

    /// Drive one message through `Processing` and `Acking`.
    ///
    /// Never fails: every error ends up in the returned outcome, and the
    /// message is acknowledged exactly once either way.
    pub async fn handle_message(&self, message: ReceivedMessage) -> ProcessingOutcome {
        let delivery_id = Uuid::new_v4();
        self.stats.record_received();
        self.stats.set_state(ConsumerState::Processing);

        let outcome = match IssueEvent::from_attributes(&message.attributes) {
            Ok(event) => self.process_event(delivery_id, &event).await,
            Err(e) => {
                let e = WorkerError::from(e);
                error!(
                    %delivery_id,
                    message_id = %message.message_id,
                    kind = e.kind(),
                    error = %e,
                    "Message has no usable issue event"
                );
                ProcessingOutcome::from_result(Err(e))
            }
        };
        self.stats.record_outcome(&outcome);

        self.stats.set_state(ConsumerState::Acking);
        match self.source.acknowledge(&message.ack_id).await {
            Ok(()) => self.stats.record_acknowledged(),
            Err(e) => {
                error!(
                    %delivery_id,
                    message_id = %message.message_id,
                    kind = e.kind(),
                    error = %e,
                    "Acknowledge failed"
                );
                self.stats.record_ack_failure();
            }
        }

        self.stats.set_state(ConsumerState::Idle);
        outcome
    }

    async fn process_event(&self, delivery_id: Uuid, event: &IssueEvent) -> ProcessingOutcome {
        info!(
            %delivery_id,
            repo_owner = %event.repo_owner,
            repo_name = %event.repo_name,
            issue_num = event.issue_num,
            "Received issue"
        );

        // Awaited inline: still one message in Processing at a time.
        let processor = self.processor.clone();
        let owned = event.clone();
        let mut task = tokio::spawn(async move { processor.process(&owned).await });

        let result = match self.config.processing_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined.unwrap_or_else(|e| Err(WorkerError::from_join(e))),
                Err(_) => {
                    task.abort();
                    Err(WorkerError::Timeout(limit))
                }
            },
            None => task.await.unwrap_or_else(|e| Err(WorkerError::from_join(e))),
        };

        let outcome = ProcessingOutcome::from_result(result);
        if let ProcessingOutcome::Failed { kind, error } = &outcome {
            error!(
                %delivery_id,
                repo_owner = %event.repo_owner,
                repo_name = %event.repo_name,
                issue_num = event.issue_num,
                kind = %kind,
                error = %error,
                "Processing issue failed"
            );
        }
        outcome
    }
}
