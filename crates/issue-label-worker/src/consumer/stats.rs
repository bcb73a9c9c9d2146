//! Consumer statistics, readable while the loop runs.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{ConsumerState, ProcessingOutcome};

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerStats {
    pub state: ConsumerState,
    pub received: u64,
    pub labeled: u64,
    pub not_confident: u64,
    pub failed: u64,
    pub acknowledged: u64,
    pub ack_failures: u64,
    pub pull_failures: u64,
    pub last_processed_at: Option<DateTime<Utc>>,
}

impl ConsumerStats {
    pub fn succeeded(&self) -> u64 {
        self.labeled + self.not_confident
    }
}

#[derive(Debug, Default)]
pub struct ConsumerStatsInternal {
    state: RwLock<ConsumerState>,
    received: AtomicU64,
    labeled: AtomicU64,
    not_confident: AtomicU64,
    failed: AtomicU64,
    acknowledged: AtomicU64,
    ack_failures: AtomicU64,
    pull_failures: AtomicU64,
    last_processed_at: RwLock<Option<DateTime<Utc>>>,
}

impl ConsumerStatsInternal {
    pub(super) fn set_state(&self, state: ConsumerState) {
        *self.state.write() = state;
    }

    pub(super) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_outcome(&self, outcome: &ProcessingOutcome) {
        let counter = match outcome {
            ProcessingOutcome::Labeled { .. } => &self.labeled,
            ProcessingOutcome::NotConfident => &self.not_confident,
            ProcessingOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        *self.last_processed_at.write() = Some(Utc::now());
    }

    pub(super) fn record_acknowledged(&self) {
        self.acknowledged.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_ack_failure(&self) {
        self.ack_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_pull_failure(&self) {
        self.pull_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConsumerStats {
        ConsumerStats {
            state: *self.state.read(),
            received: self.received.load(Ordering::Relaxed),
            labeled: self.labeled.load(Ordering::Relaxed),
            not_confident: self.not_confident.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
            ack_failures: self.ack_failures.load(Ordering::Relaxed),
            pull_failures: self.pull_failures.load(Ordering::Relaxed),
            last_processed_at: *self.last_processed_at.read(),
        }
    }
}
