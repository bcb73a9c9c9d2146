//! Deterministic fixtures for the issue-label test suites.
//!
//! Every fixture implements a real trait from `issue_label_core::traits`
//! and records what it was asked to do, so tests assert on behavior rather
//! than on call mocks.

mod collaborators;
mod data;
mod models;

pub use collaborators::{
    InMemoryArtifactStore, InMemoryIssueSource, LabelAction, RecordingLabelSink, StaticEmbedder,
    StaticRepoSettings,
};
pub use data::{separable_dataset, synthetic_scores};
pub use models::{FailingModel, FixedClassifier, FixedModel, FixedTextClassifier};
