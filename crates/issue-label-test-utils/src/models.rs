//! Model and inference-engine fixtures.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use issue_label_core::error::{CoreError, CoreResult};
use issue_label_core::traits::{IssueLabelModel, ProbabilityClassifier, TextClassifier};
use issue_label_core::types::{PredictionContext, ProbabilityMap};

fn to_map(scores: &[(&str, f32)]) -> ProbabilityMap {
    scores.iter().map(|(l, p)| (l.to_string(), *p)).collect()
}

/// Returns the same map on every call and counts calls.
pub struct FixedModel {
    name: String,
    scores: ProbabilityMap,
    calls: AtomicUsize,
}

impl FixedModel {
    pub fn new(name: &str, scores: &[(&str, f32)]) -> Self {
        Self {
            name: name.to_string(),
            scores: to_map(scores),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IssueLabelModel for FixedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn predict_issue_labels(
        &self,
        _org: &str,
        _repo: &str,
        _title: &str,
        _text: &[String],
        _context: &PredictionContext,
    ) -> CoreResult<ProbabilityMap> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

/// Fails every call with a classifier error.
pub struct FailingModel {
    name: String,
}

impl FailingModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl IssueLabelModel for FailingModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn predict_issue_labels(
        &self,
        _org: &str,
        _repo: &str,
        _title: &str,
        _text: &[String],
        _context: &PredictionContext,
    ) -> CoreResult<ProbabilityMap> {
        Err(CoreError::Classifier(format!("{} is broken", self.name)))
    }
}

/// Probability engine returning one fixed row per input row.
pub struct FixedClassifier {
    row: Vec<f32>,
}

impl FixedClassifier {
    pub fn new(row: Vec<f32>) -> Self {
        Self { row }
    }
}

impl ProbabilityClassifier for FixedClassifier {
    fn predict_proba(&self, features: &[Vec<f32>]) -> CoreResult<Vec<Vec<f32>>> {
        Ok(features.iter().map(|_| self.row.clone()).collect())
    }

    fn label_count(&self) -> usize {
        self.row.len()
    }
}

/// Text engine returning a fixed score map.
pub struct FixedTextClassifier {
    scores: ProbabilityMap,
}

impl FixedTextClassifier {
    pub fn new(scores: &[(&str, f32)]) -> Self {
        Self {
            scores: to_map(scores),
        }
    }
}

#[async_trait]
impl TextClassifier for FixedTextClassifier {
    async fn classify(&self, _title: &str, _body: &str) -> CoreResult<ProbabilityMap> {
        Ok(self.scores.clone())
    }
}
