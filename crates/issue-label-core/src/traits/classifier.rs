//! Inference engine traits.
//!
//! Engines are opaque: given input they return scores. The decision core
//! never looks inside them.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::ProbabilityMap;

/// Maps feature vectors to one probability per label index.
///
/// Implementations must be safe for concurrent use through `&self`; an
/// engine that is not has to serialize access internally.
pub trait ProbabilityClassifier: Send + Sync {
    /// Predict probabilities for a batch of rows.
    ///
    /// Returns one row per input row, each of length `label_count()`.
    fn predict_proba(&self, features: &[Vec<f32>]) -> CoreResult<Vec<Vec<f32>>>;

    /// Number of label columns produced per row.
    fn label_count(&self) -> usize;
}

/// A classifier that can be fit on labeled data before calibration.
pub trait TrainableClassifier: ProbabilityClassifier {
    fn fit(&mut self, features: &[Vec<f32>], labels: &[Vec<bool>]) -> CoreResult<()>;
}

/// Classifies raw issue text into label scores.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn classify(&self, title: &str, body: &str) -> CoreResult<ProbabilityMap>;
}
