//! Label names, probability maps and the actionable prediction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque GitHub label identifier ("bug", "feature", "question", ...).
pub type LabelName = String;

/// Label -> probability in `[0, 1]`.
///
/// Keys need not cover every known label. A `BTreeMap` keeps iteration
/// deterministic so comments and logs are stable between runs.
pub type ProbabilityMap = BTreeMap<LabelName, f32>;

/// Labels surviving threshold filtering, as parallel sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub labels: Vec<LabelName>,
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Build from a probability map, keeping the map's label order.
    pub fn from_map(map: &ProbabilityMap) -> Self {
        let mut prediction = Self::default();
        for (label, probability) in map {
            prediction.push(label.clone(), *probability);
        }
        prediction
    }

    pub fn push(&mut self, label: impl Into<LabelName>, probability: f32) {
        self.labels.push(label.into());
        self.probabilities.push(probability);
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.probabilities.iter().copied())
    }

    /// Intersect with a repository allow-list.
    ///
    /// `None` means the repository did not restrict labels and every
    /// confident prediction passes through.
    pub fn retain_allowed(&self, allowed: Option<&[LabelName]>) -> Prediction {
        let Some(allowed) = allowed else {
            return self.clone();
        };

        let mut kept = Prediction::default();
        for (label, probability) in self.iter() {
            if allowed.iter().any(|a| a == label) {
                kept.push(label, probability);
            }
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Prediction {
        let mut map = ProbabilityMap::new();
        map.insert("bug".to_string(), 0.9);
        map.insert("question".to_string(), 0.7);
        Prediction::from_map(&map)
    }

    #[test]
    fn test_from_map_keeps_parallel_sequences() {
        let prediction = sample();
        assert_eq!(prediction.labels, vec!["bug", "question"]);
        assert_eq!(prediction.probabilities, vec![0.9, 0.7]);
        assert_eq!(prediction.len(), 2);
    }

    #[test]
    fn test_retain_allowed_without_restriction_passes_all() {
        let prediction = sample();
        assert_eq!(prediction.retain_allowed(None), prediction);
    }

    #[test]
    fn test_retain_allowed_intersects() {
        let allowed = vec!["question".to_string(), "feature".to_string()];
        let kept = sample().retain_allowed(Some(&allowed));
        assert_eq!(kept.labels, vec!["question"]);
        assert_eq!(kept.probabilities, vec![0.7]);
    }

    #[test]
    fn test_retain_allowed_empty_list_drops_everything() {
        let kept = sample().retain_allowed(Some(&[]));
        assert!(kept.is_empty());
    }
}
