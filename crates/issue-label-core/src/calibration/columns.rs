//! Threshold table and the label-columns artifact.
//!
//! The label-name sequence and the threshold table are one unit: they are
//! produced together by calibration, stored together, and loaded together.
//! There is no API to load one without the other, so index-to-name mapping
//! cannot drift between calibration and inference.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{LabelName, ProbabilityMap};

/// Per label index: a probability threshold, or `None` for "never predict".
///
/// Serialized as `{index: threshold | null}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<usize, Option<f32>>",
    into = "BTreeMap<usize, Option<f32>>"
)]
pub struct ThresholdTable {
    entries: Vec<Option<f32>>,
}

impl ThresholdTable {
    pub fn new(entries: Vec<Option<f32>>) -> Self {
        Self { entries }
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.entries.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` when label `index` has a threshold and `probability` meets it.
    pub fn passes(&self, index: usize, probability: f32) -> bool {
        self.get(index).is_some_and(|t| probability >= t)
    }
}

impl TryFrom<BTreeMap<usize, Option<f32>>> for ThresholdTable {
    type Error = String;

    fn try_from(map: BTreeMap<usize, Option<f32>>) -> Result<Self, Self::Error> {
        let mut entries = Vec::with_capacity(map.len());
        for (expected, (index, threshold)) in map.into_iter().enumerate() {
            if index != expected {
                return Err(format!(
                    "threshold indices must be contiguous from 0; missing index {}",
                    expected
                ));
            }
            if let Some(t) = threshold {
                if !(0.0..=1.0).contains(&t) {
                    return Err(format!("threshold {} for index {} is outside [0, 1]", t, index));
                }
            }
            entries.push(threshold);
        }
        Ok(Self { entries })
    }
}

impl From<ThresholdTable> for BTreeMap<usize, Option<f32>> {
    fn from(table: ThresholdTable) -> Self {
        table.entries.into_iter().enumerate().collect()
    }
}

#[derive(Deserialize)]
struct RawLabelColumns {
    labels: Vec<LabelName>,
    probability_thresholds: ThresholdTable,
}

/// Label names bundled with their calibrated thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLabelColumns")]
pub struct LabelColumns {
    labels: Vec<LabelName>,
    probability_thresholds: ThresholdTable,
}

impl TryFrom<RawLabelColumns> for LabelColumns {
    type Error = CoreError;

    fn try_from(raw: RawLabelColumns) -> Result<Self, Self::Error> {
        LabelColumns::new(raw.labels, raw.probability_thresholds)
    }
}

impl LabelColumns {
    /// # Errors
    /// - `LabelColumnsMismatch` if the table does not cover exactly the labels
    pub fn new(labels: Vec<LabelName>, probability_thresholds: ThresholdTable) -> CoreResult<Self> {
        if labels.len() != probability_thresholds.len() {
            return Err(CoreError::LabelColumnsMismatch {
                labels: labels.len(),
                thresholds: probability_thresholds.len(),
            });
        }
        Ok(Self {
            labels,
            probability_thresholds,
        })
    }

    pub fn from_yaml_str(text: &str) -> CoreResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> CoreResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn labels(&self) -> &[LabelName] {
        &self.labels
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.probability_thresholds
    }

    /// Keep the labels whose threshold is present and met.
    ///
    /// # Errors
    /// - `Classifier` if the probability vector does not have one entry per label
    pub fn filter(&self, probabilities: &[f32]) -> CoreResult<ProbabilityMap> {
        if probabilities.len() != self.labels.len() {
            return Err(CoreError::Classifier(format!(
                "classifier produced {} probabilities for {} labels",
                probabilities.len(),
                self.labels.len()
            )));
        }

        Ok(probabilities
            .iter()
            .enumerate()
            .filter(|(i, p)| self.probability_thresholds.passes(*i, **p))
            .map(|(i, p)| (self.labels[i].clone(), *p))
            .collect())
    }
}
