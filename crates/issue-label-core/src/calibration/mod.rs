//! Threshold Calibrator.
//!
//! Derives, per label, the probability cut-off above which a classifier's
//! output is trusted. A threshold is chosen only when it satisfies BOTH a
//! minimum precision and a minimum recall on held-out data; among those
//! candidates the one with the highest precision wins. Labels for which no
//! candidate qualifies are never predicted.
//!
//! # Pipeline
//!
//! ```text
//! labeled rows ──split(seed)──► fit rows ──fit──► classifier
//!                   │                                │
//!                   └────────► held-out rows ──predict_proba──► calibrate()
//!                                                                 │
//!                                                   CalibrationReport / LabelColumns
//! ```
//!
//! Labels are optimized independently; they never interact.

mod columns;
mod curve;
mod split;


use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::traits::TrainableClassifier;
use crate::types::LabelName;

pub use columns::{LabelColumns, ThresholdTable};
pub use curve::{precision_recall_curve, CurvePoint};
pub use split::{train_test_split, DataSplit};

/// Default minimum precision a threshold must reach.
pub const DEFAULT_PRECISION_FLOOR: f32 = 0.7;

/// Default minimum recall a threshold must reach.
pub const DEFAULT_RECALL_FLOOR: f32 = 0.5;

/// Default held-out share.
pub const DEFAULT_TEST_SIZE: f32 = 0.3;

/// Default split seed.
pub const DEFAULT_SPLIT_SEED: u64 = 1234;

/// Calibration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub precision_floor: f32,
    pub recall_floor: f32,
    /// Fraction of rows held out for calibration, in `(0, 1)`.
    pub test_size: f32,
    pub seed: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            precision_floor: DEFAULT_PRECISION_FLOOR,
            recall_floor: DEFAULT_RECALL_FLOOR,
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SPLIT_SEED,
        }
    }
}

impl CalibrationConfig {
    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [
            ("precision_floor", self.precision_floor),
            ("recall_floor", self.recall_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::ConfigError(format!(
                    "calibration.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(CoreError::ConfigError(format!(
                "calibration.test_size must be within (0, 1), got {}",
                self.test_size
            )));
        }

        Ok(())
    }
}

/// Outcome of calibrating one label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub label_index: usize,
    /// Precision at the chosen threshold, `0.0` when none was chosen.
    pub precision: f32,
    /// Recall at the chosen threshold, `0.0` when none was chosen.
    pub recall: f32,
    /// `None` marks the label as never predicted.
    pub threshold: Option<f32>,
}

impl CalibrationRecord {
    fn never_predict(label_index: usize) -> Self {
        Self {
            label_index,
            precision: 0.0,
            recall: 0.0,
            threshold: None,
        }
    }
}

/// Per-label calibration results, in label-index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub records: Vec<CalibrationRecord>,
}

impl CalibrationReport {
    pub fn thresholds(&self) -> ThresholdTable {
        ThresholdTable::new(self.records.iter().map(|r| r.threshold).collect())
    }

    /// Number of labels that received a threshold.
    pub fn predictable_count(&self) -> usize {
        self.records.iter().filter(|r| r.threshold.is_some()).count()
    }

    /// Bundle the thresholds with the label names they were computed for.
    pub fn to_label_columns(&self, labels: Vec<LabelName>) -> CoreResult<LabelColumns> {
        LabelColumns::new(labels, self.thresholds())
    }
}

/// Calibrate thresholds from held-out predictions.
///
/// # Arguments
/// * `predicted` - one row of probabilities per held-out sample
/// * `truth` - one row of label membership per held-out sample
/// * `precision_floor`, `recall_floor` - both must be met by a chosen threshold
///
/// # Errors
/// - `Calibration` on empty input or ragged rows
/// - `InvalidProbability` when a score is outside `[0, 1]`
pub fn calibrate(
    predicted: &[Vec<f32>],
    truth: &[Vec<bool>],
    precision_floor: f32,
    recall_floor: f32,
) -> CoreResult<CalibrationReport> {
    let label_count = validate_rows(predicted, truth)?;

    let mut records = Vec::with_capacity(label_count);
    let mut scores = Vec::with_capacity(predicted.len());
    let mut members = Vec::with_capacity(truth.len());

    for label in 0..label_count {
        scores.clear();
        members.clear();
        scores.extend(predicted.iter().map(|row| row[label]));
        members.extend(truth.iter().map(|row| row[label]));

        let curve = precision_recall_curve(&scores, &members);
        let record = select_threshold(label, &curve, precision_floor, recall_floor);

        debug!(
            label_index = label,
            curve_points = curve.len(),
            threshold = ?record.threshold,
            precision = record.precision,
            recall = record.recall,
            "Calibrated label"
        );
        records.push(record);
    }

    Ok(CalibrationReport { records })
}

/// Walk the curve from the highest threshold down and keep the qualifying
/// point with the strictly highest precision.
fn select_threshold(
    label_index: usize,
    curve: &[CurvePoint],
    precision_floor: f32,
    recall_floor: f32,
) -> CalibrationRecord {
    let mut best: Option<&CurvePoint> = None;

    for point in curve {
        if point.precision < precision_floor || point.recall < recall_floor {
            continue;
        }
        if best.map_or(true, |b| point.precision > b.precision) {
            best = Some(point);
        }
    }

    match best {
        Some(point) => CalibrationRecord {
            label_index,
            precision: point.precision,
            recall: point.recall,
            threshold: Some(point.threshold),
        },
        None => CalibrationRecord::never_predict(label_index),
    }
}

fn validate_rows(predicted: &[Vec<f32>], truth: &[Vec<bool>]) -> CoreResult<usize> {
    if predicted.is_empty() {
        return Err(CoreError::Calibration("no held-out rows".to_string()));
    }
    if predicted.len() != truth.len() {
        return Err(CoreError::Calibration(format!(
            "{} prediction rows but {} truth rows",
            predicted.len(),
            truth.len()
        )));
    }

    let label_count = predicted[0].len();
    for (i, (p, t)) in predicted.iter().zip(truth).enumerate() {
        if p.len() != label_count || t.len() != label_count {
            return Err(CoreError::Calibration(format!(
                "row {} has {} predictions and {} truth values, expected {}",
                i,
                p.len(),
                t.len(),
                label_count
            )));
        }
        if let Some((label, value)) = p
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(CoreError::InvalidProbability {
                label: label.to_string(),
                value: *value,
            });
        }
    }

    Ok(label_count)
}

/// Splits labeled data, fits a classifier and calibrates its thresholds.
#[derive(Debug, Clone, Default)]
pub struct ThresholdCalibrator {
    config: CalibrationConfig,
}

impl ThresholdCalibrator {
    pub fn new(config: CalibrationConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Calibrate rows that were already scored on held-out data, using the
    /// configured floors. No split or fit happens here.
    pub fn calibrate_scored(
        &self,
        predicted: &[Vec<f32>],
        truth: &[Vec<bool>],
    ) -> CoreResult<CalibrationReport> {
        calibrate(
            predicted,
            truth,
            self.config.precision_floor,
            self.config.recall_floor,
        )
    }

    /// Fit `classifier` on the fit partition and calibrate on the held-out one.
    ///
    /// The split is deterministic for a given seed, so two runs over the
    /// same data produce the same table.
    pub fn find_probability_thresholds<C>(
        &self,
        classifier: &mut C,
        features: &[Vec<f32>],
        labels: &[Vec<bool>],
    ) -> CoreResult<CalibrationReport>
    where
        C: TrainableClassifier + ?Sized,
    {
        if features.len() != labels.len() {
            return Err(CoreError::Calibration(format!(
                "{} feature rows but {} label rows",
                features.len(),
                labels.len()
            )));
        }

        let split = train_test_split(features.len(), self.config.test_size, self.config.seed)?;
        let (train_x, train_y) = split.train_rows(features, labels);
        let (test_x, test_y) = split.test_rows(features, labels);

        classifier.fit(&train_x, &train_y)?;
        let predicted = classifier.predict_proba(&test_x)?;

        let report = calibrate(
            &predicted,
            &test_y,
            self.config.precision_floor,
            self.config.recall_floor,
        )?;

        info!(
            train_rows = train_x.len(),
            test_rows = test_x.len(),
            labels = report.records.len(),
            predictable = report.predictable_count(),
            "Probability thresholds calibrated"
        );

        Ok(report)
    }
}
