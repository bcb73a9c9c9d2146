//! Offline threshold calibration for a repo-specific model.
//!
//! Reads held-out rows the model has already scored and writes the `.labels`
//! artifact that [`issue_label_core::models::RepoSpecificModel`] loads next
//! to the `.model` file. Floors come from `[calibration]` in the config.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use issue_label_core::calibration::{CalibrationConfig, CalibrationReport, ThresholdCalibrator};
use issue_label_core::{CoreError, LabelName};

use crate::error::WorkerResult;

/// Input document: label names plus one scored row and one truth row per
/// held-out sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredHoldout {
    pub labels: Vec<LabelName>,
    pub predicted: Vec<Vec<f32>>,
    pub truth: Vec<Vec<bool>>,
}

/// Calibrate `input` (JSON [`ScoredHoldout`]) and write the label columns
/// YAML to `output`.
///
/// # Errors
/// - `Calibration` / `InvalidProbability` from the sweep
/// - `LabelColumnsMismatch` when `labels` does not match the row width
/// - `Io` / `SerializationError` on unreadable input or unwritable output
pub async fn calibrate_holdout(
    config: &CalibrationConfig,
    input: &Path,
    output: &Path,
) -> WorkerResult<CalibrationReport> {
    let calibrator = ThresholdCalibrator::new(config.clone())?;

    let bytes = tokio::fs::read(input).await?;
    let holdout: ScoredHoldout = serde_json::from_slice(&bytes).map_err(CoreError::from)?;

    let report = calibrator.calibrate_scored(&holdout.predicted, &holdout.truth)?;
    let columns = report.to_label_columns(holdout.labels)?;
    tokio::fs::write(output, columns.to_yaml_string()?).await?;

    info!(
        input = %input.display(),
        output = %output.display(),
        rows = holdout.predicted.len(),
        labels = report.records.len(),
        predictable = report.predictable_count(),
        precision_floor = config.precision_floor,
        recall_floor = config.recall_floor,
        "Label thresholds written"
    );
    Ok(report)
}
