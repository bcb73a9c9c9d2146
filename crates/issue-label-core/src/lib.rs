//! Issue Label Core Library
//!
//! The decision layer between classifier output and the labels applied to
//! an issue.
//!
//! # Architecture
//!
//! This crate defines:
//! - Domain types (`IssueEvent`, `ProbabilityMap`, `Prediction`, `PredictionContext`)
//! - Trait seams for models, inference engines and external collaborators
//! - Threshold calibration under joint precision/recall floors
//! - Model variants (universal, org, repo-specific, combined)
//! - An immutable `ModelRegistry` with most-specific-first routing
//! - The `IssueLabelPredictor` pipeline
//! - Error types and configuration
//!
//! # Example
//!
//! ```
//! use issue_label_core::calibration::calibrate;
//!
//! let predicted = vec![vec![0.9], vec![0.8], vec![0.2]];
//! let truth = vec![vec![true], vec![true], vec![false]];
//!
//! let report = calibrate(&predicted, &truth, 0.7, 0.5).unwrap();
//! assert_eq!(report.records[0].threshold, Some(0.9));
//! ```

pub mod calibration;
pub mod config;
pub mod error;
pub mod models;
pub mod predictor;
pub mod registry;
pub mod repo_config;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use predictor::{IssueLabelPredictor, IssuePrediction};
pub use registry::ModelRegistry;
pub use types::{IssueEvent, LabelName, Prediction, PredictionContext, ProbabilityMap};
