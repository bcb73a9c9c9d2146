//! Error types for issue-label-core.

use thiserror::Error;

/// Top-level error type for issue-label-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No model named {key}")]
    ModelNotFound { key: String },

    #[error("Model {key} has no loaded artifacts; refresh it before predicting")]
    ModelNotLoaded { key: String },

    #[error("Data is missing required keys; got {got}; want {want}")]
    MissingFields { got: String, want: String },

    #[error("Model {model} failed inside combined model: {source}")]
    EnsembleMemberFailure {
        model: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Label columns mismatch: {labels} labels but {thresholds} threshold entries")]
    LabelColumnsMismatch { labels: usize, thresholds: usize },

    #[error("Invalid probability for {label}: {value}")]
    InvalidProbability { label: String, value: f32 },

    #[error("Calibration error: {0}")]
    Calibration(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("{service} request failed: {message}")]
    Collaborator { service: String, message: String },

    #[error("Invalid issue event: {field} - {message}")]
    InvalidEvent { field: String, message: String },

    #[error("Invalid prediction request: {field} - {message}")]
    InvalidPayload { field: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Stable variant name, logged as the error type at the message boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::ModelNotFound { .. } => "ModelNotFound",
            CoreError::ModelNotLoaded { .. } => "ModelNotLoaded",
            CoreError::MissingFields { .. } => "MissingFields",
            CoreError::EnsembleMemberFailure { .. } => "EnsembleMemberFailure",
            CoreError::LabelColumnsMismatch { .. } => "LabelColumnsMismatch",
            CoreError::InvalidProbability { .. } => "InvalidProbability",
            CoreError::Calibration(_) => "Calibration",
            CoreError::Classifier(_) => "Classifier",
            CoreError::Collaborator { .. } => "Collaborator",
            CoreError::InvalidEvent { .. } => "InvalidEvent",
            CoreError::InvalidPayload { .. } => "InvalidPayload",
            CoreError::ConfigError(_) => "ConfigError",
            CoreError::SerializationError(_) => "SerializationError",
            CoreError::Io(_) => "Io",
        }
    }

    /// Shorthand for a failed call to an external service.
    pub fn collaborator(service: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Collaborator {
            service: service.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::ConfigError(err.to_string())
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::ModelNotFound {
            key: "kubeflow_combined".to_string(),
        };
        assert!(err.to_string().contains("kubeflow_combined"));
        assert_eq!(err.kind(), "ModelNotFound");
    }

    #[test]
    fn test_ensemble_failure_keeps_member_identity() {
        let err = CoreError::EnsembleMemberFailure {
            model: "universal".to_string(),
            source: Box::new(CoreError::Classifier("boom".into())),
        };
        let msg = err.to_string();
        assert!(msg.contains("universal"));
        assert!(msg.contains("boom"));
        assert_eq!(err.kind(), "EnsembleMemberFailure");
    }

    #[test]
    fn test_label_columns_mismatch() {
        let err = CoreError::LabelColumnsMismatch {
            labels: 3,
            thresholds: 2,
        };
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains('2'));
    }
}
