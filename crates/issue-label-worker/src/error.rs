//! Error types for issue-label-worker.

use std::time::Duration;

use issue_label_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{operation} failed with status {status}: {body}")]
    Http {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid queue message: {0}")]
    InvalidMessage(String),

    #[error("Processing did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Processing panicked: {0}")]
    Panic(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Stable variant name, logged as the error type. Core errors report
    /// their own variant.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Core(e) => e.kind(),
            WorkerError::Http { .. } => "Http",
            WorkerError::Transport(_) => "Transport",
            WorkerError::InvalidMessage(_) => "InvalidMessage",
            WorkerError::Timeout(_) => "Timeout",
            WorkerError::Panic(_) => "Panic",
            WorkerError::Config(_) => "Config",
            WorkerError::Io(_) => "Io",
        }
    }

    /// A processing task that did not return. Panics keep their payload
    /// message when it is a string.
    pub fn from_join(err: tokio::task::JoinError) -> Self {
        if !err.is_panic() {
            return WorkerError::Panic("processing task was cancelled".to_string());
        }
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        WorkerError::Panic(message)
    }

    /// Convert for a core collaborator trait, naming the failing service.
    pub fn into_core(self, service: &str) -> CoreError {
        match self {
            WorkerError::Core(e) => e,
            WorkerError::Io(e) => CoreError::Io(e),
            other => CoreError::collaborator(service, other.to_string()),
        }
    }
}

/// Result type alias for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;
