//! Issue Label Worker
//!
//! Consumes issue events from a pull subscription, predicts labels with
//! `issue_label_core`, and applies them through the GitHub API.
//!
//! # Modules
//!
//! - [`consumer`]: the message-driven state machine (in-flight limit 1, always ack)
//! - [`labeler`]: per-event processing and the comment policy
//! - [`http`]: HTTP implementations of every collaborator
//! - [`bootstrap`]: wiring from [`issue_label_core::Config`]
//! - [`calibration`]: offline `.labels` thresholds from scored held-out rows

pub mod bootstrap;
pub mod calibration;
pub mod consumer;
pub mod error;
pub mod http;
pub mod labeler;

pub use consumer::{
    ConsumerState, ConsumerStats, EventProcessor, MessageConsumer, MessageSource,
    ProcessingOutcome, ReceivedMessage, ShutdownHandle,
};
pub use error::{WorkerError, WorkerResult};
pub use labeler::{ArtifactLocation, LabelWorker};
