//! Domain types shared by the calibrator, the models and the consumer.

mod context;
mod event;
mod labels;

pub use context::PredictionContext;
pub use event::{IssueEvent, ATTR_INSTALLATION_ID, ATTR_ISSUE_NUM, ATTR_REPO_NAME, ATTR_REPO_OWNER};
pub use labels::{LabelName, Prediction, ProbabilityMap};
