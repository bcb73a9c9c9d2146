//! Trait seams between the decision core and everything it depends on.
//!
//! - [`IssueLabelModel`]: the polymorphic Model capability
//! - [`ProbabilityClassifier`] / [`TrainableClassifier`]: feature-vector inference engines
//! - [`TextClassifier`]: raw-text inference engines (universal and org models)
//! - Collaborators: issue text, embeddings, artifact storage, repo settings, label application

mod classifier;
mod collaborators;
mod model;

pub use classifier::{ProbabilityClassifier, TextClassifier, TrainableClassifier};
pub use collaborators::{
    ArtifactStore, IssueEmbedder, IssueText, IssueTextSource, LabelSink, RepoSettingsSource,
};
pub use model::IssueLabelModel;
